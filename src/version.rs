use std::fmt;

use ash::vk;

/// A major.minor.patch version triple, ordered field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemanticVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Packs the version into the single u32 format used by the vulkan API.
    pub fn to_vulkan(self) -> u32 {
        vk::make_api_version(0, self.major, self.minor, self.patch)
    }

    pub fn from_vulkan(version: u32) -> Self {
        Self {
            major: vk::api_version_major(version),
            minor: vk::api_version_minor(version),
            patch: vk::api_version_patch(version),
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::SemanticVersion;

    #[test]
    fn vulkan_round_trip() {
        let version = SemanticVersion::new(1, 3, 216);
        assert_eq!(SemanticVersion::from_vulkan(version.to_vulkan()), version);
    }

    #[test]
    fn ordering_checks_fields_in_turn() {
        assert!(SemanticVersion::new(1, 0, 0) < SemanticVersion::new(2, 0, 0));
        assert!(SemanticVersion::new(1, 2, 0) < SemanticVersion::new(1, 10, 0));
        assert!(SemanticVersion::new(1, 2, 3) > SemanticVersion::new(1, 2, 2));
        assert_eq!(SemanticVersion::new(1, 2, 3), SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn display() {
        assert_eq!(SemanticVersion::new(1, 3, 0).to_string(), "1.3.0");
    }
}
