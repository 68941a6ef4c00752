use ash::vk;

/// A queue retrieved from a logical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queue {
    pub handle: vk::Queue,
    pub flags: vk::QueueFlags,
    pub family_index: u32,
    pub queue_index: u32,
}

/// A queue chosen during physical device selection, to be created alongside
/// the logical device. `flags` holds the role the queue was picked for, not
/// the full capability set of its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSelection {
    pub flags: vk::QueueFlags,
    pub family: u32,
    pub index: u32,
}

/// Capability summary of one queue family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyInfo {
    pub flags: vk::QueueFlags,
    pub family: u32,
    pub count: u32,
}

impl QueueFamilyInfo {
    pub fn supports(&self, flags: vk::QueueFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn supports_graphics(&self) -> bool {
        self.supports(vk::QueueFlags::GRAPHICS)
    }

    pub fn supports_transfer(&self) -> bool {
        self.supports(vk::QueueFlags::TRANSFER)
    }

    pub fn supports_compute(&self) -> bool {
        self.supports(vk::QueueFlags::COMPUTE)
    }

    pub fn supports_all_ops(&self) -> bool {
        self.supports_graphics() && self.supports_compute() && self.supports_transfer()
    }

    fn dedicated_to(&self, flags: vk::QueueFlags, negators: vk::QueueFlags) -> bool {
        self.supports(flags) && self.flags & negators == vk::QueueFlags::empty()
    }

    pub fn dedicated_to_graphics(&self) -> bool {
        self.dedicated_to(
            vk::QueueFlags::GRAPHICS,
            vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        )
    }

    pub fn dedicated_to_transfer(&self) -> bool {
        self.dedicated_to(
            vk::QueueFlags::TRANSFER,
            vk::QueueFlags::COMPUTE | vk::QueueFlags::GRAPHICS,
        )
    }

    pub fn dedicated_to_compute(&self) -> bool {
        self.dedicated_to(
            vk::QueueFlags::COMPUTE,
            vk::QueueFlags::TRANSFER | vk::QueueFlags::GRAPHICS,
        )
    }
}

/// Flattens the queue family properties reported by a physical device into
/// [`QueueFamilyInfo`] records, keeping the family indices.
pub fn to_family_infos(properties: &[vk::QueueFamilyProperties]) -> Vec<QueueFamilyInfo> {
    properties
        .iter()
        .enumerate()
        .map(|(family, props)| QueueFamilyInfo {
            flags: props.queue_flags,
            family: family as u32,
            count: props.queue_count,
        })
        .collect()
}
