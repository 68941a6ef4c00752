use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use ash::extensions::ext::DebugUtils;
use ash::vk;
use log::{debug, error, info, warn};
use raw_window_handle::RawDisplayHandle;
use thiserror::Error;

use crate::version::SemanticVersion;
use crate::LIBRARY_VERSION;

use super::{Instance, InstanceFactory, InstanceStore};

const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("no windowing extension is available on this instance")]
    WindowSupportNotFound,
    #[error("requested layer \"{0}\" is not supported")]
    LayerSupportNotFound(String),
    #[error("requested extension \"{0}\" is not supported")]
    ExtensionSupportNotFound(String),
    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}

pub struct Settings {
    pub app_name: CString,
    pub app_version: SemanticVersion,
    pub engine_name: CString,
    pub engine_version: SemanticVersion,
    /// Skips the windowing extension check for compute-only use.
    pub is_headless: bool,
    pub use_debug: bool,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

impl Settings {
    pub fn new(app_name: &str, app_version: SemanticVersion) -> Settings {
        Settings {
            app_name: CString::new(app_name).unwrap_or_default(),
            app_version,
            engine_name: CString::new("strix").unwrap(),
            engine_version: LIBRARY_VERSION,
            is_headless: false,
            use_debug: cfg!(debug_assertions),
            extensions: vec![],
            layers: vec![],
        }
    }

    pub fn add_extension(&mut self, name: &CStr) {
        self.extensions.push(name.to_owned());
    }

    pub fn add_layer(&mut self, name: &CStr) {
        self.layers.push(name.to_owned());
    }

    /// Adds every extension the platform needs to create surfaces for the
    /// given display.
    pub fn use_window_extensions(&mut self, display: RawDisplayHandle) -> Result<(), InstanceError> {
        let names = ash_window::enumerate_required_extensions(display)?;
        for &name in names {
            self.extensions.push(unsafe { CStr::from_ptr(name) }.to_owned());
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new("app", SemanticVersion::default())
    }
}

impl InstanceFactory<Arc<Instance>> for Settings {
    fn create_instance(&self) -> Result<Arc<Instance>, InstanceError> {
        let entry = ash::Entry::linked();

        let api_version = match entry.try_enumerate_instance_version()? {
            Some(version) => version,
            None => vk::API_VERSION_1_0,
        };

        let layer_properties = entry.enumerate_instance_layer_properties()?;
        let extension_properties = entry.enumerate_instance_extension_properties(None)?;

        if !self.is_headless && !has_windowing_extensions(&extension_properties) {
            return Err(InstanceError::WindowSupportNotFound);
        }

        let mut layer_names = self.layers.clone();
        if cfg!(debug_assertions) {
            if is_layer_available(&layer_properties, VALIDATION_LAYER) {
                layer_names.push(CString::new(VALIDATION_LAYER).unwrap());
                info!("validation layers requested");
            } else {
                warn!("khronos validation layers not found");
            }
        }

        let mut extension_names = self.extensions.clone();
        if self.use_debug {
            extension_names.push(DebugUtils::name().to_owned());
            debug!("debug messenger requested");
        }

        check_for_unsupported_extensions(&extension_names, &extension_properties)?;
        check_for_unsupported_layers(&layer_names, &layer_properties)?;

        debug!("enabled extensions: {:?}", extension_names);
        debug!("enabled layers: {:?}", layer_names);

        let app_info = vk::ApplicationInfo::builder()
            .api_version(api_version)
            .application_name(&self.app_name)
            .application_version(self.app_version.to_vulkan())
            .engine_name(&self.engine_name)
            .engine_version(self.engine_version.to_vulkan());

        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|n| n.as_ptr()).collect();

        let info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&info, None) }?;
        info!("created instance {:?}", instance.handle());

        let debug_utils = if self.use_debug {
            Some(create_debug_utils(&entry, &instance)?)
        } else {
            None
        };

        Ok(Arc::new(Instance {
            entry,
            instance,
            debug_utils,
            api_version: SemanticVersion::from_vulkan(api_version),
        }))
    }
}

impl InstanceStore for Instance {
    fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    fn version(&self) -> SemanticVersion {
        self.api_version
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        debug!("destroyed instance {:?}", self.instance.handle());
        unsafe {
            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn create_debug_utils(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(DebugUtils, vk::DebugUtilsMessengerEXT), InstanceError> {
    let info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let loader = DebugUtils::new(entry, instance);
    let messenger = unsafe { loader.create_debug_utils_messenger(&info, None) }?;

    Ok((loader, messenger))
}

/// Routes validation layer output into the logger.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    let message = if p_callback_data.is_null() {
        String::new()
    } else {
        CStr::from_ptr((*p_callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };

    let label = if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "VALIDATION"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "PERFORMANCE"
    } else {
        "GENERAL"
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("{} - {}", label, message);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("{} - {}", label, message);
    } else {
        debug!("{} - {}", label, message);
    }

    vk::FALSE
}

pub(crate) fn chars_to_string(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn is_layer_available(layers: &[vk::LayerProperties], name: &str) -> bool {
    layers
        .iter()
        .any(|layer| chars_to_string(&layer.layer_name) == name)
}

pub fn is_extension_available(extensions: &[vk::ExtensionProperties], name: &str) -> bool {
    extensions
        .iter()
        .any(|ext| chars_to_string(&ext.extension_name) == name)
}

#[cfg(target_os = "linux")]
pub fn has_windowing_extensions(extensions: &[vk::ExtensionProperties]) -> bool {
    is_extension_available(extensions, "VK_KHR_xcb_surface")
        || is_extension_available(extensions, "VK_KHR_xlib_surface")
        || is_extension_available(extensions, "VK_KHR_wayland_surface")
}

#[cfg(target_os = "windows")]
pub fn has_windowing_extensions(extensions: &[vk::ExtensionProperties]) -> bool {
    is_extension_available(extensions, "VK_KHR_win32_surface")
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub fn has_windowing_extensions(_extensions: &[vk::ExtensionProperties]) -> bool {
    false
}

fn check_for_unsupported_extensions(
    names: &[CString],
    extensions: &[vk::ExtensionProperties],
) -> Result<(), InstanceError> {
    for name in names {
        let name = name.to_string_lossy();
        if !is_extension_available(extensions, &name) {
            return Err(InstanceError::ExtensionSupportNotFound(name.into_owned()));
        }
    }
    Ok(())
}

fn check_for_unsupported_layers(
    names: &[CString],
    layers: &[vk::LayerProperties],
) -> Result<(), InstanceError> {
    for name in names {
        let name = name.to_string_lossy();
        if !is_layer_available(layers, &name) {
            return Err(InstanceError::LayerSupportNotFound(name.into_owned()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &str) -> vk::LayerProperties {
        let mut props = vk::LayerProperties::default();
        for (dst, src) in props.layer_name.iter_mut().zip(name.bytes()) {
            *dst = src as c_char;
        }
        props
    }

    fn extension(name: &str) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (dst, src) in props.extension_name.iter_mut().zip(name.bytes()) {
            *dst = src as c_char;
        }
        props
    }

    #[test]
    fn layer_lookup_scans_the_whole_list() {
        let layers = [layer("VK_LAYER_MESA_overlay"), layer(VALIDATION_LAYER)];
        assert!(is_layer_available(&layers, VALIDATION_LAYER));
        assert!(!is_layer_available(&layers, "VK_LAYER_missing"));
    }

    #[test]
    fn extension_lookup_rejects_prefix_matches() {
        let extensions = [extension("VK_KHR_surface_extra")];
        assert!(!is_extension_available(&extensions, "VK_KHR_surface"));
        assert!(is_extension_available(&extensions, "VK_KHR_surface_extra"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn windowing_check_accepts_any_linux_surface_extension() {
        assert!(has_windowing_extensions(&[extension(
            "VK_KHR_wayland_surface"
        )]));
        assert!(has_windowing_extensions(&[extension("VK_KHR_xcb_surface")]));
        assert!(!has_windowing_extensions(&[extension("VK_KHR_surface")]));
    }

    #[test]
    fn unsupported_extension_is_reported_by_name() {
        let err = check_for_unsupported_extensions(
            &[CString::new("VK_EXT_not_real").unwrap()],
            &[extension("VK_KHR_surface")],
        )
        .unwrap_err();

        match err {
            InstanceError::ExtensionSupportNotFound(name) => {
                assert_eq!(name, "VK_EXT_not_real");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
