use std::ffi::CString;
use std::sync::Arc;

use ash::vk;

use crate::version::SemanticVersion;

use self::instance::InstanceError;
use self::queue::{Queue, QueueSelection};

pub mod instance;
pub trait InstanceFactory<I> {
    fn create_instance(&self) -> Result<I, InstanceError>;
}
pub trait InstanceStore {
    fn instance(&self) -> &ash::Instance;
    fn entry(&self) -> &ash::Entry;
    fn version(&self) -> SemanticVersion;
}
pub struct Instance {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<(ash::extensions::ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
    api_version: SemanticVersion,
}

pub mod physical;
/// A physical device that passed selection, along with everything the logical
/// device needs from it: features to enable, extensions to enable and the
/// queues to create.
#[derive(Clone)]
pub struct PhysicalDevice {
    pub handle: vk::PhysicalDevice,
    pub features: vk::PhysicalDeviceFeatures,
    pub properties: vk::PhysicalDeviceProperties,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub queues_to_create: Vec<QueueSelection>,
    pub extensions_to_enable: Vec<CString>,
}

pub mod device;
pub trait DeviceStore {
    fn device(&self) -> &ash::Device;
    fn physical_device(&self) -> &PhysicalDevice;
    fn get_queue(&self, target_flags: vk::QueueFlags) -> Option<&Queue>;
    fn graphics_queue(&self) -> Option<&Queue>;
    fn compute_queue(&self) -> Option<&Queue>;
    fn transfer_queue(&self) -> Option<&Queue>;
    fn present_queue(&self) -> Option<&Queue>;
}
pub struct Device<I: InstanceStore> {
    instance: Arc<I>,
    physical_device: PhysicalDevice,
    device: ash::Device,
    queues: Vec<Queue>,
}

pub mod queue;
