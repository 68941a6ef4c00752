use std::cmp::Reverse;
use std::ffi::CString;

use ash::vk;
use log::{debug, info};
use thiserror::Error;

use crate::version::SemanticVersion;

use super::instance::{chars_to_string, is_extension_available};
use super::queue::{to_family_infos, QueueFamilyInfo, QueueSelection};
use super::{InstanceStore, PhysicalDevice};

const SUPPORTED_EXTENSION_VALUE: i32 = 1;
const PREFERRED_API_VERSION_VALUE: i32 = 500;
const MINIMUM_API_VERSION_VALUE: i32 = 250;
const PREFERRED_DEVICE_TYPE_VALUE: i32 = 1000;
const DISCRETE_DEVICE_TYPE_VALUE: i32 = 500;
const INTEGRATED_DEVICE_TYPE_VALUE: i32 = 400;
const VIRTUAL_DEVICE_TYPE_VALUE: i32 = 300;
const CPU_DEVICE_TYPE_VALUE: i32 = 200;
const OTHER_DEVICE_TYPE_VALUE: i32 = 100;
const COMPUTE_QUEUE_SUPPORT_VALUE: i32 = 10;
const TRANSFER_QUEUE_SUPPORT_VALUE: i32 = 10;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no suitable physical device found")]
    NoSuitableDeviceFound,
    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalDeviceType {
    Other,
    Integrated,
    Discrete,
    VirtualGpu,
    Cpu,
}

impl From<vk::PhysicalDeviceType> for PhysicalDeviceType {
    fn from(ty: vk::PhysicalDeviceType) -> Self {
        match ty {
            vk::PhysicalDeviceType::DISCRETE_GPU => PhysicalDeviceType::Discrete,
            vk::PhysicalDeviceType::INTEGRATED_GPU => PhysicalDeviceType::Integrated,
            vk::PhysicalDeviceType::VIRTUAL_GPU => PhysicalDeviceType::VirtualGpu,
            vk::PhysicalDeviceType::CPU => PhysicalDeviceType::Cpu,
            _ => PhysicalDeviceType::Other,
        }
    }
}

/// Requirements and preferences used to score candidate physical devices.
#[derive(Debug, Clone)]
pub struct SelectInfo {
    pub preferred_type: PhysicalDeviceType,
    /// When false, devices that are not of `preferred_type` are rejected
    /// outright instead of scored lower.
    pub allow_any_device_type: bool,
    pub require_transfer_queue: bool,
    pub require_compute_queue: bool,
    pub minimum_version: SemanticVersion,
    pub desired_version: SemanticVersion,
    pub required_extensions: Vec<CString>,
    pub desired_extensions: Vec<CString>,
}

impl Default for SelectInfo {
    fn default() -> Self {
        SelectInfo {
            preferred_type: PhysicalDeviceType::Discrete,
            allow_any_device_type: true,
            require_transfer_queue: false,
            require_compute_queue: false,
            minimum_version: SemanticVersion::new(1, 0, 0),
            desired_version: SemanticVersion::new(1, 0, 0),
            required_extensions: vec![],
            desired_extensions: vec![],
        }
    }
}

/// Rates every physical device exposed by the instance and returns the best
/// one, ready to back a logical device.
pub fn find_most_suitable_gpu<I: InstanceStore>(
    provider: &I,
    info: &SelectInfo,
) -> Result<PhysicalDevice, SelectionError> {
    let handles = unsafe { provider.instance().enumerate_physical_devices() }?;

    let mut rated: Vec<(PhysicalDevice, i32)> = handles
        .into_iter()
        .map(|handle| rate_physical_device(provider.instance(), handle, info))
        .collect::<Result<_, _>>()?;
    rated.sort_by_key(|(_, rating)| Reverse(*rating));

    for (device, rating) in &rated {
        debug!("physical device \"{}\" rated {}", device.name(), rating);
    }

    match rated.into_iter().next() {
        Some((device, rating)) if rating >= 0 => {
            info!(
                "selected physical device \"{}\" with rating {}",
                device.name(),
                rating
            );
            Ok(device)
        }
        _ => Err(SelectionError::NoSuitableDeviceFound),
    }
}

/// Gives a score to a physical device based on its properties. A device that
/// fails a hard requirement gets a rating of -1.
pub fn rate_physical_device(
    instance: &ash::Instance,
    handle: vk::PhysicalDevice,
    info: &SelectInfo,
) -> Result<(PhysicalDevice, i32), SelectionError> {
    let (features, properties, memory_properties, queue_properties, extensions);
    unsafe {
        features = instance.get_physical_device_features(handle);
        properties = instance.get_physical_device_properties(handle);
        memory_properties = instance.get_physical_device_memory_properties(handle);
        queue_properties = instance.get_physical_device_queue_family_properties(handle);
        extensions = instance.enumerate_device_extension_properties(handle)?;
    }

    let (extensions_to_enable, extension_rating) = rate_extension_support(
        &extensions,
        &info.required_extensions,
        &info.desired_extensions,
    );
    let properties_rating = rate_properties_support(&properties, info);
    let (queues_to_create, queue_rating) = rate_queue_support(
        &queue_properties,
        info.require_transfer_queue,
        info.require_compute_queue,
    );

    let rating = tally_ratings(&[extension_rating, properties_rating, queue_rating]);

    Ok((
        PhysicalDevice {
            handle,
            features,
            properties,
            memory_properties,
            queues_to_create,
            extensions_to_enable,
        },
        rating,
    ))
}

/// Sums the partial ratings. A single negative part disqualifies the device.
pub fn tally_ratings(parts: &[i32]) -> i32 {
    if parts.iter().any(|&part| part < 0) {
        -1
    } else {
        parts.iter().sum()
    }
}

pub fn rate_properties_support(properties: &vk::PhysicalDeviceProperties, info: &SelectInfo) -> i32 {
    tally_ratings(&[
        rate_api_version(
            SemanticVersion::from_vulkan(properties.api_version),
            info.minimum_version,
            info.desired_version,
        ),
        rate_device_type(
            properties.device_type.into(),
            info.preferred_type,
            info.allow_any_device_type,
        ),
    ])
}

fn rate_api_version(
    device_version: SemanticVersion,
    minimum_version: SemanticVersion,
    desired_version: SemanticVersion,
) -> i32 {
    if minimum_version > device_version {
        -1
    } else if desired_version >= device_version {
        PREFERRED_API_VERSION_VALUE
    } else {
        MINIMUM_API_VERSION_VALUE
    }
}

fn rate_device_type(
    device_type: PhysicalDeviceType,
    preferred_type: PhysicalDeviceType,
    allow_any: bool,
) -> i32 {
    if device_type == preferred_type {
        return PREFERRED_DEVICE_TYPE_VALUE;
    }
    if !allow_any {
        return -1;
    }

    match device_type {
        PhysicalDeviceType::Discrete => DISCRETE_DEVICE_TYPE_VALUE,
        PhysicalDeviceType::Integrated => INTEGRATED_DEVICE_TYPE_VALUE,
        PhysicalDeviceType::VirtualGpu => VIRTUAL_DEVICE_TYPE_VALUE,
        PhysicalDeviceType::Cpu => CPU_DEVICE_TYPE_VALUE,
        PhysicalDeviceType::Other => OTHER_DEVICE_TYPE_VALUE,
    }
}

/// Checks that every required extension is supported and gathers the list to
/// enable (required plus any supported desired extension). Returns a rating of
/// -1 when a required extension is missing.
pub fn rate_extension_support(
    device_extensions: &[vk::ExtensionProperties],
    required: &[CString],
    desired: &[CString],
) -> (Vec<CString>, i32) {
    for name in required {
        if !is_extension_available(device_extensions, &name.to_string_lossy()) {
            return (vec![], -1);
        }
    }

    let mut to_enable: Vec<CString> = required.to_vec();
    to_enable.extend(
        desired
            .iter()
            .filter(|name| is_extension_available(device_extensions, &name.to_string_lossy()))
            .cloned(),
    );

    let rating = to_enable.len() as i32 * SUPPORTED_EXTENSION_VALUE;

    (to_enable, rating)
}

/// Picks the queues a logical device should create: one general queue
/// (required), plus the best suited transfer and compute queues when present.
pub fn rate_queue_support(
    queue_properties: &[vk::QueueFamilyProperties],
    require_transfer: bool,
    require_compute: bool,
) -> (Vec<QueueSelection>, i32) {
    let mut infos = to_family_infos(queue_properties);
    infos.sort_by_key(|info| Reverse(info.count));

    find_all_necessary_queues(&infos, require_transfer, require_compute)
}

fn find_all_necessary_queues(
    available: &[QueueFamilyInfo],
    require_transfer: bool,
    require_compute: bool,
) -> (Vec<QueueSelection>, i32) {
    let mut selected: Vec<QueueSelection> = Vec::with_capacity(3);
    let mut rating = 0;

    match best_general_queue(available).and_then(|info| adjust_selection(info, &selected)) {
        Some(mut queue) => {
            queue.flags = vk::QueueFlags::GRAPHICS;
            selected.push(queue);
        }
        None => return (vec![], -1),
    }

    match best_suited_transfer_queue(available, &selected) {
        Some(mut queue) => {
            queue.flags = vk::QueueFlags::TRANSFER;
            selected.push(queue);
            rating += TRANSFER_QUEUE_SUPPORT_VALUE;
        }
        None if require_transfer => return (vec![], -1),
        None => {}
    }

    match best_suited_compute_queue(available, &selected) {
        Some(mut queue) => {
            queue.flags = vk::QueueFlags::COMPUTE;
            selected.push(queue);
            rating += COMPUTE_QUEUE_SUPPORT_VALUE;
        }
        None if require_compute => return (vec![], -1),
        None => {}
    }

    (selected, rating)
}

fn best_match(
    available: &[QueueFamilyInfo],
    pred: impl Fn(&QueueFamilyInfo) -> bool,
) -> Option<QueueFamilyInfo> {
    available
        .iter()
        .copied()
        .filter(pred)
        .max_by_key(|info| info.count)
}

fn best_general_queue(available: &[QueueFamilyInfo]) -> Option<QueueFamilyInfo> {
    best_match(available, QueueFamilyInfo::supports_all_ops)
}

/// Prefers a family dedicated to transfer, then one without compute support,
/// then falls back to the general family.
fn best_suited_transfer_queue(
    available: &[QueueFamilyInfo],
    selected: &[QueueSelection],
) -> Option<QueueSelection> {
    best_match(available, QueueFamilyInfo::dedicated_to_transfer)
        .or_else(|| {
            best_match(available, |info| {
                info.supports_transfer() && !info.supports_compute()
            })
        })
        .or_else(|| best_general_queue(available))
        .and_then(|info| adjust_selection(info, selected))
}

fn best_suited_compute_queue(
    available: &[QueueFamilyInfo],
    selected: &[QueueSelection],
) -> Option<QueueSelection> {
    best_match(available, QueueFamilyInfo::dedicated_to_compute)
        .or_else(|| {
            best_match(available, |info| {
                info.supports_compute() && !info.supports_graphics()
            })
        })
        .or_else(|| best_general_queue(available))
        .and_then(|info| adjust_selection(info, selected))
}

/// Turns a family pick into a concrete (family, index) selection. The next
/// free index within the family is used; a family whose queues are exhausted
/// yields nothing.
fn adjust_selection(
    info: QueueFamilyInfo,
    selected: &[QueueSelection],
) -> Option<QueueSelection> {
    let index = selected
        .iter()
        .filter(|s| s.family == info.family)
        .count() as u32;

    (index < info.count).then_some(QueueSelection {
        flags: info.flags,
        family: info.family,
        index,
    })
}

impl PhysicalDevice {
    pub fn name(&self) -> String {
        chars_to_string(&self.properties.device_name)
    }

    pub fn api_version(&self) -> SemanticVersion {
        SemanticVersion::from_vulkan(self.properties.api_version)
    }

    pub fn device_type(&self) -> PhysicalDeviceType {
        self.properties.device_type.into()
    }

    /// Selects the memory type matching `flags` that is backed by the largest
    /// heap.
    pub fn memory_type_index(&self, flags: vk::MemoryPropertyFlags) -> Option<u32> {
        let count = self.memory_properties.memory_type_count as usize;
        self.memory_properties.memory_types[..count]
            .iter()
            .enumerate()
            .filter(|(_, ty)| ty.property_flags.contains(flags))
            .max_by_key(|(_, ty)| {
                self.memory_properties.memory_heaps[ty.heap_index as usize].size
            })
            .map(|(index, _)| index as u32)
    }
}
