use std::collections::BTreeMap;
use std::os::raw::c_char;
use std::sync::Arc;

use ash::vk;
use log::{debug, info};
use thiserror::Error;

use super::queue::Queue;
use super::{Device, DeviceStore, InstanceStore, PhysicalDevice};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("the selected physical device created no queues")]
    NoQueuesSelected,
    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}

impl<I: InstanceStore> Device<I> {
    /// Creates the logical device for a selected physical device, enabling the
    /// features and extensions the selection recorded and retrieving every
    /// queue it asked for.
    pub fn new(
        instance_provider: &Arc<I>,
        physical_device: PhysicalDevice,
    ) -> Result<Arc<Device<I>>, DeviceError> {
        if physical_device.queues_to_create.is_empty() {
            return Err(DeviceError::NoQueuesSelected);
        }

        // One create info per family, sized to the number of queues selected
        // from it.
        let mut family_counts: BTreeMap<u32, u32> = BTreeMap::new();
        for selection in &physical_device.queues_to_create {
            let count = family_counts.entry(selection.family).or_insert(0);
            *count = (*count).max(selection.index + 1);
        }

        let priorities: Vec<Vec<f32>> = family_counts
            .values()
            .map(|&count| vec![1.0; count as usize])
            .collect();
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = family_counts
            .keys()
            .zip(priorities.iter())
            .map(|(&family, priorities)| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(priorities)
                    .build()
            })
            .collect();

        let extension_ptrs: Vec<*const c_char> = physical_device
            .extensions_to_enable
            .iter()
            .map(|name| name.as_ptr())
            .collect();

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&physical_device.features);

        let device = unsafe {
            instance_provider
                .instance()
                .create_device(physical_device.handle, &info, None)
        }?;
        info!("created logical device {:?}", device.handle());

        let queues: Vec<Queue> = physical_device
            .queues_to_create
            .iter()
            .map(|selection| Queue {
                handle: unsafe { device.get_device_queue(selection.family, selection.index) },
                flags: selection.flags,
                family_index: selection.family,
                queue_index: selection.index,
            })
            .collect();
        for queue in &queues {
            debug!("queue = {:?}", queue);
        }

        Ok(Arc::new(Device {
            instance: instance_provider.clone(),
            physical_device,
            device,
            queues,
        }))
    }

    pub fn instance_provider(&self) -> &Arc<I> {
        &self.instance
    }
}

impl<I: InstanceStore> DeviceStore for Device<I> {
    fn device(&self) -> &ash::Device {
        &self.device
    }

    fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    /// Returns the queue matching `target_flags` with the fewest extra
    /// capabilities, so dedicated queues win over general ones.
    fn get_queue(&self, target_flags: vk::QueueFlags) -> Option<&Queue> {
        self.queues
            .iter()
            .filter(|queue| queue.flags.contains(target_flags))
            .min_by_key(|queue| capability_score(queue.flags))
    }

    fn graphics_queue(&self) -> Option<&Queue> {
        self.get_queue(vk::QueueFlags::GRAPHICS)
    }

    fn compute_queue(&self) -> Option<&Queue> {
        self.get_queue(vk::QueueFlags::COMPUTE)
    }

    fn transfer_queue(&self) -> Option<&Queue> {
        self.get_queue(vk::QueueFlags::TRANSFER)
    }

    fn present_queue(&self) -> Option<&Queue> {
        self.get_queue(vk::QueueFlags::GRAPHICS)
    }
}

fn capability_score(flags: vk::QueueFlags) -> u32 {
    [
        vk::QueueFlags::GRAPHICS,
        vk::QueueFlags::COMPUTE,
        vk::QueueFlags::TRANSFER,
    ]
    .into_iter()
    .filter(|&flag| flags.contains(flag))
    .count() as u32
}

impl<I: InstanceStore> Drop for Device<I> {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            debug!("destroyed device {:?}", self.device.handle());
            self.device.destroy_device(None);
        }
    }
}
