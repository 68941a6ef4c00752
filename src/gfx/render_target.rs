use std::sync::Arc;

use ash::vk;
use log::{debug, info};
use thiserror::Error;

use crate::init::{Device, DeviceStore, InstanceStore};

use super::{RenderTarget, TargetStatus};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("no device is attached to the render target")]
    NoDevice,
    #[error("the surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("the device exposes no queue usable for swapchain presentation")]
    NoPresentableQueue,
    #[error("vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),
}

const DESIRED_FORMATS: [vk::SurfaceFormatKHR; 2] = [
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
];

const DESIRED_PRESENT_MODES: [vk::PresentModeKHR; 2] =
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];

impl<I: InstanceStore> RenderTarget<I> {
    /// Wraps a freshly created window surface. The target stays in
    /// `NoDevice` until a device is attached.
    pub fn new(instance: Arc<I>, surface: vk::SurfaceKHR) -> RenderTarget<I> {
        let surface_loader =
            ash::extensions::khr::Surface::new(instance.entry(), instance.instance());

        RenderTarget {
            instance,
            surface_loader,
            surface,
            device: None,
            swapchain_loader: None,
            swapchain: vk::SwapchainKHR::null(),
            images: vec![],
            format: vk::SurfaceFormatKHR::default(),
            extent: vk::Extent2D::default(),
            status: TargetStatus::NoDevice,
        }
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn status(&self) -> TargetStatus {
        self.status
    }

    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Attaches the rendering device and brings up the swapchain. Replacing
    /// an already attached device marks the target lost and tears the old
    /// swapchain down first; the old swapchain cannot seed the new one across
    /// devices.
    pub fn set_device(&mut self, device: Arc<Device<I>>) -> Result<(), TargetError> {
        if self.device.is_some() {
            self.destroy_swapchain();
            self.status = TargetStatus::DeviceLost;
        } else {
            self.status = TargetStatus::NoSwapchain;
        }

        self.swapchain_loader = Some(ash::extensions::khr::Swapchain::new(
            self.instance.instance(),
            device.device(),
        ));
        self.device = Some(device);

        self.create_swapchain()
    }

    /// Recreates the swapchain against the surface's current extent. Called
    /// after the window is resized.
    pub fn resize(&mut self) -> Result<(), TargetError> {
        if self.device.is_none() {
            return Ok(());
        }
        self.create_swapchain()
    }

    fn create_swapchain(&mut self) -> Result<(), TargetError> {
        let device = self.device.as_ref().ok_or(TargetError::NoDevice)?;
        let loader = self.swapchain_loader.as_ref().ok_or(TargetError::NoDevice)?;
        let physical = device.physical_device().handle;

        let (capabilities, formats, present_modes);
        unsafe {
            capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(physical, self.surface)?;
            formats = self
                .surface_loader
                .get_physical_device_surface_formats(physical, self.surface)?;
            present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(physical, self.surface)?;
        }

        let format = choose_surface_format(&formats).ok_or(TargetError::NoSurfaceFormat)?;
        let present_mode = choose_present_mode(&present_modes);
        let extent = clamp_extent(capabilities.current_extent, &capabilities);
        let image_count = choose_image_count(&capabilities);
        let old_swapchain = self.swapchain;

        let graphics = device
            .graphics_queue()
            .ok_or(TargetError::NoPresentableQueue)?;
        let present = device
            .transfer_queue()
            .ok_or(TargetError::NoPresentableQueue)?;
        let queue_families = [graphics.family_index, present.family_index];
        let sharing_mode = select_sharing_mode(&queue_families);

        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface)
            .min_image_count(image_count)
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&queue_families)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { loader.create_swapchain(&info, None) }?;
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { loader.destroy_swapchain(old_swapchain, None) };
        }

        self.swapchain = swapchain;
        self.images = unsafe { loader.get_swapchain_images(swapchain) }?;
        self.format = format;
        self.extent = extent;
        self.status = TargetStatus::Ready;

        info!(
            "created swapchain {:?} ({}x{}, {} images)",
            swapchain,
            extent.width,
            extent.height,
            self.images.len()
        );

        Ok(())
    }

    fn destroy_swapchain(&mut self) {
        if let Some(loader) = &self.swapchain_loader {
            if self.swapchain != vk::SwapchainKHR::null() {
                debug!("destroyed swapchain {:?}", self.swapchain);
                unsafe { loader.destroy_swapchain(self.swapchain, None) };
                self.swapchain = vk::SwapchainKHR::null();
                self.images.clear();
            }
        }
    }
}

impl<I: InstanceStore> Drop for RenderTarget<I> {
    fn drop(&mut self) {
        self.destroy_swapchain();
        debug!("destroyed surface {:?}", self.surface);
        unsafe { self.surface_loader.destroy_surface(self.surface, None) };
    }
}

/// Picks the first reported format that is one of the desired sRGB formats
/// (BGRA or RGBA); any reported format is acceptable as a fallback.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|format| DESIRED_FORMATS.contains(format))
        .or_else(|| formats.first())
        .copied()
}

/// Picks the first reported mode that is desired (mailbox or fifo). FIFO is
/// the only present mode Vulkan guarantees, so it is the fallback.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    modes
        .iter()
        .find(|mode| DESIRED_PRESENT_MODES.contains(mode))
        .copied()
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// One image over the surface's minimum, capped to its maximum when the
/// surface reports one (0 means unbounded).
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// Images are shared concurrently when the graphics and presentation queues
/// live in different families.
pub fn select_sharing_mode(queue_families: &[u32; 2]) -> vk::SharingMode {
    if queue_families[0] == queue_families[1] {
        vk::SharingMode::EXCLUSIVE
    } else {
        vk::SharingMode::CONCURRENT
    }
}

/// Clamps the surface's current extent into the image extent bounds it
/// advertises.
pub fn clamp_extent(current: vk::Extent2D, caps: &vk::SurfaceCapabilitiesKHR) -> vk::Extent2D {
    vk::Extent2D {
        width: current
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: current
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_prefers_srgb_bgra() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn surface_format_accepts_rgba_srgb_as_second_preference() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R16G16B16A16_SFLOAT,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn surface_format_falls_back_to_first_reported() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::R16G16B16A16_SFLOAT,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        }];

        assert_eq!(choose_surface_format(&formats), Some(formats[0]));
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn present_mode_prefers_mailbox_over_fifo() {
        let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);

        let modes = [vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);

        let modes = [vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn image_count_is_one_over_the_minimum_within_bounds() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 3);

        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capped), 3);

        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&unbounded), 3);
    }

    #[test]
    fn sharing_is_concurrent_across_queue_families() {
        assert_eq!(select_sharing_mode(&[0, 0]), vk::SharingMode::EXCLUSIVE);
        assert_eq!(select_sharing_mode(&[0, 1]), vk::SharingMode::CONCURRENT);
    }

    #[test]
    fn extent_is_clamped_into_surface_bounds() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_extent: vk::Extent2D {
                width: 64,
                height: 64,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 2160,
            },
            ..Default::default()
        };

        let clamped = clamp_extent(
            vk::Extent2D {
                width: 8000,
                height: 32,
            },
            &caps,
        );
        assert_eq!(clamped.width, 4096);
        assert_eq!(clamped.height, 64);

        let unchanged = clamp_extent(
            vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            &caps,
        );
        assert_eq!(unchanged.width, 1920);
        assert_eq!(unchanged.height, 1080);
    }
}
