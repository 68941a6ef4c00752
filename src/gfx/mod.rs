use std::sync::Arc;

use ash::vk;

use crate::init::{Device, InstanceStore};

pub mod render_target;

/// What a render target is currently missing, or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    NoDevice,
    NoSwapchain,
    Ready,
    DeviceLost,
}

/// Couples a window surface with the device rendering to it and the swapchain
/// between them. The surface exists from window creation on; the swapchain
/// appears once a device is attached.
pub struct RenderTarget<I: InstanceStore> {
    instance: Arc<I>,
    surface_loader: ash::extensions::khr::Surface,
    surface: vk::SurfaceKHR,
    device: Option<Arc<Device<I>>>,
    swapchain_loader: Option<ash::extensions::khr::Swapchain>,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    status: TargetStatus,
}
