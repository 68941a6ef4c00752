use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use log::debug;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use winit::event_loop::EventLoopWindowTarget;
use winit::window::{WindowBuilder, WindowId};

use crate::gfx::render_target::TargetError;
use crate::gfx::RenderTarget;
use crate::init::{Device, Instance, InstanceStore, PhysicalDevice};

use super::monitor::Monitor;
use super::{SystemError, Window};

impl Window {
    /// Creates a platform window filling the target monitor and the vulkan
    /// surface backing it. Device selection happens afterwards, against that
    /// surface.
    pub(crate) fn new<T>(
        instance: &Arc<Instance>,
        target: &EventLoopWindowTarget<T>,
        title: &str,
        monitor: &Monitor,
    ) -> Result<Window, SystemError> {
        let window = WindowBuilder::new()
            .with_title(title)
            .with_position(monitor.offset)
            .with_inner_size(monitor.size)
            .build(target)?;

        debug!("window created on {}", monitor);

        let surface = unsafe {
            ash_window::create_surface(
                instance.entry(),
                instance.instance(),
                window.raw_display_handle(),
                window.raw_window_handle(),
                None,
            )
        }
        .map_err(TargetError::from)?;
        debug!("created surface {:?} for window \"{}\"", surface, title);

        Ok(Window {
            title: title.to_owned(),
            window,
            target: RenderTarget::new(instance.clone(), surface),
            device: None,
        })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.target.surface()
    }

    pub fn render_target(&self) -> &RenderTarget<Instance> {
        &self.target
    }

    pub fn device(&self) -> Option<&Arc<Device<Instance>>> {
        self.device.as_ref()
    }

    /// Accepts the physical device selected for this window, builds the
    /// logical device and hands it to the render target.
    pub fn set_physical_device(
        &mut self,
        instance: &Arc<Instance>,
        physical_device: PhysicalDevice,
    ) -> Result<(), SystemError> {
        let device = Device::new(instance, physical_device)?;
        self.target.set_device(device.clone())?;
        self.device = Some(device);

        Ok(())
    }

    pub(crate) fn resize(&mut self) -> Result<(), TargetError> {
        self.target.resize()
    }

    pub(crate) fn render(&mut self, _delta_time: Duration) {
        // Frame submission lives above this layer; keeping the redraw request
        // flowing is all the window itself does per frame.
        if self.device.is_some() {
            self.window.request_redraw();
        }
    }
}
