use std::sync::Arc;

use thiserror::Error;
use winit::window::WindowId;

use crate::gfx::render_target::TargetError;
use crate::gfx::RenderTarget;
use crate::init::device::DeviceError;
use crate::init::instance::InstanceError;
use crate::init::physical::SelectionError;
use crate::init::{Device, Instance};

use self::keyboard::KeyModifierFlags;
use self::monitor::Monitor;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("could not create the platform window: {0}")]
    Os(#[from] winit::error::OsError),
    #[error("no monitor is available to place the window on")]
    NoMonitor,
}

pub mod system;
/// Central starting point of the library. Keeps track of the instance, the
/// available monitors, every open window and the input state shared between
/// them.
pub struct System {
    instance: Arc<Instance>,
    monitors: Vec<Monitor>,
    windows: Vec<Window>,
    modifiers: KeyModifierFlags,
    window_in_focus: Option<WindowId>,
}

pub mod window;
pub struct Window {
    title: String,
    window: winit::window::Window,
    target: RenderTarget<Instance>,
    device: Option<Arc<Device<Instance>>>,
}

pub mod event;
pub mod keyboard;
pub mod monitor;
