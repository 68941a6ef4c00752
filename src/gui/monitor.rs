use std::fmt;

use log::debug;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::EventLoopWindowTarget;

/// A monitor known to the platform, with its position inside the virtual
/// screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub name: String,
    pub offset: PhysicalPosition<i32>,
    pub size: PhysicalSize<u32>,
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "monitor{{ .name = {} .offset = {{{}, {}}} .size = {{{}, {}}} }}",
            self.name, self.offset.x, self.offset.y, self.size.width, self.size.height
        )
    }
}

/// Finds all monitors currently accessible.
pub fn list_available_monitors<T>(target: &EventLoopWindowTarget<T>) -> Vec<Monitor> {
    let monitors: Vec<Monitor> = target
        .available_monitors()
        .map(|handle| Monitor {
            name: handle.name().unwrap_or_default(),
            offset: handle.position(),
            size: handle.size(),
        })
        .collect();

    for monitor in &monitors {
        debug!("found {}", monitor);
    }

    monitors
}
