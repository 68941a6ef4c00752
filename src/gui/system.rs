use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use raw_window_handle::HasRawDisplayHandle;
use winit::event::{Event as WinitEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowId;

use crate::init::instance;
use crate::init::physical::{find_most_suitable_gpu, SelectInfo};
use crate::init::{Instance, InstanceFactory, InstanceStore};
use crate::version::SemanticVersion;

use super::event::{self, Command, Event, FocusType};
use super::keyboard::KeyModifierFlags;
use super::monitor::{self, Monitor};
use super::{System, SystemError, Window};

impl System {
    /// Initializes the gui system: the platform event loop, a vulkan instance
    /// with the extensions the platform needs for surfaces, and the monitor
    /// list.
    ///
    /// The event loop is handed back to the caller; it is needed to create
    /// windows and to drive [`System::run`].
    pub fn new(app_name: &str) -> Result<(EventLoop<()>, System), SystemError> {
        let event_loop = EventLoop::new();

        let mut settings = instance::Settings::new(app_name, SemanticVersion::default());
        settings.use_window_extensions(event_loop.raw_display_handle())?;

        let instance = settings.create_instance()?;
        let monitors = monitor::list_available_monitors(&event_loop);
        info!("gui system started with {} monitor(s)", monitors.len());

        Ok((
            event_loop,
            System {
                instance,
                monitors,
                windows: vec![],
                modifiers: KeyModifierFlags::empty(),
                window_in_focus: None,
            },
        ))
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn window_in_focus(&self) -> Option<WindowId> {
        self.window_in_focus
    }

    /// Creates a new window on the first monitor and selects a GPU capable of
    /// rendering to it.
    pub fn make_window<T>(
        &mut self,
        target: &EventLoopWindowTarget<T>,
        title: &str,
    ) -> Result<&mut Window, SystemError> {
        let monitor = self.monitors.first().cloned().ok_or(SystemError::NoMonitor)?;
        let mut window = Window::new(&self.instance, target, title, &monitor)?;

        let select_info = SelectInfo {
            require_transfer_queue: true,
            require_compute_queue: true,
            minimum_version: self.instance.version(),
            required_extensions: vec![ash::extensions::khr::Swapchain::name().to_owned()],
            ..Default::default()
        };

        let physical_device = match find_most_suitable_gpu(self.instance.as_ref(), &select_info) {
            Ok(device) => device,
            Err(err) => {
                error!("failed to find a suitable GPU for window \"{}\"", title);
                return Err(err.into());
            }
        };

        info!(
            "rendering window \"{}\" using physical device \"{}\"",
            title,
            physical_device.name()
        );
        window.set_physical_device(&self.instance, physical_device)?;

        self.windows.push(window);
        Ok(self.windows.last_mut().unwrap())
    }

    /// The main loop. Polls and dispatches events, then renders every window
    /// with the elapsed frame time. Returns once the last window is closed.
    pub fn run(mut self, event_loop: &mut EventLoop<()>) -> i32 {
        let mut current_time = Instant::now();

        event_loop.run_return(move |event, _target, control_flow| {
            *control_flow = ControlFlow::Poll;

            match event {
                WinitEvent::WindowEvent { window_id, event } => {
                    if let WindowEvent::ModifiersChanged(state) = &event {
                        self.modifiers = (*state).into();
                        return;
                    }

                    if let WindowEvent::Resized(_) = &event {
                        if let Some(window) =
                            self.windows.iter_mut().find(|w| w.id() == window_id)
                        {
                            if let Err(err) = window.resize() {
                                warn!("failed to resize swapchain: {}", err);
                            }
                        }
                    }

                    if let Some(event) = event::translate_window_event(&event, self.modifiers) {
                        self.handle_event(window_id, event, control_flow);
                    }
                }
                WinitEvent::MainEventsCleared => {
                    let new_time = Instant::now();
                    let delta_time = new_time - current_time;
                    current_time = new_time;

                    for window in &mut self.windows {
                        window.render(delta_time);
                    }
                }
                _ => {}
            }
        })
    }

    fn handle_event(&mut self, window_id: WindowId, event: Event, control_flow: &mut ControlFlow) {
        match event {
            Event::Command(Command::CloseWindow) => {
                debug!("closing window {:?}", window_id);
                self.windows.retain(|window| window.id() != window_id);
                if self.window_in_focus == Some(window_id) {
                    self.window_in_focus = None;
                }
                if self.windows.is_empty() {
                    info!("shutting down");
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::Command(Command::RenderWindow) => {
                if let Some(window) = self.windows.iter_mut().find(|w| w.id() == window_id) {
                    window.render(std::time::Duration::ZERO);
                }
            }
            Event::Command(Command::Ignore) => {}
            Event::Focus(focus) => match focus.kind {
                FocusType::In => {
                    debug!("window {:?} gained focus", window_id);
                    self.window_in_focus = Some(window_id);
                }
                FocusType::Out => {
                    debug!("window {:?} lost focus", window_id);
                    if self.window_in_focus == Some(window_id) {
                        self.window_in_focus = None;
                    }
                }
            },
            Event::Key(key) => {
                debug!(
                    "key {:?} ({:?}, mods \"{}\") in window {:?}",
                    key.kind, key.code_point, key.mods, window_id
                );
            }
            Event::MouseButton(button) => {
                debug!(
                    "mouse button {:?} {:?} in window {:?}",
                    button.button, button.kind, window_id
                );
            }
            Event::MouseMove(_) => {}
        }
    }
}
