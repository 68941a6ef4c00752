use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton, WindowEvent};

use super::keyboard::{to_code_point, KeyModifierFlags};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Key(KeyEvent),
    MouseButton(MouseButtonEvent),
    MouseMove(MouseMovementEvent),
    Focus(FocusEvent),
    Command(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    Press,
    Release,
}

impl From<ElementState> for KeyEventType {
    fn from(state: ElementState) -> Self {
        match state {
            ElementState::Pressed => KeyEventType::Press,
            ElementState::Released => KeyEventType::Release,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventType,
    /// The character the key produces, when it produces one.
    pub code_point: Option<char>,
    pub mods: KeyModifierFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonEvent {
    pub kind: KeyEventType,
    pub button: MouseButton,
    pub mods: KeyModifierFlags,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseMovementEvent {
    pub position: PhysicalPosition<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusType {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusEvent {
    pub kind: FocusType,
}

/// Window-level reactions that need no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ignore,
    RenderWindow,
    CloseWindow,
}

/// Translates a platform window event into the library's event model.
/// Modifier changes return nothing; the caller tracks those and feeds the
/// current state back in through `mods`.
pub fn translate_window_event(event: &WindowEvent, mods: KeyModifierFlags) -> Option<Event> {
    match event {
        WindowEvent::CloseRequested | WindowEvent::Destroyed => {
            Some(Event::Command(Command::CloseWindow))
        }
        WindowEvent::Resized(_) => Some(Event::Command(Command::RenderWindow)),
        WindowEvent::Focused(focused) => Some(Event::Focus(FocusEvent {
            kind: if *focused {
                FocusType::In
            } else {
                FocusType::Out
            },
        })),
        WindowEvent::KeyboardInput { input, .. } => Some(Event::Key(KeyEvent {
            kind: input.state.into(),
            code_point: input.virtual_keycode.and_then(|key| to_code_point(key, mods)),
            mods,
        })),
        WindowEvent::MouseInput { state, button, .. } => {
            Some(Event::MouseButton(MouseButtonEvent {
                kind: (*state).into(),
                button: *button,
                mods,
            }))
        }
        WindowEvent::CursorMoved { position, .. } => Some(Event::MouseMove(MouseMovementEvent {
            position: *position,
        })),
        WindowEvent::ModifiersChanged(_) => None,
        _ => Some(Event::Command(Command::Ignore)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;
    use winit::event::{DeviceId, KeyboardInput, ModifiersState, VirtualKeyCode};

    fn device_id() -> DeviceId {
        // No real device is involved in these tests.
        unsafe { DeviceId::dummy() }
    }

    #[allow(deprecated)]
    fn key_input(key: VirtualKeyCode, state: ElementState) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            device_id: device_id(),
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: Some(key),
                modifiers: ModifiersState::empty(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn close_request_becomes_close_command() {
        assert_eq!(
            translate_window_event(&WindowEvent::CloseRequested, KeyModifierFlags::empty()),
            Some(Event::Command(Command::CloseWindow))
        );
    }

    #[test]
    fn resize_requests_a_render() {
        let event = WindowEvent::Resized(PhysicalSize::new(800, 600));
        assert_eq!(
            translate_window_event(&event, KeyModifierFlags::empty()),
            Some(Event::Command(Command::RenderWindow))
        );
    }

    #[test]
    fn focus_events_carry_direction() {
        assert_eq!(
            translate_window_event(&WindowEvent::Focused(true), KeyModifierFlags::empty()),
            Some(Event::Focus(FocusEvent {
                kind: FocusType::In
            }))
        );
        assert_eq!(
            translate_window_event(&WindowEvent::Focused(false), KeyModifierFlags::empty()),
            Some(Event::Focus(FocusEvent {
                kind: FocusType::Out
            }))
        );
    }

    #[test]
    fn key_press_applies_tracked_modifiers() {
        let event = key_input(VirtualKeyCode::G, ElementState::Pressed);
        let translated = translate_window_event(&event, KeyModifierFlags::SHIFT);

        assert_eq!(
            translated,
            Some(Event::Key(KeyEvent {
                kind: KeyEventType::Press,
                code_point: Some('G'),
                mods: KeyModifierFlags::SHIFT,
            }))
        );
    }

    #[test]
    fn modifier_changes_are_left_to_the_caller() {
        let event = WindowEvent::ModifiersChanged(ModifiersState::SHIFT);
        assert_eq!(translate_window_event(&event, KeyModifierFlags::empty()), None);
    }

    #[test]
    fn unknown_events_are_ignored() {
        let event = WindowEvent::HoveredFileCancelled;
        assert_eq!(
            translate_window_event(&event, KeyModifierFlags::empty()),
            Some(Event::Command(Command::Ignore))
        );
    }
}
