//! OS-level input capture.
//!
//! Wraps the rdev hook in a background thread and translates raw events
//! into the small `(source, transition)` vocabulary the rest of the app
//! consumes. The handler closure carries its own context; there is no
//! process-wide singleton behind the hook.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rdev::{listen, Button, Event, EventType, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

/// A discrete input transition, timestamp-free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPress(Key),
    KeyRelease(Key),
    ButtonPress(MouseButton),
    ButtonRelease(MouseButton),
    Wheel(WheelDirection),
}

fn map_button(button: Button) -> Option<MouseButton> {
    match button {
        Button::Left => Some(MouseButton::Left),
        Button::Right => Some(MouseButton::Right),
        Button::Middle => Some(MouseButton::Middle),
        // Side buttons arrive as the platform's raw x-button codes.
        Button::Unknown(8) => Some(MouseButton::X1),
        Button::Unknown(9) => Some(MouseButton::X2),
        Button::Unknown(_) => None,
    }
}

/// Translate a raw hook event; unrecognized events (mouse moves, unknown
/// buttons) are dropped.
pub fn translate(event: &Event) -> Option<InputEvent> {
    match event.event_type {
        EventType::KeyPress(key) => Some(InputEvent::KeyPress(key)),
        EventType::KeyRelease(key) => Some(InputEvent::KeyRelease(key)),
        EventType::ButtonPress(button) => map_button(button).map(InputEvent::ButtonPress),
        EventType::ButtonRelease(button) => map_button(button).map(InputEvent::ButtonRelease),
        EventType::Wheel { delta_y, .. } => {
            if delta_y > 0 {
                Some(InputEvent::Wheel(WheelDirection::Up))
            } else if delta_y < 0 {
                Some(InputEvent::Wheel(WheelDirection::Down))
            } else {
                None
            }
        }
        EventType::MouseMove { .. } => None,
    }
}

/// Install the input hook on a background thread.
///
/// The hook cannot be uninstalled once running (an rdev limitation); the
/// thread lives until process exit.
pub fn spawn_listener<F>(handler: F) -> JoinHandle<()>
where
    F: Fn(InputEvent) + Send + 'static,
{
    std::thread::spawn(move || {
        if let Err(e) = listen(move |event: Event| {
            if let Some(translated) = translate(&event) {
                handler(translated);
            }
        }) {
            tracing::error!("Failed to install input hook: {:?}", e);
        }
    })
}

/// Drive a periodic tick (fade processing, reclamation) on its own thread
/// until `running` goes false.
pub fn spawn_update_tick<F>(interval: Duration, running: Arc<AtomicBool>, tick: F) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    std::thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            tick();
            std::thread::sleep(interval);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn event(event_type: EventType) -> Event {
        Event {
            event_type,
            time: SystemTime::now(),
            name: None,
        }
    }

    #[test]
    fn test_translates_keys() {
        assert_eq!(
            translate(&event(EventType::KeyPress(Key::KeyA))),
            Some(InputEvent::KeyPress(Key::KeyA))
        );
        assert_eq!(
            translate(&event(EventType::KeyRelease(Key::Space))),
            Some(InputEvent::KeyRelease(Key::Space))
        );
    }

    #[test]
    fn test_translates_buttons() {
        assert_eq!(
            translate(&event(EventType::ButtonPress(Button::Left))),
            Some(InputEvent::ButtonPress(MouseButton::Left))
        );
        assert_eq!(
            translate(&event(EventType::ButtonRelease(Button::Unknown(8)))),
            Some(InputEvent::ButtonRelease(MouseButton::X1))
        );
        assert_eq!(translate(&event(EventType::ButtonPress(Button::Unknown(42)))), None);
    }

    #[test]
    fn test_translates_wheel() {
        assert_eq!(
            translate(&event(EventType::Wheel { delta_x: 0, delta_y: 1 })),
            Some(InputEvent::Wheel(WheelDirection::Up))
        );
        assert_eq!(
            translate(&event(EventType::Wheel { delta_x: 0, delta_y: -1 })),
            Some(InputEvent::Wheel(WheelDirection::Down))
        );
        assert_eq!(
            translate(&event(EventType::Wheel { delta_x: 0, delta_y: 0 })),
            None
        );
    }

    #[test]
    fn test_drops_mouse_moves() {
        assert_eq!(
            translate(&event(EventType::MouseMove { x: 1.0, y: 2.0 })),
            None
        );
    }
}
