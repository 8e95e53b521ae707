//! OS input hooks backed by `rdev`
//!
//! `rdev::listen` installs a global hook that cannot be removed, so one listener
//! thread is started per process and its callbacks are routed to whichever
//! adapters are currently registered. Unregistering clears the route; the hook
//! stays installed and further callbacks are discarded.

use crate::capture::input::{CaptureAdapter, InputClass};
use crate::capture::source::InputSource;
use crate::error::CaptureError;
use parking_lot::{const_rwlock, RwLock};
use rdev::{Button, EventType, Key};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

struct Routes {
    pointer: Option<CaptureAdapter>,
    keyboard: Option<CaptureAdapter>,
}

static ROUTES: RwLock<Routes> = const_rwlock(Routes {
    pointer: None,
    keyboard: None,
});
static LISTENER: OnceLock<Result<(), String>> = OnceLock::new();
static LAST_X: AtomicU64 = AtomicU64::new(0);
static LAST_Y: AtomicU64 = AtomicU64::new(0);

/// One input class served by the shared `rdev` listener.
pub struct RdevSource {
    class: InputClass,
    name: String,
}

impl RdevSource {
    pub fn pointer() -> Self {
        Self {
            class: InputClass::Pointer,
            name: "rdev-pointer".to_string(),
        }
    }

    pub fn keyboard() -> Self {
        Self {
            class: InputClass::Keyboard,
            name: "rdev-keyboard".to_string(),
        }
    }
}

impl InputSource for RdevSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_class(&self) -> InputClass {
        self.class
    }

    fn register(&mut self, adapter: CaptureAdapter) -> Result<(), CaptureError> {
        {
            let mut routes = ROUTES.write();
            match self.class {
                InputClass::Pointer => routes.pointer = Some(adapter),
                InputClass::Keyboard => routes.keyboard = Some(adapter),
                InputClass::Marker => {
                    return Err(CaptureError::Unsupported { class: self.class });
                }
            }
        }
        let listening = ensure_listener(&LISTENER, self.class, spawn_listener);
        if listening.is_err() {
            self.unregister();
        }
        listening
    }

    fn unregister(&mut self) {
        let mut routes = ROUTES.write();
        match self.class {
            InputClass::Pointer => routes.pointer = None,
            InputClass::Keyboard => routes.keyboard = None,
            InputClass::Marker => {}
        }
    }
}

/// Start the listener on first use. The outcome is kept, so every later caller
/// sees the same result reported under its own class.
fn ensure_listener(
    listener: &OnceLock<Result<(), String>>,
    class: InputClass,
    spawn: impl FnOnce() -> std::io::Result<()>,
) -> Result<(), CaptureError> {
    listener
        .get_or_init(|| spawn().map_err(|error| error.to_string()))
        .clone()
        .map_err(|reason| CaptureError::HookFailed { class, reason })
}

fn spawn_listener() -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("rdev-listener".to_string())
        .spawn(|| {
            tracing::info!("OS input listener started");
            if let Err(error) = rdev::listen(route_event) {
                let reason = format!("{:?}", error);
                tracing::error!("OS input listener failed: {}", reason);
                let routes = ROUTES.read();
                for adapter in [&routes.pointer, &routes.keyboard].into_iter().flatten() {
                    adapter.report_error(CaptureError::HookFailed {
                        class: adapter.class(),
                        reason: reason.clone(),
                    });
                }
            }
        })
        .map(|_| ())
}

fn last_position() -> (f64, f64) {
    (
        f64::from_bits(LAST_X.load(Ordering::Relaxed)),
        f64::from_bits(LAST_Y.load(Ordering::Relaxed)),
    )
}

fn route_event(event: rdev::Event) {
    let routes = ROUTES.read();
    match event.event_type {
        EventType::MouseMove { x, y } => {
            LAST_X.store(x.to_bits(), Ordering::Relaxed);
            LAST_Y.store(y.to_bits(), Ordering::Relaxed);
            if let Some(adapter) = &routes.pointer {
                adapter.on_move(x, y);
            }
        }
        EventType::ButtonPress(button) | EventType::ButtonRelease(button) => {
            let pressed = matches!(event.event_type, EventType::ButtonPress(_));
            if let Some(adapter) = &routes.pointer {
                let (x, y) = last_position();
                adapter.on_click(x, y, &button_name(button), pressed);
            }
        }
        EventType::Wheel { delta_x, delta_y } => {
            if let Some(adapter) = &routes.pointer {
                let (x, y) = last_position();
                adapter.on_scroll(x, y, delta_x as f64, delta_y as f64);
            }
        }
        EventType::KeyPress(key) => {
            if let Some(adapter) = &routes.keyboard {
                adapter.on_press(&key_name(key));
            }
        }
        EventType::KeyRelease(key) => {
            if let Some(adapter) = &routes.keyboard {
                adapter.on_release(&key_name(key));
            }
        }
    }
}

fn button_name(button: Button) -> String {
    match button {
        Button::Left => "left".to_string(),
        Button::Right => "right".to_string(),
        Button::Middle => "middle".to_string(),
        Button::Unknown(code) => format!("button{}", code),
    }
}

/// Stable name used for both press and release so the two can be paired.
fn key_name(key: Key) -> String {
    let debug = format!("{:?}", key);
    match debug.strip_prefix("Key") {
        Some(letter) if letter.len() == 1 => letter.to_lowercase(),
        _ => debug.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_are_stable() {
        assert_eq!(key_name(Key::KeyA), "a");
        assert_eq!(key_name(Key::ShiftLeft), "shiftleft");
        assert_eq!(key_name(Key::Return), "return");
    }

    #[test]
    fn test_failed_listener_spawn_is_reported_to_every_class() {
        let listener = OnceLock::new();
        let first = ensure_listener(&listener, InputClass::Pointer, || {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no threads left"))
        });
        assert!(matches!(
            first,
            Err(CaptureError::HookFailed { class: InputClass::Pointer, .. })
        ));

        let second = ensure_listener(&listener, InputClass::Keyboard, || Ok(()));
        match second {
            Err(CaptureError::HookFailed { class, reason }) => {
                assert_eq!(class, InputClass::Keyboard);
                assert_eq!(reason, "no threads left");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_listener_spawns_once() {
        let listener = OnceLock::new();
        let mut spawns = 0;
        assert!(ensure_listener(&listener, InputClass::Pointer, || {
            spawns += 1;
            Ok(())
        })
        .is_ok());
        assert!(ensure_listener(&listener, InputClass::Keyboard, || {
            spawns += 1;
            Ok(())
        })
        .is_ok());
        assert_eq!(spawns, 1);
    }

    #[test]
    fn test_button_names() {
        assert_eq!(button_name(Button::Left), "left");
        assert_eq!(button_name(Button::Unknown(4)), "button4");
    }
}
