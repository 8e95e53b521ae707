//! Input sources
//!
//! An [`InputSource`] owns the OS-facing side of one input class. The controller
//! registers it with a [`CaptureAdapter`] when a session starts and unregisters it
//! at stop.

use crate::capture::input::{CaptureAdapter, InputClass};
use crate::error::CaptureError;
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;

pub trait InputSource: Send {
    fn name(&self) -> &str;

    fn input_class(&self) -> InputClass;

    /// Begin routing callbacks into `adapter`.
    fn register(&mut self, adapter: CaptureAdapter) -> Result<(), CaptureError>;

    /// Stop routing callbacks. After this returns the source never touches the
    /// adapter it was given.
    fn unregister(&mut self);
}

type AdapterSlot = Arc<ParkingMutex<Option<CaptureAdapter>>>;

/// Programmatic producer for scripted capture and tests.
pub struct ManualSource {
    name: String,
    class: InputClass,
    slot: AdapterSlot,
}

/// Emits events into whatever adapter the paired [`ManualSource`] is registered with.
#[derive(Clone)]
pub struct ManualHandle {
    slot: AdapterSlot,
}

impl ManualSource {
    pub fn new(class: InputClass) -> (Self, ManualHandle) {
        let slot: AdapterSlot = Arc::new(ParkingMutex::new(None));
        let source = Self {
            name: format!("manual-{}", class),
            class,
            slot: slot.clone(),
        };
        (source, ManualHandle { slot })
    }
}

impl InputSource for ManualSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_class(&self) -> InputClass {
        self.class
    }

    fn register(&mut self, adapter: CaptureAdapter) -> Result<(), CaptureError> {
        *self.slot.lock() = Some(adapter);
        Ok(())
    }

    fn unregister(&mut self) {
        self.slot.lock().take();
    }
}

impl ManualHandle {
    fn with_adapter(&self, emit: impl FnOnce(&CaptureAdapter) -> bool) -> bool {
        match self.slot.lock().as_ref() {
            Some(adapter) => emit(adapter),
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn move_to(&self, x: f64, y: f64) -> bool {
        self.with_adapter(|a| a.on_move(x, y))
    }

    pub fn click(&self, x: f64, y: f64, button: &str, pressed: bool) -> bool {
        self.with_adapter(|a| a.on_click(x, y, button, pressed))
    }

    pub fn scroll(&self, x: f64, y: f64, dx: f64, dy: f64) -> bool {
        self.with_adapter(|a| a.on_scroll(x, y, dx, dy))
    }

    pub fn press(&self, name: &str) -> bool {
        self.with_adapter(|a| a.on_press(name))
    }

    pub fn release(&self, name: &str) -> bool {
        self.with_adapter(|a| a.on_release(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::CaptureGate;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_manual_source_routes_only_while_registered() {
        let (tx, rx) = unbounded();
        let gate = CaptureGate::open(tx);
        let (mut source, handle) = ManualSource::new(InputClass::Keyboard);

        assert!(!handle.press("a"));
        source.register(gate.adapter(source.input_class())).unwrap();
        assert!(handle.press("a"));
        source.unregister();
        assert!(!handle.release("a"));

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(source.name(), "manual-keyboard");
    }
}
