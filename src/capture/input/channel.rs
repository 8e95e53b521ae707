use crate::capture::clock::now_monotonic;
use crate::capture::input::types::{EventKind, InputClass, InputEvent};
use crate::error::CaptureError;
use crossbeam_channel::{Sender, TrySendError};
use parking_lot::{Mutex as ParkingMutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Capture-side view of the session state. Written only by the controller,
/// read by every producer before enqueueing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CaptureState {
    Recording = 1,
    Paused = 2,
    Closed = 3,
}

impl CaptureState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CaptureState::Recording,
            2 => CaptureState::Paused,
            _ => CaptureState::Closed,
        }
    }
}

/// Counters exposed for logging at stop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub enqueued: u64,
    pub discarded_paused: u64,
    pub backpressure_waits: u64,
    pub dropped_after_close: u64,
}

/// Front of the capture queue.
///
/// Producers hold the read side of `sender` while they check the state and enqueue;
/// the controller takes the write side to flip state, emit pause/resume markers and
/// close the queue. A marker is therefore never interleaved with a producer that
/// observed the previous state.
pub struct CaptureGate {
    state: AtomicU8,
    sender: RwLock<Option<Sender<InputEvent>>>,
    enqueued: AtomicU64,
    discarded_paused: AtomicU64,
    backpressure_waits: AtomicU64,
    dropped_after_close: AtomicU64,
    disabled: ParkingMutex<Vec<CaptureError>>,
}

impl CaptureGate {
    /// Open a gate in the recording state, feeding `sender`.
    pub fn open(sender: Sender<InputEvent>) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(CaptureState::Recording as u8),
            sender: RwLock::new(Some(sender)),
            enqueued: AtomicU64::new(0),
            discarded_paused: AtomicU64::new(0),
            backpressure_waits: AtomicU64::new(0),
            dropped_after_close: AtomicU64::new(0),
            disabled: ParkingMutex::new(Vec::new()),
        })
    }

    pub fn state(&self) -> CaptureState {
        CaptureState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn adapter(self: &Arc<Self>, class: InputClass) -> CaptureAdapter {
        CaptureAdapter {
            gate: self.clone(),
            class,
        }
    }

    /// Producer path. Returns whether the event reached the queue.
    ///
    /// The event is stamped only after the state check, under the read lock, so
    /// its time is never earlier than a marker already enqueued ahead of it.
    fn submit(&self, build: impl FnOnce() -> EventKind) -> bool {
        let slot = self.sender.read();
        match self.state() {
            CaptureState::Recording => {}
            CaptureState::Paused => {
                self.discarded_paused.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            CaptureState::Closed => {
                self.dropped_after_close.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        }
        match slot.as_ref() {
            Some(sender) => {
                let event = InputEvent::new(now_monotonic(), build());
                self.enqueue(sender, event)
            }
            None => {
                self.dropped_after_close.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    fn enqueue(&self, sender: &Sender<InputEvent>, event: InputEvent) -> bool {
        let delivered = match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let waits = self.backpressure_waits.fetch_add(1, Ordering::Relaxed) + 1;
                if waits.is_power_of_two() {
                    tracing::warn!(waits, "Capture queue full, producer waiting on writer");
                }
                sender.send(event).is_ok()
            }
            Err(TrySendError::Disconnected(_)) => false,
        };
        if delivered {
            self.enqueued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped_after_close.fetch_add(1, Ordering::Relaxed);
        }
        delivered
    }

    /// Recording -> Paused, then enqueue a `pause` marker. No-op otherwise.
    pub fn pause(&self) -> bool {
        let slot = self.sender.write();
        if self.state() != CaptureState::Recording {
            return false;
        }
        self.state.store(CaptureState::Paused as u8, Ordering::SeqCst);
        if let Some(sender) = slot.as_ref() {
            self.enqueue(sender, InputEvent::new(now_monotonic(), EventKind::Pause));
        }
        true
    }

    /// Enqueue a `resume` marker, then Paused -> Recording. No-op otherwise.
    pub fn resume(&self) -> bool {
        let slot = self.sender.write();
        if self.state() != CaptureState::Paused {
            return false;
        }
        if let Some(sender) = slot.as_ref() {
            self.enqueue(sender, InputEvent::new(now_monotonic(), EventKind::Resume));
        }
        self.state.store(CaptureState::Recording as u8, Ordering::SeqCst);
        true
    }

    /// Stop accepting events and release the queue's sending side.
    ///
    /// Once this returns no producer can enqueue again, so the writer sees the
    /// channel disconnect after draining what is already queued.
    pub fn close(&self) {
        let mut slot = self.sender.write();
        self.state.store(CaptureState::Closed as u8, Ordering::SeqCst);
        slot.take();
    }

    pub fn report_capture_error(&self, error: CaptureError) {
        tracing::warn!(class = %error.class(), "Input capture disabled: {}", error);
        self.disabled.lock().push(error);
    }

    pub fn disabled_inputs(&self) -> Vec<CaptureError> {
        self.disabled.lock().clone()
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            discarded_paused: self.discarded_paused.load(Ordering::Relaxed),
            backpressure_waits: self.backpressure_waits.load(Ordering::Relaxed),
            dropped_after_close: self.dropped_after_close.load(Ordering::Relaxed),
        }
    }
}

/// Handle given to an input source; its methods are safe to call from OS
/// callback threads. Nothing unwinds out of them.
#[derive(Clone)]
pub struct CaptureAdapter {
    gate: Arc<CaptureGate>,
    class: InputClass,
}

impl CaptureAdapter {
    pub fn class(&self) -> InputClass {
        self.class
    }

    pub fn on_move(&self, x: f64, y: f64) -> bool {
        self.dispatch(|| EventKind::Move { x, y })
    }

    pub fn on_click(&self, x: f64, y: f64, button: &str, pressed: bool) -> bool {
        self.dispatch(|| EventKind::Click {
            x,
            y,
            button: button.to_string(),
            pressed,
        })
    }

    pub fn on_scroll(&self, x: f64, y: f64, dx: f64, dy: f64) -> bool {
        self.dispatch(|| EventKind::Scroll { x, y, dx, dy })
    }

    pub fn on_press(&self, name: &str) -> bool {
        self.dispatch(|| EventKind::Press {
            name: name.to_string(),
        })
    }

    pub fn on_release(&self, name: &str) -> bool {
        self.dispatch(|| EventKind::Release {
            name: name.to_string(),
        })
    }

    pub fn report_error(&self, error: CaptureError) {
        self.gate.report_capture_error(error);
    }

    fn dispatch(&self, build: impl FnOnce() -> EventKind) -> bool {
        let gate = &self.gate;
        match catch_unwind(AssertUnwindSafe(|| gate.submit(build))) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::error!(class = %self.class, "Input callback panicked; event dropped");
                false
            }
        }
    }
}
