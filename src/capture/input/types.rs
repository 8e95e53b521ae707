use serde::{Deserialize, Serialize};

/// One captured or derived input occurrence.
///
/// Serialized as a flat JSON object: `{"time_stamp": 1.25, "action": "move", "x": .., "y": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Capture-clock seconds (see [`crate::capture::clock`]).
    #[serde(rename = "time_stamp")]
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EventKind {
    Move {
        x: f64,
        y: f64,
    },
    Click {
        x: f64,
        y: f64,
        button: String,
        pressed: bool,
    },
    Scroll {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
    Press {
        name: String,
    },
    Release {
        name: String,
    },
    Pause,
    Resume,
    /// Synthetic: a click-down/click-up pair that spans frames.
    ClickComplete {
        x: f64,
        y: f64,
        button: String,
        pressed: bool,
        press_time: f64,
        release_time: f64,
        duration: f64,
    },
    /// Synthetic: a key press/release pair that spans frames.
    PressComplete {
        name: String,
        press_time: f64,
        release_time: f64,
        duration: f64,
    },
}

impl EventKind {
    pub fn action(&self) -> &'static str {
        match self {
            EventKind::Move { .. } => "move",
            EventKind::Click { .. } => "click",
            EventKind::Scroll { .. } => "scroll",
            EventKind::Press { .. } => "press",
            EventKind::Release { .. } => "release",
            EventKind::Pause => "pause",
            EventKind::Resume => "resume",
            EventKind::ClickComplete { .. } => "click_complete",
            EventKind::PressComplete { .. } => "press_complete",
        }
    }

    /// Screen position carried by pointer events.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            EventKind::Move { x, y }
            | EventKind::Click { x, y, .. }
            | EventKind::Scroll { x, y, .. }
            | EventKind::ClickComplete { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }

    pub fn input_class(&self) -> InputClass {
        match self {
            EventKind::Move { .. }
            | EventKind::Click { .. }
            | EventKind::Scroll { .. }
            | EventKind::ClickComplete { .. } => InputClass::Pointer,
            EventKind::Press { .. } | EventKind::Release { .. } | EventKind::PressComplete { .. } => {
                InputClass::Keyboard
            }
            EventKind::Pause | EventKind::Resume => InputClass::Marker,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, EventKind::ClickComplete { .. } | EventKind::PressComplete { .. })
    }
}

impl InputEvent {
    pub fn new(timestamp: f64, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }
}

/// Producer families feeding the capture queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputClass {
    Pointer,
    Keyboard,
    /// Controller-issued pause/resume markers.
    Marker,
}

impl std::fmt::Display for InputClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputClass::Pointer => write!(f, "pointer"),
            InputClass::Keyboard => write!(f, "keyboard"),
            InputClass::Marker => write!(f, "marker"),
        }
    }
}
