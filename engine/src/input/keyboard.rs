//! Keyboard Input Module
//!
//! Generic key codes and the live pressed/released state of the logical
//! locomotion controls. Decoupled from winit; the binary converts its events.

use serde::{Deserialize, Serialize};

use super::bindings::{Control, ControlSet};

/// Generic key codes, independent of windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    // Letter keys
    W,
    A,
    S,
    D,
    Q,
    E,
    R,
    F,
    J,
    K,
    L,
    I,

    Space,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Control keys
    Escape,
    Enter,
    Tab,

    /// Catch-all for unhandled keys
    Unknown,
}

impl KeyCode {
    /// Maps a legacy numeric DOM key code (`event.keyCode`) to a key.
    ///
    /// Only the keys the locomotion rig can bind are recognised; everything
    /// else maps to [`KeyCode::Unknown`].
    pub fn from_dom_key_code(code: u32) -> Self {
        match code {
            9 => KeyCode::Tab,
            13 => KeyCode::Enter,
            16 => KeyCode::ShiftLeft,
            17 => KeyCode::ControlLeft,
            27 => KeyCode::Escape,
            32 => KeyCode::Space,
            37 => KeyCode::ArrowLeft,
            38 => KeyCode::ArrowUp,
            39 => KeyCode::ArrowRight,
            40 => KeyCode::ArrowDown,
            65 => KeyCode::A,
            68 => KeyCode::D,
            69 => KeyCode::E,
            70 => KeyCode::F,
            73 => KeyCode::I,
            74 => KeyCode::J,
            75 => KeyCode::K,
            76 => KeyCode::L,
            81 => KeyCode::Q,
            82 => KeyCode::R,
            83 => KeyCode::S,
            87 => KeyCode::W,
            _ => KeyCode::Unknown,
        }
    }
}

/// Live held state of every logical control.
///
/// Written only by input delivery (key events), read by the locomotion
/// controller once per tick. A transition becomes visible on the next tick
/// that reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    held: [bool; Control::COUNT],
}

impl ControlState {
    /// Create a state with every control released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a control is currently held.
    pub fn is_pressed(&self, control: Control) -> bool {
        self.held[control.index()]
    }

    /// Set the held state of a control directly.
    pub fn set(&mut self, control: Control, pressed: bool) {
        self.held[control.index()] = pressed;
    }

    /// Apply a physical key event through the control bindings.
    ///
    /// Returns the control the key is bound to, or `None` if the key is not
    /// bound (the event is then ignored).
    pub fn handle_key(&mut self, bindings: &ControlSet, key: KeyCode, pressed: bool) -> Option<Control> {
        let control = bindings.control_for(key)?;
        self.set(control, pressed);
        Some(control)
    }

    /// Check if any control is currently held.
    pub fn any_pressed(&self) -> bool {
        self.held.iter().any(|&held| held)
    }

    /// Release every control (focus loss, reset).
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}
