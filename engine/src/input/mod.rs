//! Input Module
//!
//! Platform-agnostic keyboard input for the locomotion rig. Physical keys are
//! mapped to logical controls through a [`ControlSet`]; the resulting
//! [`ControlState`] is what the controller reads each tick.
//!
//! # Example
//!
//! ```rust,ignore
//! use stride_engine::input::{Control, ControlSet, ControlState, KeyCode};
//!
//! let bindings = ControlSet::default();
//! let mut controls = ControlState::new();
//!
//! controls.handle_key(&bindings, KeyCode::W, true);
//! if controls.is_pressed(Control::Forward) {
//!     // Accelerate
//! }
//! ```

pub mod bindings;
pub mod keyboard;

pub use bindings::{Control, ControlSet};
pub use keyboard::{ControlState, KeyCode};
