//! Player Module
//!
//! Provides player character movement and control.
//!
//! # Components
//!
//! - [`LocomotionController`] - Drives a physics body from held controls
//!   - Eased acceleration and turning with hard snap-back on reversal
//!   - Jump gated by ray-confirmed ground contact
//!   - Upright correction when tipped over against geometry
//! - [`LocomotionState`] - Per-actor acceleration, heading and grounded state
//! - [`Axis`] - Selects the linear or angular acceleration axis

pub mod controller;
pub mod locomotion;

pub use controller::{AdvanceOutcome, LocomotionController};
pub use locomotion::{Axis, AxisState, LocomotionState};
