//! Locomotion state
//!
//! Per-actor acceleration and orientation bookkeeping. Digital input is
//! turned into a continuous signed value per axis by easing it one `step`
//! per tick, snapping back hard when the input reverses a large value, and
//! decaying by `damping` when the axis has no input.
//!
//! Sign convention: "forward" and "right" push an axis negative,
//! "backward" and "left" push it positive.

use glam::Vec3;

use crate::config::{Archetype, AxisTuning};

/// Selects one of the two acceleration axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Along the heading
    Linear,
    /// Yaw turn rate
    Angular,
}

/// Signed acceleration of one axis plus its tunables.
///
/// `|acceleration| <= max` holds after every easing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    pub acceleration: f32,
    pub step: f32,
    pub max: f32,
    pub damping: f32,
}

impl AxisState {
    pub fn new(tuning: AxisTuning) -> Self {
        Self {
            acceleration: 0.0,
            step: tuning.step,
            max: tuning.max,
            damping: tuning.damping,
        }
    }

    /// One tick of input towards `-max`.
    ///
    /// A value already at or past `-max / 2` snaps to `-max / 4`; otherwise
    /// it moves one step down, never past `-max`.
    pub fn ease_negative(&mut self) {
        if self.acceleration <= -self.max / 2.0 {
            self.acceleration = -self.max / 4.0;
        } else {
            self.acceleration = (self.acceleration - self.step).max(-self.max);
        }
        self.clamp();
    }

    /// Mirror of [`ease_negative`](Self::ease_negative) towards `+max`.
    pub fn ease_positive(&mut self) {
        if self.acceleration >= self.max / 2.0 {
            self.acceleration = self.max / 4.0;
        } else {
            self.acceleration = (self.acceleration + self.step).min(self.max);
        }
        self.clamp();
    }

    /// One tick without input.
    pub fn damp(&mut self) {
        self.acceleration *= self.damping;
    }

    fn clamp(&mut self) {
        self.acceleration = self.acceleration.clamp(-self.max, self.max);
    }
}

/// Everything the controller tracks for one actor between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct LocomotionState {
    pub linear: AxisState,
    pub angular: AxisState,
    /// Euler angles of the body (x roll, y pitch, z yaw) from the last post-step
    pub heading: Vec3,
    /// Roll rounded to whole degrees
    pub roll_degrees: i32,
    /// Pitch rounded to whole degrees
    pub pitch_degrees: i32,
    pub is_grounded: bool,
    pub jump_impulse: f32,
    /// Simulated seconds since spawn
    pub time_alive: f32,
}

impl LocomotionState {
    /// Fresh state for an actor of `archetype`: at rest, not grounded.
    pub fn new(archetype: &Archetype) -> Self {
        Self {
            linear: AxisState::new(archetype.linear),
            angular: AxisState::new(archetype.angular),
            heading: Vec3::ZERO,
            roll_degrees: 0,
            pitch_degrees: 0,
            is_grounded: false,
            jump_impulse: archetype.jump_impulse,
            time_alive: 0.0,
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisState {
        match axis {
            Axis::Linear => &self.linear,
            Axis::Angular => &self.angular,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisState {
        match axis {
            Axis::Linear => &mut self.linear,
            Axis::Angular => &mut self.angular,
        }
    }

    /// Whether the rounded roll or pitch says the body has tipped over.
    pub fn is_tipped_over(&self) -> bool {
        self.roll_degrees >= 90
            || self.roll_degrees <= -90
            || self.pitch_degrees >= 90
            || self.pitch_degrees <= -90
    }
}
