//! Input Bindings Module
//!
//! Maps physical keys to the logical locomotion controls. The mapping is
//! data: it can be rebound at runtime and loaded from JSON.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::KeyCode;

/// Logical controls consumed by the locomotion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    /// Accelerate along the heading (default: W)
    Forward,
    /// Accelerate against the heading (default: S)
    Backward,
    /// Turn left (default: A)
    Left,
    /// Turn right (default: D)
    Right,
    /// Jump when grounded (default: Space)
    Jump,
}

impl Control {
    pub const COUNT: usize = 5;

    pub const ALL: [Control; Control::COUNT] = [
        Control::Forward,
        Control::Backward,
        Control::Left,
        Control::Right,
        Control::Jump,
    ];

    /// Dense index used by [`super::ControlState`].
    pub fn index(self) -> usize {
        match self {
            Control::Forward => 0,
            Control::Backward => 1,
            Control::Left => 2,
            Control::Right => 3,
            Control::Jump => 4,
        }
    }
}

/// One-to-one mapping between physical keys and logical controls.
///
/// Every control always has exactly one key. Binding a key that belongs to
/// another control swaps the two keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Control, KeyCode>", into = "BTreeMap<Control, KeyCode>")]
pub struct ControlSet {
    key_to_control: HashMap<KeyCode, Control>,
    control_to_key: HashMap<Control, KeyCode>,
}

impl Default for ControlSet {
    /// W/S/A/D + Space.
    fn default() -> Self {
        let mut set = Self::empty();
        set.insert(KeyCode::W, Control::Forward);
        set.insert(KeyCode::S, Control::Backward);
        set.insert(KeyCode::A, Control::Left);
        set.insert(KeyCode::D, Control::Right);
        set.insert(KeyCode::Space, Control::Jump);
        set
    }
}

impl ControlSet {
    /// Only for building a complete set; never handed out.
    fn empty() -> Self {
        Self {
            key_to_control: HashMap::new(),
            control_to_key: HashMap::new(),
        }
    }

    fn insert(&mut self, key: KeyCode, control: Control) {
        self.key_to_control.insert(key, control);
        self.control_to_key.insert(control, key);
    }

    /// Bind a physical key to a control.
    ///
    /// If `key` already drives another control, that control takes over
    /// `control`'s old key.
    pub fn bind(&mut self, key: KeyCode, control: Control) {
        let Some(old_key) = self.key_for(control) else {
            return self.insert(key, control);
        };
        if old_key == key {
            return;
        }

        self.key_to_control.remove(&old_key);
        if let Some(displaced) = self.control_for(key) {
            self.insert(old_key, displaced);
            log::debug!("{key:?} moved to {control:?}, {displaced:?} now on {old_key:?}");
        }
        self.insert(key, control);
    }

    /// Control bound to a physical key, if any.
    pub fn control_for(&self, key: KeyCode) -> Option<Control> {
        self.key_to_control.get(&key).copied()
    }

    /// Key bound to a control, if any.
    pub fn key_for(&self, control: Control) -> Option<KeyCode> {
        self.control_to_key.get(&control).copied()
    }

    /// Controls that currently have no key.
    pub fn unbound(&self) -> Vec<Control> {
        Control::ALL
            .into_iter()
            .filter(|control| !self.control_to_key.contains_key(control))
            .collect()
    }
}

impl TryFrom<BTreeMap<Control, KeyCode>> for ControlSet {
    type Error = String;

    fn try_from(table: BTreeMap<Control, KeyCode>) -> Result<Self, Self::Error> {
        let mut set = Self::empty();
        for (&control, &key) in &table {
            if let Some(other) = set.control_for(key) {
                return Err(format!("key {key:?} bound to both {other:?} and {control:?}"));
            }
            set.insert(key, control);
        }

        let missing = set.unbound();
        if !missing.is_empty() {
            return Err(format!("controls without a key: {missing:?}"));
        }
        Ok(set)
    }
}

impl From<ControlSet> for BTreeMap<Control, KeyCode> {
    fn from(set: ControlSet) -> Self {
        set.control_to_key.into_iter().collect()
    }
}
