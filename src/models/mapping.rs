//! A mapping binds one trigger event to ordered action lists.
//!
//! Mappings are built fluently and stay inert data until a mode or the
//! compiler turns them into daemon manipulators.

use crate::keycode_db::keycode_db;
use crate::models::condition::Condition;
use crate::models::event::{FromEvent, Modifier, ToEvent};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Per-manipulator timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManipulatorParameters {
    /// `basic.to_if_alone_timeout_milliseconds`
    pub to_if_alone_timeout_ms: Option<u32>,
    /// `basic.to_if_held_down_threshold_milliseconds`
    pub to_if_held_down_threshold_ms: Option<u32>,
}

impl ManipulatorParameters {
    /// Returns true if no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to_if_alone_timeout_ms.is_none() && self.to_if_held_down_threshold_ms.is_none()
    }
}

/// One binding from a trigger event to one or more ordered actions,
/// optionally gated by conditions.
///
/// Action lists (`to`, `to_if_alone`, `to_if_held_down`, `to_after_key_up`)
/// are ordered; the daemon executes them in sequence without interleaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Trigger event
    pub from: FromEvent,
    /// Primary ordered action list
    pub to: Vec<ToEvent>,
    /// Actions when the key is pressed and released alone
    pub to_if_alone: Vec<ToEvent>,
    /// Actions when the key is held past the threshold
    pub to_if_held_down: Vec<ToEvent>,
    /// Actions after the key is released
    pub to_after_key_up: Vec<ToEvent>,
    /// Conjunction of conditions gating this mapping
    pub conditions: Vec<Condition>,
    /// Timing parameters
    pub parameters: ManipulatorParameters,
}

impl Mapping {
    /// Creates a mapping from an already-built trigger event.
    #[must_use]
    pub fn from_event(from: FromEvent) -> Self {
        Self {
            from,
            to: Vec::new(),
            to_if_alone: Vec::new(),
            to_if_held_down: Vec::new(),
            to_after_key_up: Vec::new(),
            conditions: Vec::new(),
            parameters: ManipulatorParameters::default(),
        }
    }

    /// Creates a mapping triggered by a single key.
    pub fn from_key(key: &str) -> Result<Self> {
        Ok(Self::from_event(FromEvent::key(key)?))
    }

    /// Creates a mapping triggered by a simultaneous key press.
    pub fn simultaneous<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        Ok(Self::from_event(FromEvent::simultaneous(keys)?))
    }

    /// Appends a primary action.
    #[must_use]
    pub fn to(mut self, event: ToEvent) -> Self {
        self.to.push(event);
        self
    }

    /// Appends a primary key action.
    pub fn to_key(self, key: &str) -> Result<Self> {
        Ok(self.to(ToEvent::key(key)?))
    }

    /// Appends a primary key action with modifiers.
    pub fn to_key_with_modifiers(
        self,
        key: &str,
        modifiers: impl Into<Vec<Modifier>>,
    ) -> Result<Self> {
        Ok(self.to(ToEvent::key_with_modifiers(key, modifiers)?))
    }

    /// Appends an opaque shell-command action.
    #[must_use]
    pub fn to_shell(self, command: impl Into<String>) -> Self {
        self.to(ToEvent::shell(command))
    }

    /// Appends an app-launch shell action.
    #[must_use]
    pub fn to_app(self, name: &str) -> Self {
        self.to(ToEvent::app(name))
    }

    /// Appends a pressed-alone action.
    #[must_use]
    pub fn to_if_alone(mut self, event: ToEvent) -> Self {
        self.to_if_alone.push(event);
        self
    }

    /// Appends a pressed-alone key action.
    pub fn to_if_alone_key(self, key: &str) -> Result<Self> {
        let event = ToEvent::key(key)?;
        Ok(self.to_if_alone(event))
    }

    /// Appends a held-down action.
    #[must_use]
    pub fn to_if_held_down(mut self, event: ToEvent) -> Self {
        self.to_if_held_down.push(event);
        self
    }

    /// Appends a held-down key action.
    pub fn to_if_held_down_key(self, key: &str) -> Result<Self> {
        let event = ToEvent::key(key)?;
        Ok(self.to_if_held_down(event))
    }

    /// Appends an after-release action.
    #[must_use]
    pub fn to_after_key_up(mut self, event: ToEvent) -> Self {
        self.to_after_key_up.push(event);
        self
    }

    /// Adds a condition (conjunction with any existing ones).
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Sets the pressed-alone timeout in milliseconds.
    #[must_use]
    pub const fn alone_timeout(mut self, ms: u32) -> Self {
        self.parameters.to_if_alone_timeout_ms = Some(ms);
        self
    }

    /// Sets the held-down threshold in milliseconds.
    #[must_use]
    pub const fn held_down_threshold(mut self, ms: u32) -> Self {
        self.parameters.to_if_held_down_threshold_ms = Some(ms);
        self
    }
}

/// Builds mappings from a statically declared `(key, action)` table.
///
/// Rejects duplicate trigger keys up front so a typo cannot silently shadow
/// an earlier entry.
pub fn mapping_table<A>(
    entries: &[(&str, A)],
    build: impl Fn(&str, &A) -> Result<Mapping>,
) -> Result<Vec<Mapping>> {
    let db = keycode_db()?;
    let mut seen = HashSet::new();
    let mut mappings = Vec::with_capacity(entries.len());

    for (key, action) in entries {
        let canonical = db.resolve(key)?;
        if !seen.insert(canonical.clone()) {
            bail!("Duplicate trigger key '{}' in mapping table", canonical);
        }
        mappings.push(build(key, action)?);
    }

    Ok(mappings)
}
