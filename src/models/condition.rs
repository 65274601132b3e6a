//! Condition predicates over process variables and the frontmost application.
//!
//! Conditions are descriptors: the external daemon evaluates them at match
//! time. The `evaluate` method mirrors the daemon's semantics so tests and
//! tooling can check rule behavior without a running daemon.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value of a daemon process variable.
///
/// The daemon stores variables as integers, booleans, or strings. A missing
/// variable is a distinct "unset" state, not `Int(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    /// Boolean variable value
    Bool(bool),
    /// Integer variable value (the common case: 0 = off, 1 = on)
    Int(i64),
    /// String variable value
    Str(String),
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Boolean predicate attached to a rule or a single manipulator.
///
/// A rule's condition list is a conjunction: every condition must hold for
/// the rule to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Holds when the named process variable equals the given value.
    /// A missing variable never equals anything, including `Int(0)`.
    VarEquals {
        /// Variable name
        name: String,
        /// Value to compare against
        value: VariableValue,
    },
    /// Holds when the frontmost application identifier matches the pattern.
    /// Patterns without explicit `^`/`$` anchors are matched against the
    /// full identifier; matching is case-insensitive.
    AppMatches {
        /// Regex pattern over the application bundle identifier/name
        pattern: String,
    },
    /// Inverts the inner condition.
    Not(Box<Condition>),
}

impl Condition {
    /// Creates a variable-equality condition.
    pub fn var_equals(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::VarEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates the "mode variable is on" condition used to gate mappings.
    pub fn var_is_on(name: impl Into<String>) -> Self {
        Self::var_equals(name, 1)
    }

    /// Creates a frontmost-application condition.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn app_matches(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        anchored_regex(&pattern)
            .with_context(|| format!("Invalid application pattern '{}'", pattern))?;
        Ok(Self::AppMatches { pattern })
    }

    /// Inverts this condition, collapsing double negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Validates the condition (regex well-formedness, recursively).
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::VarEquals { .. } => Ok(()),
            Self::AppMatches { pattern } => {
                anchored_regex(pattern)
                    .with_context(|| format!("Invalid application pattern '{}'", pattern))?;
                Ok(())
            }
            Self::Not(inner) => inner.validate(),
        }
    }

    /// Evaluates the condition against a snapshot of daemon state.
    ///
    /// Pure function mirroring the daemon's match-time semantics. A missing
    /// variable compares unequal to every value, and a missing frontmost
    /// application matches no pattern.
    #[must_use]
    pub fn evaluate(&self, state: &ProcessState) -> bool {
        match self {
            Self::VarEquals { name, value } => {
                state.variable(name).is_some_and(|current| current == value)
            }
            Self::AppMatches { pattern } => state.frontmost_app().is_some_and(|app| {
                // Pattern validated at construction; a malformed pattern
                // that bypassed the constructor matches nothing.
                anchored_regex(pattern).is_ok_and(|re| re.is_match(app))
            }),
            Self::Not(inner) => !inner.evaluate(state),
        }
    }
}

/// Compiles a pattern with full-string anchoring and case-insensitivity.
///
/// Patterns that already carry both anchors are used as written; anything
/// else is wrapped in `^(?:...)$` per the daemon's matching convention.
pub(crate) fn anchored_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let anchored = if pattern.starts_with('^') && pattern.ends_with('$') {
        format!("(?i){}", pattern)
    } else {
        format!("(?i)^(?:{})$", pattern)
    };
    Regex::new(&anchored)
}

/// Snapshot of the daemon's runtime state used to evaluate conditions.
#[derive(Debug, Clone, Default)]
pub struct ProcessState {
    variables: HashMap<String, VariableValue>,
    frontmost_app: Option<String>,
}

impl ProcessState {
    /// Creates an empty state: all variables unset, no frontmost app.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable to the given value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<VariableValue>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Removes a variable, returning it to the unset state.
    pub fn clear_variable(&mut self, name: &str) {
        self.variables.remove(name);
    }

    /// Gets the current value of a variable, if set.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&VariableValue> {
        self.variables.get(name)
    }

    /// Sets the frontmost application identifier.
    pub fn set_frontmost_app(&mut self, app: impl Into<String>) {
        self.frontmost_app = Some(app.into());
    }

    /// Gets the frontmost application identifier, if any.
    #[must_use]
    pub fn frontmost_app(&self) -> Option<&str> {
        self.frontmost_app.as_deref()
    }
}
