//! Event descriptors: the vocabulary of trigger ("from") and action ("to")
//! events.
//!
//! All types are immutable values with structural equality. Shell commands
//! are opaque leaf actions and pass through compilation unmodified.

use crate::keycode_db::keycode_db;
use crate::models::condition::VariableValue;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Keyboard modifier, serialized with the daemon's snake_case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Left control key
    LeftControl,
    /// Left shift key
    LeftShift,
    /// Left option/alt key
    LeftOption,
    /// Left command key
    LeftCommand,
    /// Right control key
    RightControl,
    /// Right shift key
    RightShift,
    /// Right option/alt key
    RightOption,
    /// Right command key
    RightCommand,
    /// Either control key
    Control,
    /// Either shift key
    Shift,
    /// Either option/alt key
    Option,
    /// Either command key
    Command,
    /// The fn key
    Fn,
    /// Wildcard: any modifier may be held
    Any,
}

/// The hyper chord: all four left-hand modifiers held together.
#[must_use]
pub const fn hyper_modifiers() -> [Modifier; 4] {
    [
        Modifier::LeftControl,
        Modifier::LeftOption,
        Modifier::LeftShift,
        Modifier::LeftCommand,
    ]
}

/// Trigger event: a single physical key (with mandatory modifiers) or a
/// simultaneous multi-key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromEvent {
    /// A single physical key, optionally requiring held modifiers
    Key {
        /// Canonical key code name
        key: String,
        /// Modifiers that must be held
        modifiers: Vec<Modifier>,
    },
    /// Two or more keys pressed simultaneously
    Simultaneous {
        /// Canonical key code names, in the declared order
        keys: Vec<String>,
    },
}

impl FromEvent {
    /// Creates a single-key trigger, resolving aliases like `";"`.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed key identifier.
    pub fn key(key: &str) -> Result<Self> {
        Ok(Self::Key {
            key: keycode_db()?.resolve(key)?,
            modifiers: Vec::new(),
        })
    }

    /// Creates a single-key trigger with mandatory modifiers.
    pub fn key_with_modifiers(key: &str, modifiers: impl Into<Vec<Modifier>>) -> Result<Self> {
        Ok(Self::Key {
            key: keycode_db()?.resolve(key)?,
            modifiers: modifiers.into(),
        })
    }

    /// Creates a simultaneous trigger from two or more distinct keys.
    pub fn simultaneous<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let db = keycode_db()?;
        let keys = keys
            .into_iter()
            .map(|k| db.resolve(k))
            .collect::<Result<Vec<_>>>()?;
        if keys.len() < 2 {
            bail!("Simultaneous trigger requires at least two keys, got {}", keys.len());
        }
        for (idx, key) in keys.iter().enumerate() {
            if keys[..idx].contains(key) {
                bail!("Simultaneous trigger repeats key '{}'", key);
            }
        }
        Ok(Self::Simultaneous { keys })
    }

    /// Keys participating in this trigger, in order.
    #[must_use]
    pub fn trigger_keys(&self) -> &[String] {
        match self {
            Self::Key { key, .. } => std::slice::from_ref(key),
            Self::Simultaneous { keys } => keys,
        }
    }

    /// Short human-readable form, used for auto-generated hints.
    #[must_use]
    pub fn display(&self) -> String {
        self.trigger_keys().join("+")
    }
}

/// Creates a hyper-chord trigger: the key plus ⌃⌥⇧⌘ held.
pub fn hyper(key: &str) -> Result<FromEvent> {
    FromEvent::key_with_modifiers(key, hyper_modifiers().to_vec())
}

/// Action event executed by the daemon, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToEvent {
    /// Emit a key press, optionally with modifiers
    Key {
        /// Canonical key code name
        key: String,
        /// Modifiers applied to the emitted key
        modifiers: Vec<Modifier>,
    },
    /// Run an opaque shell command
    Shell {
        /// The command line, passed through unmodified
        command: String,
    },
    /// Set a process variable
    SetVariable {
        /// Variable name
        name: String,
        /// New value
        value: VariableValue,
    },
    /// Show or remove a named on-screen notification.
    /// Empty text removes the notification.
    Notification {
        /// Stable notification identifier
        id: String,
        /// Text to display; empty removes the notification
        text: String,
    },
}

impl ToEvent {
    /// Creates a key action, resolving aliases.
    pub fn key(key: &str) -> Result<Self> {
        Ok(Self::Key {
            key: keycode_db()?.resolve(key)?,
            modifiers: Vec::new(),
        })
    }

    /// Creates a key action with modifiers.
    pub fn key_with_modifiers(key: &str, modifiers: impl Into<Vec<Modifier>>) -> Result<Self> {
        Ok(Self::Key {
            key: keycode_db()?.resolve(key)?,
            modifiers: modifiers.into(),
        })
    }

    /// Creates a shifted key action (the common symbol-layer case).
    pub fn shifted(key: &str) -> Result<Self> {
        Self::key_with_modifiers(key, vec![Modifier::LeftShift])
    }

    /// Creates an opaque shell-command action.
    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell {
            command: command.into(),
        }
    }

    /// Creates a shell action that brings an application to the front.
    pub fn app(name: &str) -> Self {
        Self::shell(format!("open -a '{}'", name))
    }

    /// Creates a set-variable action.
    pub fn set_variable(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self::SetVariable {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a show-notification action.
    pub fn show_notification(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Notification {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Creates a remove-notification action.
    pub fn remove_notification(id: impl Into<String>) -> Self {
        Self::Notification {
            id: id.into(),
            text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_resolves_alias() {
        let event = FromEvent::key(";").unwrap();
        assert_eq!(
            event,
            FromEvent::Key {
                key: "semicolon".to_string(),
                modifiers: vec![],
            }
        );
    }

    #[test]
    fn test_simultaneous_requires_two_distinct_keys() {
        assert!(FromEvent::simultaneous(["a"]).is_err());
        assert!(FromEvent::simultaneous(["a", "a"]).is_err());

        let event = FromEvent::simultaneous(["a", "l"]).unwrap();
        assert_eq!(event.trigger_keys(), ["a", "l"]);
        assert_eq!(event.display(), "a+l");
    }

    #[test]
    fn test_hyper_chord() {
        let event = hyper("w").unwrap();
        let FromEvent::Key { key, modifiers } = event else {
            panic!("expected single-key event");
        };
        assert_eq!(key, "w");
        assert_eq!(modifiers, hyper_modifiers().to_vec());
    }

    #[test]
    fn test_shell_command_is_opaque() {
        let cmd = r#"/bin/zsh -c "~/.local/bin/keybindstate switch 'Firefox'""#;
        let event = ToEvent::shell(cmd);
        assert_eq!(
            event,
            ToEvent::Shell {
                command: cmd.to_string()
            }
        );
    }

    #[test]
    fn test_app_action() {
        assert_eq!(
            ToEvent::app("ITerm"),
            ToEvent::Shell {
                command: "open -a 'ITerm'".to_string()
            }
        );
    }

    #[test]
    fn test_notification_remove_has_empty_text() {
        let remove = ToEvent::remove_notification("launcher-mode-notification");
        let ToEvent::Notification { text, .. } = &remove else {
            panic!("expected notification event");
        };
        assert!(text.is_empty());
    }
}
