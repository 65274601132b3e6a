//! Serde descriptors for the daemon's rule-group schema.
//!
//! Field names and nesting are the bit-exact contract the daemon's config
//! loader expects; the external profile writer serializes these verbatim.

use crate::compiler::RuleGroup;
use crate::models::mapping::ManipulatorParameters;
use crate::models::{Condition, FromEvent, Mapping, Modifier, ToEvent, VariableValue};
use serde::{Deserialize, Serialize};

/// One rule group: `{description, conditions?, manipulators}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleGroupDescriptor {
    /// Rule title
    pub description: String,
    /// Group-level conditions (omitted when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionDescriptor>,
    /// Manipulators in emission order
    pub manipulators: Vec<ManipulatorDescriptor>,
}

/// One manipulator: trigger, ordered action lists, conditions, parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManipulatorDescriptor {
    /// Manipulator type; the daemon only understands `"basic"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Trigger event
    pub from: FromDescriptor,
    /// Primary action list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<ToDescriptor>,
    /// Pressed-alone action list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_if_alone: Vec<ToDescriptor>,
    /// Held-down action list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_if_held_down: Vec<ToDescriptor>,
    /// After-release action list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_after_key_up: Vec<ToDescriptor>,
    /// Manipulator-level conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionDescriptor>,
    /// Timing parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ParametersDescriptor>,
}

/// Trigger descriptor: single key or simultaneous press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromDescriptor {
    /// Key code for a single-key trigger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<String>,
    /// Simultaneous key list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simultaneous: Option<Vec<SimultaneousKey>>,
    /// Mandatory modifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<FromModifiers>,
}

/// One key of a simultaneous trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimultaneousKey {
    /// Key code
    pub key_code: String,
}

/// Modifier requirements on a trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromModifiers {
    /// Modifiers that must be held
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mandatory: Vec<Modifier>,
}

/// Action descriptor; exactly one of the payload fields is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToDescriptor {
    /// Emit a key press
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<String>,
    /// Modifiers applied to the emitted key
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,
    /// Run a shell command, passed through unmodified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command: Option<String>,
    /// Set a process variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_variable: Option<SetVariableDescriptor>,
    /// Show (non-empty text) or remove (empty text) a notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_notification_message: Option<NotificationDescriptor>,
}

/// Set-variable payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetVariableDescriptor {
    /// Variable name
    pub name: String,
    /// New value
    pub value: VariableValue,
}

/// Notification payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDescriptor {
    /// Stable notification identifier
    pub id: String,
    /// Text to display; empty removes the notification
    pub text: String,
}

/// Per-manipulator timing parameters, with the daemon's dotted key names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParametersDescriptor {
    /// Pressed-alone timeout
    #[serde(
        rename = "basic.to_if_alone_timeout_milliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_alone_timeout_milliseconds: Option<u32>,
    /// Held-down threshold
    #[serde(
        rename = "basic.to_if_held_down_threshold_milliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_held_down_threshold_milliseconds: Option<u32>,
}

/// Condition descriptor: `{type, name?, value?, bundle_identifiers?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDescriptor {
    /// Condition type (`variable_if`, `variable_unless`,
    /// `frontmost_application_if`, `frontmost_application_unless`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Variable name, for variable conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Variable value, for variable conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VariableValue>,
    /// Application patterns, for frontmost-application conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_identifiers: Option<Vec<String>>,
}

fn condition_descriptor(condition: &Condition, negated: bool) -> ConditionDescriptor {
    match condition {
        Condition::VarEquals { name, value } => ConditionDescriptor {
            kind: if negated { "variable_unless" } else { "variable_if" }.to_string(),
            name: Some(name.clone()),
            value: Some(value.clone()),
            bundle_identifiers: None,
        },
        Condition::AppMatches { pattern } => ConditionDescriptor {
            kind: if negated {
                "frontmost_application_unless"
            } else {
                "frontmost_application_if"
            }
            .to_string(),
            name: None,
            value: None,
            bundle_identifiers: Some(vec![pattern.clone()]),
        },
        Condition::Not(inner) => condition_descriptor(inner, !negated),
    }
}

impl From<&Condition> for ConditionDescriptor {
    fn from(condition: &Condition) -> Self {
        condition_descriptor(condition, false)
    }
}

impl From<&FromEvent> for FromDescriptor {
    fn from(event: &FromEvent) -> Self {
        match event {
            FromEvent::Key { key, modifiers } => Self {
                key_code: Some(key.clone()),
                simultaneous: None,
                modifiers: if modifiers.is_empty() {
                    None
                } else {
                    Some(FromModifiers {
                        mandatory: modifiers.clone(),
                    })
                },
            },
            FromEvent::Simultaneous { keys } => Self {
                key_code: None,
                simultaneous: Some(
                    keys.iter()
                        .map(|key| SimultaneousKey {
                            key_code: key.clone(),
                        })
                        .collect(),
                ),
                modifiers: None,
            },
        }
    }
}

impl From<&ToEvent> for ToDescriptor {
    fn from(event: &ToEvent) -> Self {
        let mut descriptor = Self {
            key_code: None,
            modifiers: Vec::new(),
            shell_command: None,
            set_variable: None,
            set_notification_message: None,
        };
        match event {
            ToEvent::Key { key, modifiers } => {
                descriptor.key_code = Some(key.clone());
                descriptor.modifiers = modifiers.clone();
            }
            ToEvent::Shell { command } => descriptor.shell_command = Some(command.clone()),
            ToEvent::SetVariable { name, value } => {
                descriptor.set_variable = Some(SetVariableDescriptor {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
            ToEvent::Notification { id, text } => {
                descriptor.set_notification_message = Some(NotificationDescriptor {
                    id: id.clone(),
                    text: text.clone(),
                });
            }
        }
        descriptor
    }
}

impl From<&ManipulatorParameters> for ParametersDescriptor {
    fn from(parameters: &ManipulatorParameters) -> Self {
        Self {
            to_if_alone_timeout_milliseconds: parameters.to_if_alone_timeout_ms,
            to_if_held_down_threshold_milliseconds: parameters.to_if_held_down_threshold_ms,
        }
    }
}

impl From<&Mapping> for ManipulatorDescriptor {
    fn from(mapping: &Mapping) -> Self {
        Self {
            kind: "basic".to_string(),
            from: (&mapping.from).into(),
            to: mapping.to.iter().map(Into::into).collect(),
            to_if_alone: mapping.to_if_alone.iter().map(Into::into).collect(),
            to_if_held_down: mapping.to_if_held_down.iter().map(Into::into).collect(),
            to_after_key_up: mapping.to_after_key_up.iter().map(Into::into).collect(),
            conditions: mapping.conditions.iter().map(Into::into).collect(),
            parameters: if mapping.parameters.is_empty() {
                None
            } else {
                Some((&mapping.parameters).into())
            },
        }
    }
}

impl From<&RuleGroup> for RuleGroupDescriptor {
    fn from(group: &RuleGroup) -> Self {
        Self {
            description: group.description.clone(),
            conditions: group.conditions.iter().map(Into::into).collect(),
            manipulators: group.manipulators.iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_polarity() {
        let cond = Condition::var_is_on("nav");
        let descriptor: ConditionDescriptor = (&cond).into();
        assert_eq!(descriptor.kind, "variable_if");

        let negated: ConditionDescriptor = (&cond.negate()).into();
        assert_eq!(negated.kind, "variable_unless");
    }

    #[test]
    fn test_app_condition_polarity() {
        let cond = Condition::app_matches("^.*iterm2.*$").unwrap();
        let descriptor: ConditionDescriptor = (&cond.clone().negate()).into();
        assert_eq!(descriptor.kind, "frontmost_application_unless");
        assert_eq!(
            descriptor.bundle_identifiers,
            Some(vec!["^.*iterm2.*$".to_string()])
        );
    }

    #[test]
    fn test_from_descriptor_serialization() {
        let event = FromEvent::Simultaneous {
            keys: vec!["a".to_string(), "l".to_string()],
        };
        let descriptor: FromDescriptor = (&event).into();
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"simultaneous": [{"key_code": "a"}, {"key_code": "l"}]})
        );
    }

    #[test]
    fn test_to_descriptor_variants() {
        let set = ToEvent::set_variable("launcher", 0);
        assert_eq!(
            serde_json::to_value(ToDescriptor::from(&set)).unwrap(),
            json!({"set_variable": {"name": "launcher", "value": 0}})
        );

        let shell = ToEvent::shell("open -a 'ITerm'");
        assert_eq!(
            serde_json::to_value(ToDescriptor::from(&shell)).unwrap(),
            json!({"shell_command": "open -a 'ITerm'"})
        );

        let remove = ToEvent::remove_notification("launcher-mode-notification");
        assert_eq!(
            serde_json::to_value(ToDescriptor::from(&remove)).unwrap(),
            json!({"set_notification_message": {"id": "launcher-mode-notification", "text": ""}})
        );
    }

    #[test]
    fn test_manipulator_parameters_dotted_names() {
        let mapping = Mapping::from_key("left_shift")
            .unwrap()
            .to_if_alone_key("escape")
            .unwrap()
            .held_down_threshold(60);
        let descriptor = ManipulatorDescriptor::from(&mapping);
        let value = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(value["type"], "basic");
        assert_eq!(
            value["parameters"]["basic.to_if_held_down_threshold_milliseconds"],
            60
        );
        assert!(value.get("to").is_none());
    }

    #[test]
    fn test_modifiers_serialize_snake_case() {
        let event = ToEvent::key_with_modifiers("t", vec![Modifier::LeftCommand]).unwrap();
        assert_eq!(
            serde_json::to_value(ToDescriptor::from(&event)).unwrap(),
            json!({"key_code": "t", "modifiers": ["left_command"]})
        );
    }
}
