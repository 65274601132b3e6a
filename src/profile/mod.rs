//! The compiled rule set and its JSON rendering.
//!
//! The external profile writer consumes [`CompiledRuleSet`]; this crate
//! renders the daemon schema but never touches the daemon's config file.

pub mod schema;

use crate::compiler::RuleGroup;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use schema::{
    ConditionDescriptor, FromDescriptor, ManipulatorDescriptor, RuleGroupDescriptor, ToDescriptor,
};

/// Profile-level default timing parameters, with the daemon's dotted key
/// names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileParameters {
    /// Default pressed-alone timeout
    #[serde(
        rename = "basic.to_if_alone_timeout_milliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_alone_timeout_ms: Option<u32>,
    /// Default held-down threshold
    #[serde(
        rename = "basic.to_if_held_down_threshold_milliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_held_down_threshold_ms: Option<u32>,
    /// Simultaneous-press detection window
    #[serde(
        rename = "basic.simultaneous_threshold_milliseconds",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub simultaneous_threshold_ms: Option<u32>,
}

impl ProfileParameters {
    /// Returns true if no parameter is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to_if_alone_timeout_ms.is_none()
            && self.to_if_held_down_threshold_ms.is_none()
            && self.simultaneous_threshold_ms.is_none()
    }
}

/// Final output of a compilation run: the ordered rule groups plus optional
/// profile-level parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRuleSet {
    /// Rule groups in emission order; the escape-all group is last
    pub groups: Vec<RuleGroup>,
    /// Profile-level default parameters
    pub parameters: ProfileParameters,
}

impl CompiledRuleSet {
    /// Wraps compiled rule groups with default parameters.
    #[must_use]
    pub const fn new(groups: Vec<RuleGroup>) -> Self {
        Self {
            groups,
            parameters: ProfileParameters {
                to_if_alone_timeout_ms: None,
                to_if_held_down_threshold_ms: None,
                simultaneous_threshold_ms: None,
            },
        }
    }

    /// Sets the profile-level parameters.
    #[must_use]
    pub const fn with_parameters(mut self, parameters: ProfileParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// The daemon-schema descriptors for every rule group, in order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<RuleGroupDescriptor> {
        self.groups.iter().map(Into::into).collect()
    }

    /// Renders the rule set as a JSON value:
    /// `{"parameters"?: {...}, "rules": [...]}`.
    pub fn to_value(&self) -> Result<Value> {
        let rules =
            serde_json::to_value(self.descriptors()).context("Failed to serialize rule groups")?;
        let mut object = serde_json::Map::new();
        if !self.parameters.is_empty() {
            object.insert(
                "parameters".to_string(),
                serde_json::to_value(self.parameters)
                    .context("Failed to serialize profile parameters")?,
            );
        }
        object.insert("rules".to_string(), rules);
        Ok(Value::Object(object))
    }

    /// Renders the rule set as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        let value = self.to_value()?;
        serde_json::to_string_pretty(&value).context("Failed to render rule set as JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, Mapping};
    use serde_json::json;

    fn sample_group() -> RuleGroup {
        RuleGroup {
            description: "Tap shift for Escape".to_string(),
            conditions: vec![Condition::var_is_on("nav")],
            manipulators: vec![Mapping::from_key("left_shift")
                .unwrap()
                .to_if_alone_key("escape")
                .unwrap()],
        }
    }

    #[test]
    fn test_to_value_shape() {
        let set = CompiledRuleSet::new(vec![sample_group()]);
        let value = set.to_value().unwrap();

        assert!(value.get("parameters").is_none());
        assert_eq!(value["rules"][0]["description"], "Tap shift for Escape");
        assert_eq!(
            value["rules"][0]["conditions"][0],
            json!({"type": "variable_if", "name": "nav", "value": 1})
        );
    }

    #[test]
    fn test_profile_parameters_emitted_with_dotted_names() {
        let set = CompiledRuleSet::new(vec![sample_group()]).with_parameters(ProfileParameters {
            to_if_held_down_threshold_ms: Some(110),
            ..ProfileParameters::default()
        });
        let value = set.to_value().unwrap();
        assert_eq!(
            value["parameters"],
            json!({"basic.to_if_held_down_threshold_milliseconds": 110})
        );
    }

    #[test]
    fn test_to_json_round_trips_descriptors() {
        let set = CompiledRuleSet::new(vec![sample_group()]);
        let text = set.to_json().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, set.to_value().unwrap());
    }
}
