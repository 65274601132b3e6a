//! Pre-compilation validation of the declared configuration.
//!
//! Runs before any rule group is emitted so a broken configuration never
//! produces partial output. A partially-correct remapping profile would load
//! cleanly and then misbehave, which is worse than failing here.

use crate::compiler::RuleSource;
use crate::models::{Condition, FromEvent, Mapping};
use std::collections::HashMap;
use std::fmt;

/// Validation result with specific errors and warnings.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Critical errors that abort compilation
    pub errors: Vec<ValidationError>,
    /// Non-critical warnings
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Creates a new empty validation report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if there are no errors (warnings are allowed).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Formats the report as a user-facing message.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = String::new();

        for (idx, error) in self.errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", idx + 1, error));
        }
        for warning in &self.warnings {
            message.push_str(&format!("  warning: {}\n", warning));
        }

        message
    }
}

/// Kind of validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two different modes register simultaneous triggers sharing a key
    OverlappingTrigger,
    /// A condition carries a malformed regex
    InvalidCondition,
}

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Type of validation error
    pub kind: ValidationErrorKind,
    /// Human-readable error message naming the offending mode/mapping
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Non-critical validation warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Human-readable warning message
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Validates the full set of rule sources.
///
/// Checks, per the compilation contract:
/// - simultaneous triggers of two *different* modes must not share a key
///   (the daemon resolves such overlap by match order, which is fragile);
///   overlap within one mode is legal and common (two entry chords).
/// - every condition must be well-formed.
/// - a mode with no triggers is inert; that is legal mid-configuration, so
///   it warns rather than errors.
#[must_use]
pub fn validate(sources: &[RuleSource]) -> ValidationReport {
    let mut report = ValidationReport::new();

    check_overlapping_triggers(sources, &mut report);
    check_conditions(sources, &mut report);
    check_inert_modes(sources, &mut report);

    report
}

fn simultaneous_triggers(source: &RuleSource) -> Option<(String, Vec<Vec<String>>)> {
    match source {
        RuleSource::Mode(mode) => {
            let sets: Vec<Vec<String>> = mode
                .triggers()
                .iter()
                .filter_map(|t| match &t.from {
                    FromEvent::Simultaneous { keys } => Some(keys.clone()),
                    FromEvent::Key { .. } => None,
                })
                .collect();
            Some((mode.name().to_string(), sets))
        }
        RuleSource::DuoLayer(layer) => {
            let (k1, k2) = layer.key_pair();
            Some((
                layer.name().to_string(),
                vec![vec![k1.to_string(), k2.to_string()]],
            ))
        }
        RuleSource::Group(_) => None,
    }
}

fn check_overlapping_triggers(sources: &[RuleSource], report: &mut ValidationReport) {
    // key -> first owning mode
    let mut owners: HashMap<String, String> = HashMap::new();

    for source in sources {
        let Some((owner, sets)) = simultaneous_triggers(source) else {
            continue;
        };
        for keys in sets {
            for key in keys {
                match owners.get(&key) {
                    Some(existing) if existing != &owner => {
                        report.add_error(ValidationError::new(
                            ValidationErrorKind::OverlappingTrigger,
                            format!(
                                "Simultaneous triggers of '{}' and '{}' both use key '{}'",
                                existing, owner, key
                            ),
                        ));
                    }
                    _ => {
                        owners.insert(key, owner.clone());
                    }
                }
            }
        }
    }
}

fn mapping_conditions(mappings: &[Mapping]) -> impl Iterator<Item = &Condition> {
    mappings.iter().flat_map(|m| m.conditions.iter())
}

fn check_conditions(sources: &[RuleSource], report: &mut ValidationReport) {
    for source in sources {
        let (owner, conditions): (&str, Vec<&Condition>) = match source {
            RuleSource::Mode(mode) => (
                mode.name(),
                mode.config()
                    .trigger_conditions
                    .iter()
                    .chain(mode.config().mapping_conditions.iter())
                    .chain(mapping_conditions(mode.triggers()))
                    .chain(mapping_conditions(mode.mappings()))
                    .collect(),
            ),
            RuleSource::DuoLayer(layer) => (
                layer.name(),
                layer
                    .conditions()
                    .iter()
                    .chain(mapping_conditions(layer.mappings()))
                    .collect(),
            ),
            RuleSource::Group(group) => (
                group.description.as_str(),
                group
                    .conditions
                    .iter()
                    .chain(mapping_conditions(&group.manipulators))
                    .collect(),
            ),
        };

        for condition in conditions {
            if let Err(err) = condition.validate() {
                report.add_error(ValidationError::new(
                    ValidationErrorKind::InvalidCondition,
                    format!("{}: {:#}", owner, err),
                ));
            }
        }
    }
}

fn check_inert_modes(sources: &[RuleSource], report: &mut ValidationReport) {
    for source in sources {
        if let RuleSource::Mode(mode) = source {
            if mode.triggers().is_empty() {
                report.add_warning(ValidationWarning {
                    message: format!("Mode '{}' has no triggers and can never activate", mode.name()),
                });
            }
        }
    }
}
