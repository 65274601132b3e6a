//! Modes: named, variable-gated sets of key mappings.
//!
//! A mode cycles between two states inside the daemon. Idle: the mode
//! variable is unset or 0, only trigger rules can fire. Active: the variable
//! holds 1, mapping rules fire, and an auto-exit mapping (or the escape key)
//! clears the variable and removes the hint notification again.

pub mod duo_layer;

pub use duo_layer::{DuoLayer, LayerHint, LeaderPolicy};

use crate::compiler::{CompilationContext, RuleGroup};
use crate::models::{Condition, FromEvent, Mapping, ToEvent};
use anyhow::Result;

/// Variable value while a mode is active.
pub const MODE_ON: i64 = 1;
/// Variable value after a mode exits.
pub const MODE_OFF: i64 = 0;

/// Key that exits any active mode.
pub(crate) const ESCAPE_KEY: &str = "escape";

/// Notification identifier derived from the mode name.
#[must_use]
pub fn notification_id(mode_name: &str) -> String {
    format!("{}-mode-notification", mode_name)
}

/// Actions that enter a mode: set its variable, then show the hint.
pub(crate) fn enter_actions(mode_name: &str, hint: Option<&str>) -> Vec<ToEvent> {
    let mut actions = vec![ToEvent::set_variable(mode_name, MODE_ON)];
    if let Some(hint) = hint {
        actions.push(ToEvent::show_notification(notification_id(mode_name), hint));
    }
    actions
}

/// Actions that exit a mode: clear its variable, then remove the hint.
pub(crate) fn exit_actions(mode_name: &str) -> Vec<ToEvent> {
    vec![
        ToEvent::set_variable(mode_name, MODE_OFF),
        ToEvent::remove_notification(notification_id(mode_name)),
    ]
}

/// Auto-exit ("one-shot") policy for a mode.
///
/// The redundant combination "wholly one-shot plus an explicit key set" is
/// unrepresentable: `Whole` already covers every mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OneShot {
    /// Mappings leave the mode active
    #[default]
    No,
    /// Every mapping exits the mode after firing
    Whole,
    /// Only mappings with these trigger events exit the mode
    Keys(Vec<FromEvent>),
}

/// Static configuration of a mode, validated once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    /// Process-unique name; doubles as the mode's variable name
    pub name: String,
    /// Human-readable description used in rule-group titles
    pub description: String,
    /// Optional hint shown as a notification while active
    pub hint: Option<String>,
    /// Conditions guarding the trigger rules
    pub trigger_conditions: Vec<Condition>,
    /// Conditions guarding the mapping rules (besides the variable gate)
    pub mapping_conditions: Vec<Condition>,
    /// Auto-exit policy
    pub one_shot: OneShot,
}

impl ModeConfig {
    /// Creates a configuration with the given name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            hint: None,
            trigger_conditions: Vec::new(),
            mapping_conditions: Vec::new(),
            one_shot: OneShot::No,
        }
    }

    /// Sets the hint notification text.
    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Adds a condition to the trigger rules.
    #[must_use]
    pub fn trigger_condition(mut self, condition: Condition) -> Self {
        self.trigger_conditions.push(condition);
        self
    }

    /// Adds a condition to the mapping rules.
    #[must_use]
    pub fn mapping_condition(mut self, condition: Condition) -> Self {
        self.mapping_conditions.push(condition);
        self
    }

    /// Makes every mapping auto-exit the mode.
    #[must_use]
    pub fn wholly_one_shot(mut self) -> Self {
        self.one_shot = OneShot::Whole;
        self
    }

    /// Marks the given trigger events as auto-exit keys.
    #[must_use]
    pub fn one_shot_keys(mut self, keys: Vec<FromEvent>) -> Self {
        self.one_shot = OneShot::Keys(keys);
        self
    }
}

/// A named, variable-gated set of key mappings.
///
/// Construction registers the mode's name in the [`CompilationContext`] so
/// the global escape rule can later clear it; a duplicate name is a fatal
/// configuration error. After construction the mode is only mutated through
/// [`add_trigger`](Self::add_trigger) and [`add_mapping`](Self::add_mapping);
/// compilation is a pure function of that state.
#[derive(Debug, Clone)]
pub struct Mode {
    config: ModeConfig,
    triggers: Vec<Mapping>,
    mappings: Vec<Mapping>,
}

impl Mode {
    /// Creates a mode and registers its name in the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered or the context is
    /// sealed.
    pub fn new(ctx: &mut CompilationContext, config: ModeConfig) -> Result<Self> {
        ctx.register_mode(&config.name)?;
        Ok(Self {
            config,
            triggers: Vec::new(),
            mappings: Vec::new(),
        })
    }

    /// The mode's name (and variable name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The mode's configuration.
    #[must_use]
    pub const fn config(&self) -> &ModeConfig {
        &self.config
    }

    /// Registered entry triggers.
    #[must_use]
    pub fn triggers(&self) -> &[Mapping] {
        &self.triggers
    }

    /// Registered key mappings.
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Registers an entry trigger. The enter side effects (set variable,
    /// show hint) are appended at compile time.
    pub fn add_trigger(&mut self, trigger: Mapping) -> &mut Self {
        self.triggers.push(trigger);
        self
    }

    /// Registers a key mapping interpreted only while the mode is active.
    pub fn add_mapping(&mut self, mapping: Mapping) -> &mut Self {
        self.mappings.push(mapping);
        self
    }

    /// Registers several mappings at once.
    pub fn add_mappings(&mut self, mappings: impl IntoIterator<Item = Mapping>) -> &mut Self {
        self.mappings.extend(mappings);
        self
    }

    /// Returns a copy of the mapping with this mode's exit side effects
    /// appended after its primary actions, gated on the mode being active.
    #[must_use]
    pub fn exit_mapping(&self, mapping: Mapping) -> Mapping {
        self.augment_exit(mapping)
            .when(Condition::var_is_on(&self.config.name))
    }

    fn augment_exit(&self, mut mapping: Mapping) -> Mapping {
        mapping.to.extend(exit_actions(&self.config.name));
        mapping
    }

    fn is_auto_exit(&self, mapping: &Mapping) -> bool {
        match &self.config.one_shot {
            OneShot::No => false,
            OneShot::Whole => true,
            OneShot::Keys(keys) => keys.contains(&mapping.from),
        }
    }

    /// Compiles the mode into its three rule groups, in fixed order:
    /// triggers, key assignments, escape.
    ///
    /// Pure function of the mode's state: compiling twice yields identical
    /// output and never duplicates rules.
    #[must_use]
    pub fn compile(&self) -> Vec<RuleGroup> {
        let name = &self.config.name;

        if self.triggers.is_empty() {
            tracing::warn!(mode = %name, "mode has no triggers and can never activate");
        }

        let triggers = self
            .triggers
            .iter()
            .map(|trigger| {
                let mut trigger = trigger.clone();
                trigger
                    .to
                    .extend(enter_actions(name, self.config.hint.as_deref()));
                trigger
            })
            .collect();

        let mappings = self
            .mappings
            .iter()
            .map(|mapping| {
                if self.is_auto_exit(mapping) {
                    self.augment_exit(mapping.clone())
                } else {
                    mapping.clone()
                }
            })
            .collect();

        let mut mapping_conditions = vec![Condition::var_is_on(name)];
        mapping_conditions.extend(self.config.mapping_conditions.iter().cloned());

        let escape = self.augment_exit(
            Mapping::from_event(FromEvent::Key {
                key: ESCAPE_KEY.to_string(),
                modifiers: Vec::new(),
            })
            .to(ToEvent::Key {
                key: ESCAPE_KEY.to_string(),
                modifiers: Vec::new(),
            }),
        );

        vec![
            RuleGroup {
                description: format!("{}: {}", name, self.config.description),
                conditions: self.config.trigger_conditions.clone(),
                manipulators: triggers,
            },
            RuleGroup {
                description: format!("Key assignments for {}", name),
                conditions: mapping_conditions,
                manipulators: mappings,
            },
            RuleGroup {
                description: format!("Escape {}", name),
                conditions: vec![Condition::var_is_on(name)],
                manipulators: vec![escape],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessState;

    fn launcher_mode(ctx: &mut CompilationContext) -> Mode {
        let mut mode = Mode::new(
            ctx,
            ModeConfig::new("launcher", "Start programs").hint("t=ITerm f=Firefox"),
        )
        .unwrap();
        mode.add_trigger(Mapping::simultaneous(["a", "l"]).unwrap());
        mode.add_mapping(Mapping::from_key("t").unwrap().to_app("ITerm"));
        mode
    }

    #[test]
    fn test_compile_emits_three_groups_in_order() {
        let mut ctx = CompilationContext::new();
        let groups = launcher_mode(&mut ctx).compile();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].description, "launcher: Start programs");
        assert_eq!(groups[1].description, "Key assignments for launcher");
        assert_eq!(groups[2].description, "Escape launcher");
    }

    #[test]
    fn test_trigger_sets_variable_then_hint() {
        let mut ctx = CompilationContext::new();
        let groups = launcher_mode(&mut ctx).compile();

        let trigger = &groups[0].manipulators[0];
        assert_eq!(
            trigger.to,
            vec![
                ToEvent::set_variable("launcher", MODE_ON),
                ToEvent::show_notification("launcher-mode-notification", "t=ITerm f=Firefox"),
            ]
        );
    }

    #[test]
    fn test_mapping_group_gated_on_variable() {
        let mut ctx = CompilationContext::new();
        let groups = launcher_mode(&mut ctx).compile();

        let gate = &groups[1].conditions[0];
        assert_eq!(gate, &Condition::var_is_on("launcher"));

        // Idle inertness: the gate is false while the variable is unset or 0
        let mut state = ProcessState::new();
        assert!(!gate.evaluate(&state));
        state.set_variable("launcher", MODE_OFF);
        assert!(!gate.evaluate(&state));
        state.set_variable("launcher", MODE_ON);
        assert!(gate.evaluate(&state));
    }

    #[test]
    fn test_ordinary_mapping_keeps_mode_active() {
        let mut ctx = CompilationContext::new();
        let groups = launcher_mode(&mut ctx).compile();

        let mapping = &groups[1].manipulators[0];
        assert_eq!(mapping.to, vec![ToEvent::app("ITerm")]);
    }

    #[test]
    fn test_wholly_one_shot_appends_exit_to_every_mapping() {
        let mut ctx = CompilationContext::new();
        let mut mode = Mode::new(
            &mut ctx,
            ModeConfig::new("launcher", "Start programs").wholly_one_shot(),
        )
        .unwrap();
        mode.add_mapping(Mapping::from_key("t").unwrap().to_app("ITerm"));
        mode.add_mapping(Mapping::from_key("f").unwrap().to_app("Firefox"));

        let groups = mode.compile();
        for mapping in &groups[1].manipulators {
            let n = mapping.to.len();
            assert_eq!(mapping.to[n - 2], ToEvent::set_variable("launcher", MODE_OFF));
            assert_eq!(
                mapping.to[n - 1],
                ToEvent::remove_notification("launcher-mode-notification")
            );
        }
    }

    #[test]
    fn test_one_shot_keys_only_exit_listed_triggers() {
        let mut ctx = CompilationContext::new();
        let exit_key = FromEvent::key("t").unwrap();
        let mut mode = Mode::new(
            &mut ctx,
            ModeConfig::new("nav", "Navigation").one_shot_keys(vec![exit_key]),
        )
        .unwrap();
        mode.add_mapping(Mapping::from_key("t").unwrap().to_app("ITerm"));
        mode.add_mapping(Mapping::from_key("j").unwrap().to_key("down_arrow").unwrap());

        let groups = mode.compile();
        assert_eq!(groups[1].manipulators[0].to.len(), 3);
        assert_eq!(groups[1].manipulators[1].to.len(), 1);
    }

    #[test]
    fn test_escape_group_passes_escape_through_before_clearing() {
        let mut ctx = CompilationContext::new();
        let groups = launcher_mode(&mut ctx).compile();

        let escape = &groups[2].manipulators[0];
        assert_eq!(escape.to.len(), 3);
        assert_eq!(
            escape.to[0],
            ToEvent::Key {
                key: "escape".to_string(),
                modifiers: vec![],
            }
        );
        assert_eq!(escape.to[1], ToEvent::set_variable("launcher", MODE_OFF));
        assert_eq!(groups[2].conditions, vec![Condition::var_is_on("launcher")]);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let mut ctx = CompilationContext::new();
        let mode = launcher_mode(&mut ctx);
        assert_eq!(mode.compile(), mode.compile());
    }

    #[test]
    fn test_exit_mapping_helper() {
        let mut ctx = CompilationContext::new();
        let mode = launcher_mode(&mut ctx);

        let exit = mode.exit_mapping(Mapping::from_key("q").unwrap());
        assert_eq!(exit.to.len(), 2);
        assert_eq!(exit.conditions, vec![Condition::var_is_on("launcher")]);
    }
}
