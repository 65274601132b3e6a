//! Duo layers: modes triggered by a simultaneous two-key press.
//!
//! A duo layer is a specialization of [`Mode`](super::Mode): the trigger is
//! structurally a simultaneous pair instead of an arbitrary mapping list,
//! and the exit policy is either "leader" (the next key fires once and the
//! layer deactivates) or "sticky" (the layer persists until one of an
//! explicit escape-key set fires).

use crate::compiler::{CompilationContext, RuleGroup};
use crate::keycode_db::keycode_db;
use crate::mode::{enter_actions, exit_actions, ESCAPE_KEY};
use crate::models::{Condition, FromEvent, Mapping, ToEvent};
use anyhow::Result;

/// Exit policy of a duo layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeaderPolicy {
    /// The next single key fires its mapping and exits the layer,
    /// regardless of which mapping it was
    #[default]
    Leader,
    /// The layer persists until a key of the escape set fires
    Sticky {
        /// Canonical key names that exit the layer
        escape_keys: Vec<String>,
    },
}

/// Notification policy of a duo layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LayerHint {
    /// No notification
    Off,
    /// Auto-generated hint listing the mapped keys
    #[default]
    Auto,
    /// Explicit hint text
    Text(String),
}

/// A mode keyed by a simultaneous two-key press.
///
/// The variable name defaults to `duo-layer-<k1>-<k2>` and registers in the
/// same context registry as ordinary modes, so the global escape rule clears
/// duo layers too.
#[derive(Debug, Clone)]
pub struct DuoLayer {
    name: String,
    keys: (String, String),
    policy: LeaderPolicy,
    hint: LayerHint,
    conditions: Vec<Condition>,
    mappings: Vec<Mapping>,
}

impl DuoLayer {
    /// Creates a duo layer with the derived variable name
    /// `duo-layer-<k1>-<k2>` and registers it in the context.
    pub fn new(ctx: &mut CompilationContext, key1: &str, key2: &str) -> Result<Self> {
        let db = keycode_db()?;
        let (key1, key2) = (db.resolve(key1)?, db.resolve(key2)?);
        let name = format!("duo-layer-{}-{}", key1, key2);
        Self::build(ctx, key1, key2, name)
    }

    /// Creates a duo layer with an explicit variable name.
    pub fn named(
        ctx: &mut CompilationContext,
        key1: &str,
        key2: &str,
        name: impl Into<String>,
    ) -> Result<Self> {
        let db = keycode_db()?;
        let (key1, key2) = (db.resolve(key1)?, db.resolve(key2)?);
        Self::build(ctx, key1, key2, name.into())
    }

    fn build(
        ctx: &mut CompilationContext,
        key1: String,
        key2: String,
        name: String,
    ) -> Result<Self> {
        // Validates the pair (two distinct keys) before touching the registry
        FromEvent::simultaneous([key1.as_str(), key2.as_str()])?;
        ctx.register_mode(&name)?;
        Ok(Self {
            name,
            keys: (key1, key2),
            policy: LeaderPolicy::default(),
            hint: LayerHint::default(),
            conditions: Vec::new(),
            mappings: Vec::new(),
        })
    }

    /// The layer's variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The simultaneous key pair.
    #[must_use]
    pub fn key_pair(&self) -> (&str, &str) {
        (&self.keys.0, &self.keys.1)
    }

    /// Registered key mappings.
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Conditions applied to the trigger and mapping rules.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Selects leader policy (the default): auto-exit after one key.
    #[must_use]
    pub fn leader(mut self) -> Self {
        self.policy = LeaderPolicy::Leader;
        self
    }

    /// Selects sticky policy with the given escape-key set.
    pub fn sticky<'a>(mut self, escape_keys: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let db = keycode_db()?;
        let escape_keys = escape_keys
            .into_iter()
            .map(|k| db.resolve(k))
            .collect::<Result<Vec<_>>>()?;
        self.policy = LeaderPolicy::Sticky { escape_keys };
        Ok(self)
    }

    /// Sets the notification policy.
    #[must_use]
    pub fn notification(mut self, hint: LayerHint) -> Self {
        self.hint = hint;
        self
    }

    /// Adds a condition applied to the trigger and mapping rules alike.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Registers a key mapping interpreted only while the layer is active.
    pub fn add_mapping(&mut self, mapping: Mapping) -> &mut Self {
        self.mappings.push(mapping);
        self
    }

    /// Registers several mappings at once.
    pub fn add_mappings(&mut self, mappings: impl IntoIterator<Item = Mapping>) -> &mut Self {
        self.mappings.extend(mappings);
        self
    }

    /// Consuming form of [`add_mappings`](Self::add_mappings) for builder
    /// chains.
    #[must_use]
    pub fn with_mappings(mut self, mappings: impl IntoIterator<Item = Mapping>) -> Self {
        self.mappings.extend(mappings);
        self
    }

    fn hint_text(&self) -> Option<String> {
        match &self.hint {
            LayerHint::Off => None,
            LayerHint::Text(text) => Some(text.clone()),
            LayerHint::Auto => {
                let keys = self
                    .mappings
                    .iter()
                    .map(|m| m.from.display())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(format!("{} → {}", self.name, keys))
            }
        }
    }

    fn augment_exit(&self, mut mapping: Mapping) -> Mapping {
        mapping.to.extend(exit_actions(&self.name));
        mapping
    }

    /// Compiles the layer into its three rule groups, in fixed order:
    /// trigger, key assignments, escape.
    ///
    /// Pure function of the layer's state, like [`Mode::compile`](super::Mode::compile).
    #[must_use]
    pub fn compile(&self) -> Vec<RuleGroup> {
        let hint = self.hint_text();

        let mut trigger = Mapping::from_event(FromEvent::Simultaneous {
            keys: vec![self.keys.0.clone(), self.keys.1.clone()],
        });
        trigger.to.extend(enter_actions(&self.name, hint.as_deref()));

        let mut mappings: Vec<Mapping> = match &self.policy {
            // Leader: a global one-shot, independent of any per-key policy
            LeaderPolicy::Leader => self
                .mappings
                .iter()
                .map(|m| self.augment_exit(m.clone()))
                .collect(),
            LeaderPolicy::Sticky { .. } => self.mappings.clone(),
        };

        if let LeaderPolicy::Sticky { escape_keys } = &self.policy {
            // Escape-set keys exit without a primary action
            for key in escape_keys {
                mappings.push(self.augment_exit(Mapping::from_event(FromEvent::Key {
                    key: key.clone(),
                    modifiers: Vec::new(),
                })));
            }
        }

        let mut mapping_conditions = vec![Condition::var_is_on(&self.name)];
        mapping_conditions.extend(self.conditions.iter().cloned());

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
                description: format!(
                    "{}: activate with {}+{}",
                    self.name, self.keys.0, self.keys.1
                ),
                conditions: self.conditions.clone(),
                manipulators: vec![trigger],
            },
            RuleGroup {
                description: format!("Key assignments for {}", self.name),
                conditions: mapping_conditions,
                manipulators: mappings,
            },
            RuleGroup {
                description: format!("Escape {}", self.name),
                conditions: vec![Condition::var_is_on(&self.name)],
                manipulators: vec![escape],
            },
        ]
    }
}
