//! Rule compilation: the mode registry, escape-all synthesis, and the
//! flattening pass that produces the final ordered rule list.

pub mod validator;

use crate::mode::{exit_actions, DuoLayer, Mode, ESCAPE_KEY};
use crate::models::{Condition, FromEvent, Mapping, ToEvent};
use crate::profile::CompiledRuleSet;
use anyhow::{bail, Result};
use std::collections::HashSet;

/// One ordered group of compiled rules.
///
/// Group conditions are a conjunction applied on top of each manipulator's
/// own condition list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    /// Human-readable description, used as the rule title
    pub description: String,
    /// Conditions applying to the whole group
    pub conditions: Vec<Condition>,
    /// Manipulators in emission order
    pub manipulators: Vec<Mapping>,
}

/// Explicit registry of every mode and layer in one compilation run.
///
/// Replaces the hidden process-global list: modes register their variable
/// name here at construction, and the global escape rule is synthesized from
/// the registration order once the context is sealed. The registry is
/// append-only; a duplicate name is a fatal configuration error because two
/// modes sharing a variable would corrupt each other's state machine inside
/// the daemon.
#[derive(Debug, Default)]
pub struct CompilationContext {
    entries: Vec<String>,
    names: HashSet<String>,
    sealed: bool,
}

impl CompilationContext {
    /// Creates an empty, unsealed context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mode name.
    ///
    /// # Errors
    ///
    /// Returns an error for a duplicate name or a sealed context.
    pub fn register_mode(&mut self, name: &str) -> Result<()> {
        if self.sealed {
            bail!(
                "Cannot register mode '{}': the context is sealed (all modes must be constructed before compilation)",
                name
            );
        }
        if !self.names.insert(name.to_string()) {
            bail!(
                "Duplicate mode name '{}': every mode needs its own variable",
                name
            );
        }
        self.entries.push(name.to_string());
        Ok(())
    }

    /// Declares that no more modes will be registered.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns true once sealed.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Registered mode names, in registration order.
    #[must_use]
    pub fn registered(&self) -> &[String] {
        &self.entries
    }

    /// Synthesizes the escape-all mapping: native escape passthrough,
    /// then clear-variable + remove-notification for every registered mode,
    /// in registration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is not sealed yet; synthesizing early
    /// would silently omit modes registered afterward.
    pub fn synthesize_global_escape(&self) -> Result<Mapping> {
        if !self.sealed {
            bail!("Escape-all rule requested before sealing the context; modes registered later would be missed");
        }

        let mut mapping = Mapping::from_event(FromEvent::Key {
            key: ESCAPE_KEY.to_string(),
            modifiers: Vec::new(),
        })
        .to(ToEvent::Key {
            key: ESCAPE_KEY.to_string(),
            modifiers: Vec::new(),
        });
        for name in &self.entries {
            mapping.to.extend(exit_actions(name));
        }
        Ok(mapping)
    }
}

/// Heterogeneous input to [`compile_all`]: pre-built rule groups and
/// not-yet-compiled modes or layers.
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// An already-compiled rule group, passed through as-is
    Group(RuleGroup),
    /// A mode, compiled lazily
    Mode(Mode),
    /// A duo layer, compiled lazily
    DuoLayer(DuoLayer),
}

impl From<RuleGroup> for RuleSource {
    fn from(group: RuleGroup) -> Self {
        Self::Group(group)
    }
}

impl From<Mode> for RuleSource {
    fn from(mode: Mode) -> Self {
        Self::Mode(mode)
    }
}

impl From<DuoLayer> for RuleSource {
    fn from(layer: DuoLayer) -> Self {
        Self::DuoLayer(layer)
    }
}

/// Flattens all rule sources into the final ordered rule list and appends
/// the escape-all group last.
///
/// Seals the context, so no further modes can be registered. No
/// deduplication or reordering is performed across unrelated rules: the
/// daemon's own matching semantics decide shadowing.
///
/// # Errors
///
/// Fails fast on any configuration error (overlapping cross-mode
/// simultaneous triggers, invalid conditions) with no partial output.
pub fn compile_all(
    ctx: &mut CompilationContext,
    sources: Vec<RuleSource>,
) -> Result<CompiledRuleSet> {
    ctx.seal();

    let report = validator::validate(&sources);
    if !report.is_valid() {
        bail!("Configuration is invalid:\n{}", report.format_message());
    }

    let mut groups = Vec::new();
    for source in sources {
        match source {
            RuleSource::Group(group) => groups.push(group),
            RuleSource::Mode(mode) => groups.extend(mode.compile()),
            RuleSource::DuoLayer(layer) => groups.extend(layer.compile()),
        }
    }

    // The escape-all rule must see every mode ever registered, so it is
    // emitted last.
    groups.push(RuleGroup {
        description: "Escape all modes".to_string(),
        conditions: Vec::new(),
        manipulators: vec![ctx.synthesize_global_escape()?],
    });

    Ok(CompiledRuleSet::new(groups))
}
