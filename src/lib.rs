//! Declarative mode and layer composition for a Karabiner-style
//! keyboard remapping daemon.
//!
//! This library describes keybinding "modes" (sets of key mappings gated by
//! a process variable, triggered by simultaneous keys, duo-key leader
//! sequences, or hyper-key chords) and compiles them into a static rule set
//! consumed by the external remapping engine. The crate only emits a data
//! structure describing rules; the daemon interprets and executes them.

// Module declarations
pub mod compiler;
pub mod keycode_db;
pub mod mode;
pub mod models;
pub mod profile;

// Re-export the main API surface
pub use compiler::{compile_all, CompilationContext, RuleGroup, RuleSource};
pub use mode::{DuoLayer, LayerHint, LeaderPolicy, Mode, ModeConfig, OneShot};
pub use models::{Condition, FromEvent, Mapping, Modifier, ProcessState, ToEvent, VariableValue};
pub use profile::{CompiledRuleSet, ProfileParameters};
