//! Data model for conditions, events, and mappings.
//!
//! These are immutable value types with structural equality, independent of
//! the compilation logic. Everything the compiler emits is built from them.

pub mod condition;
pub mod event;
pub mod mapping;

// Re-export all model types
pub use condition::{Condition, ProcessState, VariableValue};
pub use event::{hyper, FromEvent, Modifier, ToEvent};
pub use mapping::{mapping_table, ManipulatorParameters, Mapping};
