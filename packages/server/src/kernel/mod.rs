//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod test_dependencies;
pub mod traits;

pub use deps::{CladoAdapter, PostgresProjectStore, ServerDeps};
pub use test_dependencies::{MockProjectStore, MockSearchJobApi, ScriptedPoll};
pub use traits::*;
