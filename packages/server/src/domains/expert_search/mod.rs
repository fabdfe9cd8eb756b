//! Expert search domain: submitting remote searches, projecting their status
//! onto projects and storing the experts they find.

pub mod models;
pub mod results;
pub mod service;
pub mod status;

pub use results::{aggregate_reasoning, build_expert_records, PersistOutcome, ResultPersister};
pub use service::{ExpertSearchService, HealthSnapshot, SubmitAck, SubmitError, SubmitRequest};
pub use status::{Outcome, ProjectStatus, RemoteStatus, StatusProjector};
