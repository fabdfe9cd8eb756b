//! Job infrastructure for tracking remote search jobs.
//!
//! This module provides the kernel-level infrastructure for background polling:
//! - [`JobRegistry`] - Call id → job entry (context + poll task handle)
//! - [`Poller`] - Drives one job from submission to a terminal state
//! - [`JobContext`] - Per-job state
//!
//! # Architecture
//!
//! ```text
//! ExpertSearchService.submit()
//!     │
//!     ├─► JobRegistry.create()   (cancels any prior job for the call id)
//!     └─► Poller.start()         (every interval)
//!             ├─► BaseSearchJobApi.poll_status()
//!             ├─► StatusProjector.record_check()
//!             ├─► success → JobRegistry.complete() → ResultPersister.persist()
//!             └─► failure → project failed → JobRegistry.purge()
//! ```

mod job;
pub mod poller;
pub mod registry;

pub use job::{JobContext, JobState, ResultEnvelope};
pub use poller::{Poller, TickOutcome};
pub use registry::{JobRegistry, JobTicket, PollTimer, SharedJobContext};
