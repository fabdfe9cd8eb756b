//! Shared building blocks used across kernel and domains.

pub mod call_id;

pub use call_id::CallId;
