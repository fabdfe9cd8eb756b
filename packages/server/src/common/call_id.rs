//! Per-request call identifiers.
//!
//! A call id names one job lifecycle. Callers may supply their own (the
//! `x-call-id` header); otherwise one is generated from a UUIDv7, which keeps
//! ids unique across concurrent submissions and sortable by creation time.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const GENERATED_PREFIX: &str = "direct-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("{}{}", GENERATED_PREFIX, Uuid::now_v7()))
    }

    /// Accept a caller-supplied identifier. Blank values are rejected so the
    /// caller falls back to [`CallId::generate`].
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
