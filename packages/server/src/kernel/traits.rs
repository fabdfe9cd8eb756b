// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Status projection and result persistence are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSearchJobApi, BaseProjectStore)

use anyhow::Result;
use async_trait::async_trait;
use clado_client::DeepResearchStatus;
use uuid::Uuid;

use crate::domains::expert_search::models::NewExpert;
use crate::domains::expert_search::ProjectStatus;

// =============================================================================
// Remote Search Job API Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseSearchJobApi: Send + Sync {
    /// Start a remote search job and return its id
    async fn initiate(&self, query: &str, limit: u32) -> Result<String>;

    /// Fetch the current status (and results, once complete) of a remote job
    async fn poll_status(&self, remote_job_id: &str) -> Result<DeepResearchStatus>;
}

// =============================================================================
// Project Store Trait (Infrastructure - persisted status + expert rows)
// =============================================================================

/// Columns to write on a project row. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectTrackingUpdate {
    pub status: Option<ProjectStatus>,
    pub polling_count: Option<i32>,
}

#[async_trait]
pub trait BaseProjectStore: Send + Sync {
    /// Current durable poll counter (0 when unset or the project is unknown)
    async fn polling_count(&self, project_id: Uuid) -> Result<i32>;

    async fn update_tracking(&self, project_id: Uuid, update: ProjectTrackingUpdate)
        -> Result<()>;

    /// Insert all experts as one batch, returning the number stored
    async fn insert_experts(&self, experts: &[NewExpert]) -> Result<u64>;
}
