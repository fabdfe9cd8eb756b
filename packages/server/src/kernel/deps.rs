//! Server dependencies (using traits for testability)
//!
//! This module provides the dependency container used by the expert search
//! service. All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use clado_client::{CladoClient, DeepResearchStatus};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domains::expert_search::models::{NewExpert, ProjectTracking};
use crate::kernel::{BaseProjectStore, BaseSearchJobApi, ProjectTrackingUpdate};

// =============================================================================
// CladoClient Adapter (implements BaseSearchJobApi trait)
// =============================================================================

/// Wrapper around CladoClient that implements BaseSearchJobApi trait
pub struct CladoAdapter(pub Arc<CladoClient>);

impl CladoAdapter {
    pub fn new(client: Arc<CladoClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseSearchJobApi for CladoAdapter {
    // CladoError is kept intact inside anyhow so callers can downcast it.
    async fn initiate(&self, query: &str, limit: u32) -> Result<String> {
        Ok(self.0.initiate_deep_research(query, limit).await?)
    }

    async fn poll_status(&self, remote_job_id: &str) -> Result<DeepResearchStatus> {
        Ok(self.0.deep_research_status(remote_job_id).await?)
    }
}

// =============================================================================
// Postgres Project Store (implements BaseProjectStore trait)
// =============================================================================

pub struct PostgresProjectStore {
    pool: PgPool,
}

impl PostgresProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseProjectStore for PostgresProjectStore {
    async fn polling_count(&self, project_id: Uuid) -> Result<i32> {
        let project = ProjectTracking::find_by_id(project_id, &self.pool).await?;
        Ok(project.and_then(|p| p.clado_polling_count).unwrap_or(0))
    }

    async fn update_tracking(
        &self,
        project_id: Uuid,
        update: ProjectTrackingUpdate,
    ) -> Result<()> {
        ProjectTracking::update(
            project_id,
            update.status.map(|s| s.as_str()),
            update.polling_count,
            &self.pool,
        )
        .await?;
        Ok(())
    }

    async fn insert_experts(&self, experts: &[NewExpert]) -> Result<u64> {
        NewExpert::insert_batch(experts, &self.pool).await
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Dependencies shared by submissions and pollers
#[derive(Clone)]
pub struct ServerDeps {
    /// Remote search API (None when no API key is configured)
    pub search_api: Option<Arc<dyn BaseSearchJobApi>>,
    pub project_store: Arc<dyn BaseProjectStore>,
}

impl ServerDeps {
    pub fn new(
        search_api: Option<Arc<dyn BaseSearchJobApi>>,
        project_store: Arc<dyn BaseProjectStore>,
    ) -> Self {
        Self {
            search_api,
            project_store,
        }
    }
}
