//! Projection of remote job statuses onto the persisted project status.
//!
//! Every successful remote check bumps the project's `clado_polling_count`.
//! Only `searching` and `filtering` are written through as progress; the
//! terminal `failed` and `success` values are written by the poller and the
//! result persister once their side effects are done.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::kernel::{BaseProjectStore, ProjectTrackingUpdate};

/// Status reported by the remote search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Searching,
    Filtering,
    Processing,
    Pending,
    Completed,
    Success,
    Failed,
    Error,
    /// Anything else, including a missing status. Treated as in progress.
    Other(String),
}

/// What a remote status means for the job that observed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Succeeded,
    Failed,
}

impl RemoteStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or_default() {
            "searching" => Self::Searching,
            "filtering" => Self::Filtering,
            "processing" => Self::Processing,
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "success" => Self::Success,
            "failed" => Self::Failed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Completed | Self::Success => Outcome::Succeeded,
            Self::Failed | Self::Error => Outcome::Failed,
            _ => Outcome::InProgress,
        }
    }

    /// Persisted status this remote status maps to, if any.
    pub fn projected_status(&self) -> Option<ProjectStatus> {
        match self {
            Self::Searching => Some(ProjectStatus::Searching),
            Self::Filtering => Some(ProjectStatus::Filtering),
            Self::Completed | Self::Success => Some(ProjectStatus::Success),
            Self::Failed | Self::Error => Some(ProjectStatus::Failed),
            Self::Processing | Self::Pending | Self::Other(_) => None,
        }
    }

    /// Status written on the tick that observed it. Terminal statuses are
    /// excluded; their writes are ordered after the terminal side effects.
    pub fn progress_status(&self) -> Option<ProjectStatus> {
        match self.outcome() {
            Outcome::InProgress => self.projected_status(),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Searching => "searching",
            Self::Filtering => "filtering",
            Self::Processing => "processing",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// Value of a project's `clado_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Searching,
    Filtering,
    Failed,
    Success,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Filtering => "filtering",
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes status and poll-counter bookkeeping for a project.
///
/// The counter is read, then written back incremented. That is only correct
/// while a single job at a time targets a given project; two concurrent jobs
/// on one project can lose increments.
#[derive(Clone)]
pub struct StatusProjector {
    store: Arc<dyn BaseProjectStore>,
}

impl StatusProjector {
    pub fn new(store: Arc<dyn BaseProjectStore>) -> Self {
        Self { store }
    }

    /// Bookkeeping for one successful remote check.
    pub async fn record_check(&self, project_id: Uuid, status: &RemoteStatus) {
        self.apply(project_id, None, true).await;

        if let Some(progress) = status.progress_status() {
            self.apply(project_id, Some(progress), false).await;
        }
    }

    pub async fn set_status(&self, project_id: Uuid, status: ProjectStatus) {
        self.apply(project_id, Some(status), false).await;
    }

    /// Failures are logged and swallowed.
    async fn apply(&self, project_id: Uuid, status: Option<ProjectStatus>, increment: bool) {
        match self.try_apply(project_id, status, increment).await {
            Ok(Some(update)) => debug!(
                project_id = %project_id,
                status = ?update.status.map(|s| s.as_str()),
                poll_count = ?update.polling_count,
                "Project updated"
            ),
            Ok(None) => {}
            Err(e) => warn!(project_id = %project_id, error = %e, "Error updating project status"),
        }
    }

    async fn try_apply(
        &self,
        project_id: Uuid,
        status: Option<ProjectStatus>,
        increment: bool,
    ) -> Result<Option<ProjectTrackingUpdate>> {
        if status.is_none() && !increment {
            return Ok(None);
        }

        let polling_count = if increment {
            let current = self.store.polling_count(project_id).await?;
            Some(current + 1)
        } else {
            None
        };

        let update = ProjectTrackingUpdate {
            status,
            polling_count,
        };
        self.store.update_tracking(project_id, update.clone()).await?;

        Ok(Some(update))
    }
}
