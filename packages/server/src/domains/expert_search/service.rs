//! Entry point for expert searches.
//!
//! `submit` is the only operation that reports errors to its caller. Once a
//! search is acknowledged, every later failure is logged and only observable
//! through the project's persisted status.

use std::sync::Arc;
use std::time::Duration;

use clado_client::{CladoError, DEFAULT_RESULT_LIMIT};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use super::results::ResultPersister;
use super::status::{ProjectStatus, StatusProjector};
use crate::common::CallId;
use crate::kernel::jobs::{JobContext, JobRegistry, Poller, ResultEnvelope};
use crate::kernel::ServerDeps;

/// Errors returned synchronously by [`ExpertSearchService::submit`].
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("search_query is required")]
    MissingQuery,

    #[error("Clado API key not configured")]
    MissingApiKey,

    /// The remote API refused or could not be reached. `status` is the
    /// upstream HTTP status when there was a response.
    #[error("Failed to initiate Clado search")]
    Initiation {
        status: Option<u16>,
        details: String,
    },

    #[error("No search ID returned from Clado")]
    MissingJobId,
}

impl SubmitError {
    fn from_initiation(err: anyhow::Error) -> Self {
        match err.downcast_ref::<CladoError>() {
            Some(CladoError::MissingJobId) => Self::MissingJobId,
            Some(CladoError::Api { status, message }) => Self::Initiation {
                status: Some(*status),
                details: message.clone(),
            },
            _ => Self::Initiation {
                status: None,
                details: err.to_string(),
            },
        }
    }
}

/// A request to start an expert search.
#[derive(Clone, Debug, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(into, strip_option)))]
pub struct SubmitRequest {
    pub query: Option<String>,
    pub user_name: Option<String>,
    pub project_id: Option<Uuid>,
    /// Reusing an active call id restarts that job.
    pub call_id: Option<CallId>,
}

/// Acknowledgment of an accepted search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitAck {
    pub remote_job_id: String,
    pub call_id: CallId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub active_job_count: usize,
}

#[derive(Clone)]
pub struct ExpertSearchService {
    deps: ServerDeps,
    registry: Arc<JobRegistry>,
    poll_interval: Duration,
}

impl ExpertSearchService {
    pub fn new(deps: ServerDeps, poll_interval: Duration) -> Self {
        Self {
            deps,
            registry: Arc::new(JobRegistry::new()),
            poll_interval,
        }
    }

    /// Start a remote search and begin polling it in the background.
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmitAck, SubmitError> {
        let call_id = request.call_id.unwrap_or_else(CallId::generate);
        let project_id = request.project_id;
        info!(
            call_id = %call_id,
            project_id = ?project_id,
            query = ?request.query,
            "Expert search request received"
        );

        let query = request
            .query
            .filter(|q| !q.is_empty())
            .ok_or(SubmitError::MissingQuery)?;
        let api = self
            .deps
            .search_api
            .clone()
            .ok_or(SubmitError::MissingApiKey)?;
        let projector = StatusProjector::new(self.deps.project_store.clone());

        let remote_job_id = match api.initiate(&query, DEFAULT_RESULT_LIMIT).await {
            Ok(remote_job_id) => remote_job_id,
            Err(e) => {
                error!(call_id = %call_id, error = %e, "Clado initiate search failed");
                if let Some(project_id) = project_id {
                    projector.set_status(project_id, ProjectStatus::Failed).await;
                }
                return Err(SubmitError::from_initiation(e));
            }
        };
        info!(call_id = %call_id, remote_job_id = %remote_job_id, "Clado search initiated");

        let user_name = request.user_name.filter(|u| !u.is_empty());
        let ticket = self.registry.create(
            call_id.clone(),
            query,
            remote_job_id.clone(),
            user_name,
            project_id,
        );

        if let Some(project_id) = project_id {
            projector.set_status(project_id, ProjectStatus::Searching).await;
        }

        let poller = Poller::new(
            api,
            self.registry.clone(),
            projector,
            ResultPersister::new(self.deps.project_store.clone()),
            ticket.clone(),
            self.poll_interval,
        );
        let timer = poller.start();
        self.registry.attach_timer(&ticket, timer);

        Ok(SubmitAck {
            remote_job_id,
            call_id,
        })
    }

    pub fn health(&self) -> HealthSnapshot {
        HealthSnapshot {
            active_job_count: self.registry.active_count(),
        }
    }

    /// Snapshot of an active or completed job. Failed jobs are not retained.
    pub fn job(&self, call_id: &CallId) -> Option<JobContext> {
        self.registry.get(call_id)
    }

    pub fn latest_completed(&self) -> Option<ResultEnvelope> {
        self.registry.latest_completed()
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockProjectStore, MockSearchJobApi};

    fn service(api: Option<Arc<MockSearchJobApi>>) -> (ExpertSearchService, Arc<MockProjectStore>) {
        let store = Arc::new(MockProjectStore::new());
        let search_api = api.map(|a| a as Arc<dyn crate::kernel::BaseSearchJobApi>);
        let deps = ServerDeps::new(search_api, store.clone());
        (
            ExpertSearchService::new(deps, Duration::from_secs(30)),
            store,
        )
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let api = Arc::new(MockSearchJobApi::new());
        let (service, _) = service(Some(api.clone()));

        let err = service
            .submit(SubmitRequest::builder().build())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::MissingQuery));

        let err = service
            .submit(SubmitRequest::builder().query("").build())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::MissingQuery));
        assert!(api.initiate_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_api_key_is_rejected() {
        let (service, _) = service(None);

        let err = service
            .submit(SubmitRequest::builder().query("rust").build())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::MissingApiKey));
        assert_eq!(service.health().active_job_count, 0);
    }

    #[tokio::test]
    async fn initiation_failure_marks_project_failed() {
        let api = Arc::new(MockSearchJobApi::new());
        api.fail_next_initiate(CladoError::Api {
            status: 502,
            message: "bad gateway".into(),
        });
        let (service, store) = service(Some(api));
        let project_id = Uuid::new_v4();

        let err = service
            .submit(
                SubmitRequest::builder()
                    .query("rust")
                    .project_id(project_id)
                    .build(),
            )
            .await
            .unwrap_err();

        match err {
            SubmitError::Initiation { status, details } => {
                assert_eq!(status, Some(502));
                assert_eq!(details, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.statuses_for(project_id), vec![ProjectStatus::Failed]);
        assert_eq!(service.health().active_job_count, 0);
    }

    #[tokio::test]
    async fn missing_job_id_is_reported() {
        let api = Arc::new(MockSearchJobApi::new());
        api.fail_next_initiate(CladoError::MissingJobId);
        let (service, _) = service(Some(api));

        let err = service
            .submit(SubmitRequest::builder().query("rust").build())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::MissingJobId));
    }

    #[tokio::test]
    async fn submit_marks_project_searching_and_tracks_job() {
        let api = Arc::new(MockSearchJobApi::new());
        let (service, store) = service(Some(api.clone()));
        let project_id = Uuid::new_v4();

        let ack = service
            .submit(
                SubmitRequest::builder()
                    .query("rust")
                    .user_name("Ada")
                    .project_id(project_id)
                    .call_id(CallId::from("call-1"))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(ack.remote_job_id, "job-1");
        assert_eq!(ack.call_id, CallId::from("call-1"));
        assert_eq!(api.initiate_calls(), vec![("rust".to_string(), 30)]);
        assert_eq!(store.statuses_for(project_id), vec![ProjectStatus::Searching]);
        assert_eq!(service.health().active_job_count, 1);

        let job = service.job(&CallId::from("call-1")).unwrap();
        assert_eq!(job.user_name.as_deref(), Some("Ada"));
        assert_eq!(job.project_id, Some(project_id));
    }

    #[tokio::test]
    async fn identical_queries_get_distinct_call_ids() {
        let api = Arc::new(MockSearchJobApi::new());
        let (service, _) = service(Some(api));

        let (a, b) = tokio::join!(
            service.submit(SubmitRequest::builder().query("same").build()),
            service.submit(SubmitRequest::builder().query("same").build()),
        );

        assert_ne!(a.unwrap().call_id, b.unwrap().call_id);
        assert_eq!(service.health().active_job_count, 2);
    }
}
