// TestDependencies - mock implementations for testing
//
// In-memory stand-ins for the remote search API and the project store. The
// search API replays scripted status sequences per remote job; the project
// store keeps rows in memory and records every status write.

use anyhow::Result;
use async_trait::async_trait;
use clado_client::{CladoError, DeepResearchStatus};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{BaseProjectStore, BaseSearchJobApi, ProjectTrackingUpdate};
use crate::domains::expert_search::models::NewExpert;
use crate::domains::expert_search::ProjectStatus;

// =============================================================================
// Mock Search Job API
// =============================================================================

/// One scripted response to a status check.
#[derive(Debug, Clone)]
pub enum ScriptedPoll {
    Status(Value),
    TransportError(String),
}

impl ScriptedPoll {
    pub fn status(status: &str) -> Self {
        Self::Status(json!({ "status": status }))
    }

    pub fn completed(results: Vec<Value>) -> Self {
        Self::Status(json!({ "status": "completed", "results": results }))
    }

    pub fn transport_error() -> Self {
        Self::TransportError("connection reset".to_string())
    }
}

/// Remote API double. Initiation hands out `job-1`, `job-2`, ... unless a
/// failure was queued; status checks replay the script for that job and
/// report `processing` once it runs out.
pub struct MockSearchJobApi {
    next_job: AtomicUsize,
    initiate_failures: Mutex<VecDeque<CladoError>>,
    scripts: Mutex<HashMap<String, VecDeque<ScriptedPoll>>>,
    initiate_calls: Mutex<Vec<(String, u32)>>,
    poll_calls: Mutex<Vec<String>>,
}

impl MockSearchJobApi {
    pub fn new() -> Self {
        Self {
            next_job: AtomicUsize::new(1),
            initiate_failures: Mutex::new(VecDeque::new()),
            scripts: Mutex::new(HashMap::new()),
            initiate_calls: Mutex::new(Vec::new()),
            poll_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue status responses for a remote job
    pub fn script(&self, remote_job_id: &str, polls: Vec<ScriptedPoll>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(remote_job_id.to_string())
            .or_default()
            .extend(polls);
    }

    /// Make the next initiation fail with the given error
    pub fn fail_next_initiate(&self, error: CladoError) {
        self.initiate_failures.lock().unwrap().push_back(error);
    }

    /// All (query, limit) pairs passed to initiate
    pub fn initiate_calls(&self) -> Vec<(String, u32)> {
        self.initiate_calls.lock().unwrap().clone()
    }

    /// Number of status checks issued for a remote job
    pub fn poll_count_for(&self, remote_job_id: &str) -> usize {
        self.poll_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == remote_job_id)
            .count()
    }
}

impl Default for MockSearchJobApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSearchJobApi for MockSearchJobApi {
    async fn initiate(&self, query: &str, limit: u32) -> Result<String> {
        self.initiate_calls
            .lock()
            .unwrap()
            .push((query.to_string(), limit));

        if let Some(error) = self.initiate_failures.lock().unwrap().pop_front() {
            return Err(error.into());
        }

        let n = self.next_job.fetch_add(1, Ordering::SeqCst);
        Ok(format!("job-{}", n))
    }

    async fn poll_status(&self, remote_job_id: &str) -> Result<DeepResearchStatus> {
        self.poll_calls
            .lock()
            .unwrap()
            .push(remote_job_id.to_string());

        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(remote_job_id)
            .and_then(|script| script.pop_front());

        match next {
            Some(ScriptedPoll::Status(payload)) => Ok(DeepResearchStatus::from_payload(payload)),
            Some(ScriptedPoll::TransportError(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(DeepResearchStatus::from_payload(
                json!({ "status": "processing" }),
            )),
        }
    }
}

// =============================================================================
// Mock Project Store
// =============================================================================

/// In-memory view of a project's tracking columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRecord {
    pub status: Option<ProjectStatus>,
    pub polling_count: i32,
}

pub struct MockProjectStore {
    projects: Mutex<HashMap<Uuid, ProjectRecord>>,
    experts: Mutex<Vec<NewExpert>>,
    status_history: Mutex<Vec<(Uuid, ProjectStatus)>>,
    fail_updates: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MockProjectStore {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(HashMap::new()),
            experts: Mutex::new(Vec::new()),
            status_history: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn seed_project(&self, project_id: Uuid, status: Option<ProjectStatus>, polling_count: i32) {
        self.projects.lock().unwrap().insert(
            project_id,
            ProjectRecord {
                status,
                polling_count,
            },
        );
    }

    pub fn project(&self, project_id: Uuid) -> Option<ProjectRecord> {
        self.projects.lock().unwrap().get(&project_id).cloned()
    }

    pub fn experts(&self) -> Vec<NewExpert> {
        self.experts.lock().unwrap().clone()
    }

    pub fn experts_for(&self, project_id: Uuid) -> Vec<NewExpert> {
        self.experts
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect()
    }

    /// Every status written, in write order
    pub fn status_history(&self) -> Vec<(Uuid, ProjectStatus)> {
        self.status_history.lock().unwrap().clone()
    }

    pub fn statuses_for(&self, project_id: Uuid) -> Vec<ProjectStatus> {
        self.status_history
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == project_id)
            .map(|(_, status)| *status)
            .collect()
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

impl Default for MockProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProjectStore for MockProjectStore {
    async fn polling_count(&self, project_id: Uuid) -> Result<i32> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(&project_id)
            .map(|p| p.polling_count)
            .unwrap_or(0))
    }

    async fn update_tracking(
        &self,
        project_id: Uuid,
        update: ProjectTrackingUpdate,
    ) -> Result<()> {
        if self.fail_updates.load(Ordering::SeqCst) {
            anyhow::bail!("project update rejected");
        }

        let mut projects = self.projects.lock().unwrap();
        let project = projects.entry(project_id).or_default();
        if let Some(count) = update.polling_count {
            project.polling_count = count;
        }
        if let Some(status) = update.status {
            project.status = Some(status);
            self.status_history
                .lock()
                .unwrap()
                .push((project_id, status));
        }
        Ok(())
    }

    async fn insert_experts(&self, experts: &[NewExpert]) -> Result<u64> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("expert insert rejected");
        }

        self.experts.lock().unwrap().extend_from_slice(experts);
        Ok(experts.len() as u64)
    }
}
