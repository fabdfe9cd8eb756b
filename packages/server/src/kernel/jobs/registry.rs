//! Registry of tracked search jobs.
//!
//! Each call id maps to a single entry that owns the job's context and the
//! handle of its poll task. The entry is installed, replaced and removed as a
//! unit, so a call id never has a context without its timer or a timer
//! without its context.
//!
//! Restarting a call id is a replacement: the previous timer is cancelled
//! before the new entry goes in. Every entry carries a generation number and
//! pollers act on the registry through a [`JobTicket`], so a superseded poller
//! can never complete or purge the entry that replaced it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use super::job::{JobContext, ResultEnvelope};
use crate::common::CallId;

/// Job context shared between the registry and the job's poller.
pub type SharedJobContext = Arc<Mutex<JobContext>>;

pub(crate) fn lock_context(context: &SharedJobContext) -> MutexGuard<'_, JobContext> {
    context.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to a job's recurring poll task. Dropping it cancels the task.
#[derive(Debug)]
pub struct PollTimer {
    cancel: CancellationToken,
    // Not aborted on drop: the task may be the one dropping it, mid-persist.
    _task: JoinHandle<()>,
}

impl PollTimer {
    pub fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            cancel,
            _task: task,
        }
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Proof of which entry a poller was started for.
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub call_id: CallId,
    generation: u64,
    pub context: SharedJobContext,
}

struct JobEntry {
    generation: u64,
    context: SharedJobContext,
    timer: Option<PollTimer>,
}

/// Tracks active jobs and retains the contexts of completed ones.
pub struct JobRegistry {
    active: RwLock<HashMap<CallId, JobEntry>>,
    completed: RwLock<HashMap<CallId, JobContext>>,
    latest_completed: RwLock<Option<ResultEnvelope>>,
    next_generation: AtomicU64,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            completed: RwLock::new(HashMap::new()),
            latest_completed: RwLock::new(None),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Install a fresh context for `call_id`, cancelling and discarding any
    /// job already registered under it.
    pub fn create(
        &self,
        call_id: CallId,
        query: String,
        remote_job_id: String,
        user_name: Option<String>,
        project_id: Option<Uuid>,
    ) -> JobTicket {
        let context = Arc::new(Mutex::new(JobContext::new(
            call_id.clone(),
            query,
            remote_job_id,
            user_name,
            project_id,
        )));
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = active.remove(&call_id) {
                debug!(call_id = %call_id, "Cancelling existing polling for restarted call");
                drop(previous);
            }
            active.insert(
                call_id.clone(),
                JobEntry {
                    generation,
                    context: context.clone(),
                    timer: None,
                },
            );
        }

        self.completed
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&call_id);

        JobTicket {
            call_id,
            generation,
            context,
        }
    }

    /// Hand the poll task to the entry it was started for. If that entry has
    /// already been replaced or removed, the timer is dropped (and so
    /// cancelled) and `false` is returned.
    pub fn attach_timer(&self, ticket: &JobTicket, timer: PollTimer) -> bool {
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        match active.get_mut(&ticket.call_id) {
            Some(entry) if entry.generation == ticket.generation => {
                entry.timer = Some(timer);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the job for `call_id`: the active one if any, otherwise
    /// the retained completed one.
    pub fn get(&self, call_id: &CallId) -> Option<JobContext> {
        if let Some(entry) = self
            .active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(call_id)
        {
            return Some(lock_context(&entry.context).clone());
        }

        self.completed
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(call_id)
            .cloned()
    }

    /// Drop everything known about `call_id`, cancelling its timer.
    pub fn remove(&self, call_id: &CallId) -> bool {
        let removed_active = self
            .active
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(call_id)
            .is_some();
        let removed_completed = self
            .completed
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(call_id)
            .is_some();
        removed_active || removed_completed
    }

    /// Move a succeeded job out of the active set, keeping its snapshot.
    pub fn complete(&self, ticket: &JobTicket) -> bool {
        let Some(entry) = self.take_current(ticket) else {
            return false;
        };

        let snapshot = lock_context(&entry.context).clone();
        drop(entry);

        if let Some(result) = snapshot.result.clone() {
            *self
                .latest_completed
                .write()
                .unwrap_or_else(|e| e.into_inner()) = Some(result);
        }
        self.completed
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ticket.call_id.clone(), snapshot);
        true
    }

    /// Remove a failed job entirely. Nothing is retained.
    pub fn purge(&self, ticket: &JobTicket) -> bool {
        match self.take_current(ticket) {
            Some(entry) => {
                drop(entry);
                self.completed
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&ticket.call_id);
                true
            }
            None => false,
        }
    }

    /// Whether `ticket` still names the registered entry for its call id.
    pub fn is_current(&self, ticket: &JobTicket) -> bool {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&ticket.call_id)
            .is_some_and(|entry| entry.generation == ticket.generation)
    }

    /// Number of jobs still polling.
    pub fn active_count(&self) -> usize {
        self.active.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Result of the most recently completed job.
    pub fn latest_completed(&self) -> Option<ResultEnvelope> {
        self.latest_completed
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn take_current(&self, ticket: &JobTicket) -> Option<JobEntry> {
        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        match active.get(&ticket.call_id) {
            Some(entry) if entry.generation == ticket.generation => active.remove(&ticket.call_id),
            _ => None,
        }
    }
}
