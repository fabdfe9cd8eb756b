//! Per-job polling state machine.
//!
//! ```text
//! POLLING ──(searching/filtering/processing/pending/other)──► POLLING
//!    │
//!    ├──(completed/success)──► SUCCEEDED  store envelope, stop timer, persist experts
//!    └──(failed/error)───────► FAILED     mark project failed, stop timer, purge
//! ```
//!
//! A tick fires every `interval` (no jitter, no backoff, at least a second
//! apart). A tick whose status check fails at the transport level changes
//! nothing and the next tick simply tries again; there is no retry cap.
//!
//! A restart of the call id can land during any awaited call of a tick. The
//! tick re-checks its ticket after each one and stops without further writes
//! once it no longer owns the registry entry.
//!
//! Ticks of one job never overlap: the next tick is only awaited after the
//! previous one has finished all its side effects.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::{lock_context, JobRegistry, JobTicket, PollTimer};
use crate::domains::expert_search::{
    Outcome, ProjectStatus, RemoteStatus, ResultPersister, StatusProjector,
};
use crate::kernel::BaseSearchJobApi;

const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Status check succeeded with a non-terminal status.
    InProgress(RemoteStatus),
    /// Status check failed; nothing changed.
    TransportError,
    Succeeded,
    Failed,
    /// The job was restarted or removed while this tick ran.
    Superseded,
}

impl TickOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Superseded)
    }
}

pub struct Poller {
    api: Arc<dyn BaseSearchJobApi>,
    registry: Arc<JobRegistry>,
    projector: StatusProjector,
    persister: ResultPersister,
    ticket: JobTicket,
    interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(
        api: Arc<dyn BaseSearchJobApi>,
        registry: Arc<JobRegistry>,
        projector: StatusProjector,
        persister: ResultPersister,
        ticket: JobTicket,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            projector,
            persister,
            ticket,
            interval: interval.max(MIN_POLL_INTERVAL),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the recurring task. The first tick fires one interval from now.
    pub fn start(self) -> PollTimer {
        let cancel = self.cancel.clone();
        info!(
            call_id = %self.ticket.call_id,
            interval_secs = self.interval.as_secs(),
            "Starting polling"
        );
        let task = tokio::spawn(self.run());
        PollTimer::new(cancel, task)
    }

    async fn run(self) {
        let mut ticks = interval_at(Instant::now() + self.interval, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticks.tick() => {}
            }

            if self.tick().await.is_terminal() {
                break;
            }
        }

        debug!(call_id = %self.ticket.call_id, "Polling stopped");
    }

    /// Run one status check and its side effects.
    pub async fn tick(&self) -> TickOutcome {
        let (remote_job_id, project_id) = {
            let ctx = lock_context(&self.ticket.context);
            (ctx.remote_job_id.clone(), ctx.project_id)
        };
        let call_id = &self.ticket.call_id;

        let checked = tokio::select! {
            _ = self.cancel.cancelled() => return TickOutcome::Superseded,
            checked = self.api.poll_status(&remote_job_id) => checked,
        };

        let snapshot = match checked {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    call_id = %call_id,
                    remote_job_id = %remote_job_id,
                    error = %e,
                    "Status check failed, retrying next tick"
                );
                return TickOutcome::TransportError;
            }
        };

        if self.is_superseded() {
            return TickOutcome::Superseded;
        }

        let status = RemoteStatus::parse(snapshot.status.as_deref());
        let poll_count = lock_context(&self.ticket.context).record_check();
        debug!(
            call_id = %call_id,
            remote_job_id = %remote_job_id,
            status = %status,
            poll_count,
            "Status check"
        );

        if let Some(project_id) = project_id {
            self.projector.record_check(project_id, &status).await;
            if self.is_superseded() {
                return TickOutcome::Superseded;
            }
        }

        match status.outcome() {
            Outcome::InProgress => TickOutcome::InProgress(status),
            Outcome::Succeeded => self.succeed(snapshot.payload).await,
            Outcome::Failed => self.fail(&snapshot.payload).await,
        }
    }

    /// The job was restarted or removed after this poller was started.
    fn is_superseded(&self) -> bool {
        self.cancel.is_cancelled() || !self.registry.is_current(&self.ticket)
    }

    async fn succeed(&self, payload: Value) -> TickOutcome {
        let (query, project_id) = {
            let mut ctx = lock_context(&self.ticket.context);
            let envelope = ctx.envelope(&payload);
            ctx.succeed(envelope);
            (ctx.query.clone(), ctx.project_id)
        };

        if !self.registry.complete(&self.ticket) {
            return TickOutcome::Superseded;
        }
        info!(
            call_id = %self.ticket.call_id,
            "Search completed, polling stopped and results stored"
        );

        match project_id {
            Some(project_id) => {
                self.persister.persist(&payload, project_id, &query).await;
            }
            None => info!(
                call_id = %self.ticket.call_id,
                "No project id, skipping expert persistence"
            ),
        }
        TickOutcome::Succeeded
    }

    /// The job is purged before the project is marked failed, so a restart
    /// that lands first keeps its project untouched.
    async fn fail(&self, payload: &Value) -> TickOutcome {
        let project_id = {
            let mut ctx = lock_context(&self.ticket.context);
            ctx.fail();
            ctx.project_id
        };
        if !self.registry.purge(&self.ticket) {
            return TickOutcome::Superseded;
        }
        warn!(call_id = %self.ticket.call_id, payload = %payload, "Search failed");

        if let Some(project_id) = project_id {
            self.projector
                .set_status(project_id, ProjectStatus::Failed)
                .await;
        }
        TickOutcome::Failed
    }
}
