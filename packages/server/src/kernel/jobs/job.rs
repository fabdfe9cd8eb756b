use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::CallId;

const CONTEXT_KEYS: [&str; 4] = ["query", "user_name", "project_id", "call_id"];

/// Lifecycle state of a tracked search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Polling,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Polling)
    }
}

/// Terminal success payload merged with the context of the job that produced it.
///
/// Serializes flat: the context fields first, then every other top-level key
/// of the remote payload. Payload keys that name a context field are dropped
/// so the JSON never carries duplicate keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub query: String,
    pub user_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub call_id: CallId,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

/// Everything known about one job, keyed by its call id.
///
/// Only the poller started for this call id mutates it after creation.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub call_id: CallId,
    pub query: String,
    pub remote_job_id: String,
    pub user_name: Option<String>,
    pub project_id: Option<Uuid>,
    pub state: JobState,
    /// Successful remote checks so far. Never decreases.
    pub poll_count: u32,
    pub result: Option<ResultEnvelope>,
    pub started_at: DateTime<Utc>,
}

impl JobContext {
    pub fn new(
        call_id: CallId,
        query: String,
        remote_job_id: String,
        user_name: Option<String>,
        project_id: Option<Uuid>,
    ) -> Self {
        Self {
            call_id,
            query,
            remote_job_id,
            user_name,
            project_id,
            state: JobState::Polling,
            poll_count: 0,
            result: None,
            started_at: Utc::now(),
        }
    }

    /// Count one successful remote check and return the new total.
    pub fn record_check(&mut self) -> u32 {
        self.poll_count = self.poll_count.saturating_add(1);
        self.poll_count
    }

    /// Build the envelope for a success payload. Non-object payloads
    /// contribute no keys.
    pub fn envelope(&self, payload: &Value) -> ResultEnvelope {
        ResultEnvelope {
            query: self.query.clone(),
            user_name: self.user_name.clone(),
            project_id: self.project_id,
            call_id: self.call_id.clone(),
            payload: payload
                .as_object()
                .map(|fields| {
                    let mut fields = fields.clone();
                    fields.retain(|key, _| !CONTEXT_KEYS.contains(&key.as_str()));
                    fields
                })
                .unwrap_or_default(),
        }
    }

    pub fn succeed(&mut self, envelope: ResultEnvelope) {
        self.state = JobState::Succeeded;
        self.result = Some(envelope);
    }

    pub fn fail(&mut self) {
        self.state = JobState::Failed;
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> JobContext {
        JobContext::new(
            CallId::from("call-1"),
            "rust engineers".into(),
            "job-1".into(),
            Some("Ada".into()),
            Some(Uuid::nil()),
        )
    }

    #[test]
    fn starts_polling_with_zero_checks() {
        let ctx = context();
        assert_eq!(ctx.state, JobState::Polling);
        assert_eq!(ctx.poll_count, 0);
        assert!(!ctx.state.is_terminal());
    }

    #[test]
    fn record_check_is_monotonic() {
        let mut ctx = context();
        assert_eq!(ctx.record_check(), 1);
        assert_eq!(ctx.record_check(), 2);
        ctx.fail();
        assert_eq!(ctx.poll_count, 2);
    }

    #[test]
    fn envelope_serializes_flat() {
        let mut ctx = context();
        let envelope = ctx.envelope(&json!({ "status": "completed", "results": [] }));
        ctx.succeed(envelope);

        let value = serde_json::to_value(ctx.result.as_ref().unwrap()).unwrap();
        assert_eq!(value["query"], "rust engineers");
        assert_eq!(value["user_name"], "Ada");
        assert_eq!(value["call_id"], "call-1");
        assert_eq!(value["status"], "completed");
        assert!(value["results"].as_array().unwrap().is_empty());
        assert_eq!(ctx.state, JobState::Succeeded);
    }

    #[test]
    fn envelope_keeps_context_over_colliding_payload_keys() {
        let envelope = context().envelope(&json!({
            "status": "completed",
            "query": "remote query",
            "call_id": "remote-call",
            "results": []
        }));

        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json.matches("\"query\"").count(), 1);
        assert_eq!(json.matches("\"call_id\"").count(), 1);

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "rust engineers");
        assert_eq!(value["call_id"], "call-1");
        assert_eq!(value["status"], "completed");
        assert!(!envelope.payload.contains_key("query"));
    }

    #[test]
    fn envelope_ignores_non_object_payload() {
        let envelope = context().envelope(&json!(["unexpected"]));
        assert!(envelope.payload.is_empty());
    }
}
