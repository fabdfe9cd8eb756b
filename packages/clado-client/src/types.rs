use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body for starting a deep-research search.
#[derive(Debug, Clone, Serialize)]
pub struct DeepResearchRequest {
    pub query: String,
    pub limit: u32,
}

/// Response to a deep-research initiation.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateResponse {
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Snapshot of a deep-research job.
///
/// The payload is kept verbatim so callers can persist the exact JSON the
/// API returned; `status` is lifted out for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepResearchStatus {
    pub status: Option<String>,
    pub payload: Value,
}

impl DeepResearchStatus {
    pub fn from_payload(payload: Value) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { status, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_is_lifted_from_payload() {
        let snapshot = DeepResearchStatus::from_payload(json!({
            "status": "filtering",
            "progress": 40
        }));
        assert_eq!(snapshot.status.as_deref(), Some("filtering"));
        assert_eq!(snapshot.payload["progress"], 40);
    }

    #[test]
    fn non_string_status_is_ignored() {
        let snapshot = DeepResearchStatus::from_payload(json!({ "status": 3 }));
        assert!(snapshot.status.is_none());
    }

    #[test]
    fn initiate_response_tolerates_missing_job_id() {
        let resp: InitiateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.job_id.is_none());
    }
}
