//! Turning a completed search payload into ranked expert rows.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::models::NewExpert;
use super::status::{ProjectStatus, StatusProjector};
use crate::kernel::BaseProjectStore;

/// Join the `reasoning` text of every criteria entry, in payload order.
///
/// Entries without reasoning text are skipped. Returns an empty string when
/// nothing contributes.
pub fn aggregate_reasoning(profile: &Value) -> String {
    let entries: Vec<&Value> = match profile.get("criteria") {
        Some(Value::Object(criteria)) => criteria.values().collect(),
        Some(Value::Array(criteria)) => criteria.iter().collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| entry.get("reasoning").and_then(Value::as_str))
        .filter(|reasoning| !reasoning.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn text_field(profile: &Value, key: &str) -> Option<String> {
    profile
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build one record per result item. Rank is the 1-indexed position in
/// `items`; no re-sorting happens.
pub fn build_expert_records(items: &[Value], project_id: Uuid, query: &str) -> Vec<NewExpert> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let profile = item.get("profile").unwrap_or(&Value::Null);

            NewExpert {
                name: text_field(profile, "name").unwrap_or_default(),
                project_id,
                linkedin_url: text_field(profile, "linkedin_profile_url")
                    .or_else(|| text_field(profile, "linkedin_url"))
                    .unwrap_or_default(),
                headline: text_field(profile, "headline").unwrap_or_default(),
                summary: text_field(profile, "summary").unwrap_or_default(),
                reasoning: aggregate_reasoning(profile),
                for_query: query.to_string(),
                rank: index as i32 + 1,
                raw_json: item.clone(),
            }
        })
        .collect()
}

/// Result of a persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Payload had no `results` array; nothing written.
    NoResults,
    /// Batch written and project advanced to `success`.
    Saved(u64),
    /// Batch write failed; project status left untouched.
    Failed,
}

/// Writes the experts of a completed search, then marks the project `success`.
///
/// A failed batch write is logged and swallowed with no retry, so the project
/// can stay at its last progress status even though the search succeeded.
#[derive(Clone)]
pub struct ResultPersister {
    store: Arc<dyn BaseProjectStore>,
    projector: StatusProjector,
}

impl ResultPersister {
    pub fn new(store: Arc<dyn BaseProjectStore>) -> Self {
        let projector = StatusProjector::new(store.clone());
        Self { store, projector }
    }

    pub async fn persist(&self, payload: &Value, project_id: Uuid, query: &str) -> PersistOutcome {
        let Some(items) = payload.get("results").and_then(Value::as_array) else {
            info!(project_id = %project_id, "No experts found in results to save");
            return PersistOutcome::NoResults;
        };

        let experts = build_expert_records(items, project_id, query);
        info!(
            project_id = %project_id,
            count = experts.len(),
            "Saving experts ranked by result order"
        );

        match self.store.insert_experts(&experts).await {
            Ok(saved) => {
                info!(project_id = %project_id, count = saved, query, "Saved experts");
                self.projector
                    .set_status(project_id, ProjectStatus::Success)
                    .await;
                PersistOutcome::Saved(saved)
            }
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "Error saving experts to database");
                PersistOutcome::Failed
            }
        }
    }
}
