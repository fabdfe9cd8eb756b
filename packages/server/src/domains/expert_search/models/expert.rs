use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// An expert row derived from one item of a completed search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExpert {
    pub name: String,
    pub project_id: Uuid,
    pub linkedin_url: String,
    pub headline: String,
    pub summary: String,
    pub reasoning: String,
    pub for_query: String,
    /// 1-indexed position in the remote result list.
    pub rank: i32,
    /// Verbatim copy of the remote result item.
    pub raw_json: Value,
}

impl NewExpert {
    /// Insert all experts in a single statement. No dedupe: inserting the same
    /// batch twice stores it twice.
    pub async fn insert_batch(experts: &[NewExpert], pool: &PgPool) -> Result<u64> {
        if experts.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO experts \
             (name, project_id, linkedin_url, headline, summary, reasoning, for_query, rank, raw_json) ",
        );
        builder.push_values(experts, |mut row, expert| {
            row.push_bind(expert.name.clone())
                .push_bind(expert.project_id)
                .push_bind(expert.linkedin_url.clone())
                .push_bind(expert.headline.clone())
                .push_bind(expert.summary.clone())
                .push_bind(expert.reasoning.clone())
                .push_bind(expert.for_query.clone())
                .push_bind(expert.rank)
                .push_bind(expert.raw_json.clone());
        });

        let result = builder.build().execute(pool).await?;
        Ok(result.rows_affected())
    }
}
