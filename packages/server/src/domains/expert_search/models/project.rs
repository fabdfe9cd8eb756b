use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// The expert-search tracking columns of a `projects` row.
///
/// Only `clado_status` and `clado_polling_count` are written by this service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectTracking {
    pub id: Uuid,
    pub clado_status: Option<String>,
    pub clado_polling_count: Option<i32>,
}

impl ProjectTracking {
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, clado_status, clado_polling_count FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Write whichever tracking columns are given; `None` leaves a column as is.
    pub async fn update(
        id: Uuid,
        status: Option<&str>,
        polling_count: Option<i32>,
        pool: &PgPool,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE projects
             SET clado_status = COALESCE($2, clado_status),
                 clado_polling_count = COALESCE($3, clado_polling_count)
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(polling_count)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
