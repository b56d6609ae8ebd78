use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

pub async fn record_run(
    pool: &sqlx::PgPool,
    run_date: NaiveDate,
    status: RunStatus,
    error: Option<&str>,
    summary: Option<Value>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let finished_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO ingest_runs (id, run_date, finished_at, status, error, summary) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(id)
    .bind(run_date)
    .bind(finished_at)
    .bind(status.as_str())
    .bind(error)
    .bind(summary)
    .execute(pool)
    .await
    .context("insert ingest_runs failed")?;

    Ok(id)
}
