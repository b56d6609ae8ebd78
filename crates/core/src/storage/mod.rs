use crate::domain::forecast::ForecastRecord;
use crate::domain::snapshot::DailySnapshot;
use anyhow::Context;
use chrono::NaiveDate;

pub mod documents;
pub mod memory;
pub mod runs;

pub use documents::PgDocumentStore;
pub use memory::MemoryStore;

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}

/// Date-keyed document store holding the snapshot and forecast collections.
///
/// Saving a key that already exists replaces the document.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn save_snapshot(&self, key: NaiveDate, snapshot: &DailySnapshot) -> anyhow::Result<()>;

    /// The `limit` most recent snapshots by snapshot date, newest first.
    async fn latest_snapshots(&self, limit: usize) -> anyhow::Result<Vec<DailySnapshot>>;

    async fn save_forecast(&self, key: NaiveDate, record: &ForecastRecord) -> anyhow::Result<()>;
}
