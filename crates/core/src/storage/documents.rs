use crate::domain::forecast::ForecastRecord;
use crate::domain::snapshot::DailySnapshot;
use crate::storage::DocumentStore;
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::Value;

/// `DocumentStore` over the Postgres `documents` table, one row per
/// (collection, date key).
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: sqlx::PgPool,
    snapshot_collection: String,
    forecast_collection: String,
}

impl PgDocumentStore {
    pub fn new(
        pool: sqlx::PgPool,
        snapshot_collection: impl Into<String>,
        forecast_collection: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            snapshot_collection: snapshot_collection.into(),
            forecast_collection: forecast_collection.into(),
        }
    }

    async fn upsert(&self, collection: &str, key: NaiveDate, body: Value) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO documents (collection, doc_key, body, updated_at) \
             VALUES ($1, $2, $3, now()) \
             ON CONFLICT (collection, doc_key) DO UPDATE \
               SET body = EXCLUDED.body, updated_at = now()",
        )
        .persistent(false)
        .bind(collection)
        .bind(key)
        .bind(body)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert documents failed (collection={collection}, key={key})"))?;

        tracing::info!(collection, %key, "document saved");
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn save_snapshot(&self, key: NaiveDate, snapshot: &DailySnapshot) -> anyhow::Result<()> {
        let body = serde_json::to_value(snapshot).context("serialize snapshot failed")?;
        self.upsert(&self.snapshot_collection, key, body).await
    }

    async fn latest_snapshots(&self, limit: usize) -> anyhow::Result<Vec<DailySnapshot>> {
        let limit = i64::try_from(limit).context("snapshot window too large")?;
        let rows = sqlx::query_as::<_, (NaiveDate, Value)>(
            "SELECT doc_key, body \
             FROM documents \
             WHERE collection = $1 \
             ORDER BY body->>'date' DESC, doc_key DESC \
             LIMIT $2",
        )
        .persistent(false)
        .bind(&self.snapshot_collection)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("select latest snapshots failed")?;

        let mut out = Vec::with_capacity(rows.len());
        for (key, body) in rows {
            let snapshot = serde_json::from_value::<DailySnapshot>(body)
                .with_context(|| format!("stored snapshot {key} does not match DailySnapshot"))?;
            out.push(snapshot);
        }

        tracing::info!(
            collection = %self.snapshot_collection,
            requested = limit,
            retrieved = out.len(),
            "latest snapshots retrieved"
        );
        Ok(out)
    }

    async fn save_forecast(&self, key: NaiveDate, record: &ForecastRecord) -> anyhow::Result<()> {
        let body = serde_json::to_value(record).context("serialize forecast record failed")?;
        self.upsert(&self.forecast_collection, key, body).await
    }
}
