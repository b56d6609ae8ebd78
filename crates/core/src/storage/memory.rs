use crate::domain::forecast::ForecastRecord;
use crate::domain::snapshot::DailySnapshot;
use crate::storage::DocumentStore;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-process `DocumentStore`, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<BTreeMap<NaiveDate, DailySnapshot>>,
    forecasts: Mutex<BTreeMap<NaiveDate, ForecastRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn forecast(&self, key: NaiveDate) -> Option<ForecastRecord> {
        self.forecasts.lock().await.get(&key).cloned()
    }

    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.lock().await.len()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn save_snapshot(&self, key: NaiveDate, snapshot: &DailySnapshot) -> anyhow::Result<()> {
        self.snapshots.lock().await.insert(key, snapshot.clone());
        Ok(())
    }

    async fn latest_snapshots(&self, limit: usize) -> anyhow::Result<Vec<DailySnapshot>> {
        let guard = self.snapshots.lock().await;
        let mut docs: Vec<(&NaiveDate, &DailySnapshot)> = guard.iter().collect();
        docs.sort_by(|a, b| b.1.date.cmp(&a.1.date).then_with(|| b.0.cmp(a.0)));
        Ok(docs
            .into_iter()
            .take(limit)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }

    async fn save_forecast(&self, key: NaiveDate, record: &ForecastRecord) -> anyhow::Result<()> {
        self.forecasts.lock().await.insert(key, record.clone());
        Ok(())
    }
}
