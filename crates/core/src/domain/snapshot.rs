use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One day's regional average prices, as published by the feed.
///
/// Region, fuel type and service type are stored lower-cased. Each
/// (region, fuel type) pair holds at most one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub regions: BTreeMap<String, BTreeMap<String, PriceEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub price: f64,
    #[serde(rename = "type")]
    pub service_type: String,
}

impl DailySnapshot {
    pub fn price(&self, region: &str, fuel_type: &str) -> Option<f64> {
        self.regions
            .get(region)
            .and_then(|fuels| fuels.get(fuel_type))
            .map(|entry| entry.price)
    }

    pub fn entry_count(&self) -> usize {
        self.regions.values().map(BTreeMap::len).sum()
    }
}
