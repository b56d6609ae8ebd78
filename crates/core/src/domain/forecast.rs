use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observed prices for one (region, fuel type) pair, in snapshot retrieval order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub region: String,
    pub fuel_type: String,
    pub samples: Vec<f64>,
}

/// Forecast value for one series.
///
/// `NoData` is stored as `-1`, which is never a legitimate price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum Prediction {
    NoData,
    Value(f64),
}

impl Prediction {
    pub const NO_DATA_SENTINEL: f64 = -1.0;

    pub fn value(&self) -> Option<f64> {
        match self {
            Prediction::NoData => None,
            Prediction::Value(v) => Some(*v),
        }
    }
}

impl From<f64> for Prediction {
    fn from(v: f64) -> Self {
        if v == Self::NO_DATA_SENTINEL {
            Prediction::NoData
        } else {
            Prediction::Value(v)
        }
    }
}

impl From<Prediction> for f64 {
    fn from(p: Prediction) -> Self {
        match p {
            Prediction::NoData => Prediction::NO_DATA_SENTINEL,
            Prediction::Value(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub region: String,
    pub fuel_type: String,
    pub samples: Vec<f64>,
    pub predicted: Prediction,
}

/// Output document of a forecasting run: fuel type -> region -> result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub current_date: NaiveDate,
    pub next_date: NaiveDate,
    pub fuels: BTreeMap<String, BTreeMap<String, ForecastResult>>,
}

impl ForecastRecord {
    pub fn get(&self, fuel_type: &str, region: &str) -> Option<&ForecastResult> {
        self.fuels.get(fuel_type).and_then(|regions| regions.get(region))
    }

    pub fn result_count(&self) -> usize {
        self.fuels.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_data_serializes_as_sentinel() {
        let result = ForecastResult {
            region: "molise".to_string(),
            fuel_type: "metano".to_string(),
            samples: vec![],
            predicted: Prediction::NoData,
        };

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["predicted"], json!(-1.0));

        let back: ForecastResult = serde_json::from_value(v).unwrap();
        assert_eq!(back.predicted, Prediction::NoData);
        assert_eq!(back.predicted.value(), None);
    }

    #[test]
    fn value_serializes_as_plain_number() {
        let v = serde_json::to_value(Prediction::Value(1.81)).unwrap();
        assert_eq!(v, json!(1.81));
    }
}
