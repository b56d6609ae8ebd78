pub mod domain;
pub mod forecast;
pub mod ingest;
pub mod pipeline;
pub mod storage;
pub mod time;

pub mod config {
    use crate::pipeline::RunParams;
    use anyhow::Context;
    use chrono::NaiveDate;
    use std::str::FromStr;

    pub const DEFAULT_FEED_URL: &str =
        "https://www.mimit.gov.it/images/stories/carburanti/MediaRegionaleStradale.csv";
    pub const DEFAULT_FORECAST_WINDOW: usize = 30;
    pub const DEFAULT_SNAPSHOT_COLLECTION: &str = "fuel_data";
    pub const DEFAULT_FORECAST_COLLECTION: &str = "fuel_data_forecast";
    pub const DEFAULT_FUEL_TYPES: [&str; 4] = ["benzina", "gasolio", "gpl", "metano"];
    const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_FEED_RETRIES: u32 = 3;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub feed_url: String,
        pub feed_timeout_secs: u64,
        pub feed_retries: u32,
        pub forecast_window: usize,
        pub forecast_enabled: bool,
        pub fuel_types: Vec<String>,
        pub snapshot_collection: String,
        pub forecast_collection: String,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let forecast_window: usize =
                parse_or(var("FORECAST_WINDOW"), "FORECAST_WINDOW", DEFAULT_FORECAST_WINDOW)?;
            anyhow::ensure!(forecast_window >= 1, "FORECAST_WINDOW must be >= 1");

            let fuel_types = match var("FORECAST_FUEL_TYPES") {
                Some(s) => parse_fuel_types(&s),
                None => DEFAULT_FUEL_TYPES.iter().map(|s| s.to_string()).collect(),
            };
            anyhow::ensure!(
                !fuel_types.is_empty(),
                "FORECAST_FUEL_TYPES must name at least one fuel type"
            );

            Ok(Self {
                database_url: var("DATABASE_URL"),
                sentry_dsn: var("SENTRY_DSN"),
                feed_url: var("CSV_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
                feed_timeout_secs: parse_or(
                    var("FEED_TIMEOUT_SECS"),
                    "FEED_TIMEOUT_SECS",
                    DEFAULT_FEED_TIMEOUT_SECS,
                )?,
                feed_retries: parse_or(var("FEED_RETRIES"), "FEED_RETRIES", DEFAULT_FEED_RETRIES)?,
                forecast_window,
                forecast_enabled: var("FORECAST_IS_ENABLED")
                    .map_or(true, |s| s.trim().eq_ignore_ascii_case("true")),
                fuel_types,
                snapshot_collection: var("SNAPSHOT_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_SNAPSHOT_COLLECTION.to_string()),
                forecast_collection: var("FORECAST_COLLECTION")
                    .unwrap_or_else(|| DEFAULT_FORECAST_COLLECTION.to_string()),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn run_params(&self, run_date: NaiveDate) -> RunParams {
            RunParams {
                run_date,
                window: self.forecast_window,
                forecast_enabled: self.forecast_enabled,
                fuel_types: self.fuel_types.clone(),
            }
        }
    }

    fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match value {
            Some(s) => s
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key}={s:?} is invalid: {e}")),
            None => Ok(default),
        }
    }

    fn parse_fuel_types(s: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for part in s.split(',') {
            let fuel = part.trim().to_lowercase();
            if !fuel.is_empty() && !out.contains(&fuel) {
                out.push(fuel);
            }
        }
        out
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let env: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| env.get(key).cloned())
        }

        #[test]
        fn defaults_when_unset() {
            let s = settings(&[]).unwrap();
            assert_eq!(s.feed_url, DEFAULT_FEED_URL);
            assert_eq!(s.forecast_window, 30);
            assert!(s.forecast_enabled);
            assert_eq!(s.fuel_types, vec!["benzina", "gasolio", "gpl", "metano"]);
            assert_eq!(s.snapshot_collection, "fuel_data");
            assert_eq!(s.forecast_collection, "fuel_data_forecast");
            assert!(s.require_database_url().is_err());
        }

        #[test]
        fn reads_overrides() {
            let s = settings(&[
                ("FORECAST_WINDOW", "7"),
                ("FORECAST_IS_ENABLED", "False"),
                ("FORECAST_FUEL_TYPES", " Benzina, gpl ,,benzina"),
                ("DATABASE_URL", "postgres://localhost/carburanti"),
            ])
            .unwrap();
            assert_eq!(s.forecast_window, 7);
            assert!(!s.forecast_enabled);
            assert_eq!(s.fuel_types, vec!["benzina", "gpl"]);
            assert_eq!(
                s.require_database_url().unwrap(),
                "postgres://localhost/carburanti"
            );

            let params = s.run_params(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
            assert_eq!(params.window, 7);
            assert!(!params.forecast_enabled);
        }

        #[test]
        fn rejects_invalid_window() {
            assert!(settings(&[("FORECAST_WINDOW", "thirty")]).is_err());
            assert!(settings(&[("FORECAST_WINDOW", "0")]).is_err());
        }
    }
}
