//! One ingestion + forecasting run, end to end.
//!
//! Stages run strictly in sequence. The first error aborts the run; a snapshot
//! already saved is left in place, and a forecast record is only written once
//! every series has been forecast.

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::forecast::ForecastRecord;
use crate::domain::snapshot::DailySnapshot;
use crate::forecast::{assemble_record, assemble_series, forecast_series, ModelFitError};
use crate::ingest::{build_snapshot, FeedSource};
use crate::storage::DocumentStore;

#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub run_date: NaiveDate,
    /// Number of most recent snapshots used to build series.
    pub window: usize,
    pub forecast_enabled: bool,
    pub fuel_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_date: NaiveDate,
    pub snapshot_date: NaiveDate,
    pub regions: usize,
    pub entries: usize,
    pub snapshots_used: usize,
    pub series: usize,
    pub forecast_written: bool,
}

pub async fn run(
    feed: &dyn FeedSource,
    store: &dyn DocumentStore,
    params: &RunParams,
) -> anyhow::Result<RunSummary> {
    let run_date = params.run_date;

    let raw = feed
        .fetch()
        .await
        .with_context(|| format!("feed retrieval failed (source={})", feed.source_name()))?;
    let snapshot = build_snapshot(&raw)?;

    store
        .save_snapshot(run_date, &snapshot)
        .await
        .context("save snapshot failed")?;

    let mut summary = RunSummary {
        run_date,
        snapshot_date: snapshot.date,
        regions: snapshot.regions.len(),
        entries: snapshot.entry_count(),
        snapshots_used: 0,
        series: 0,
        forecast_written: false,
    };

    if !params.forecast_enabled {
        tracing::info!(%run_date, "forecast disabled");
        return Ok(summary);
    }

    let history = store
        .latest_snapshots(params.window)
        .await
        .context("load snapshot history failed")?;

    let record = build_forecast(run_date, &history, &params.fuel_types)?;

    store
        .save_forecast(run_date, &record)
        .await
        .context("save forecast record failed")?;

    summary.snapshots_used = history.len();
    summary.series = record.result_count();
    summary.forecast_written = true;

    tracing::info!(
        %run_date,
        next_date = %record.next_date,
        snapshots_used = summary.snapshots_used,
        series = summary.series,
        "forecast record saved"
    );
    Ok(summary)
}

/// Forecast every tracked fuel type over `history` (newest first).
pub fn build_forecast(
    run_date: NaiveDate,
    history: &[DailySnapshot],
    fuel_types: &[String],
) -> Result<ForecastRecord, ModelFitError> {
    let mut per_fuel = Vec::with_capacity(fuel_types.len());

    for fuel_type in fuel_types {
        let series = assemble_series(history, fuel_type);
        let results = series
            .values()
            .map(forecast_series)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(%fuel_type, series = results.len(), "fuel type forecast");
        per_fuel.push((fuel_type.clone(), results));
    }

    Ok(assemble_record(run_date, per_fuel))
}
