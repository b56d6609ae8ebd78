use crate::domain::forecast::{ForecastRecord, ForecastResult};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Wrap per-fuel results into the stored forecast document.
///
/// Every fuel type passed in gets a key, even with no results. `next_date` is
/// `run_date + 1 day`, the day being forecast under daily snapshots.
pub fn assemble_record(
    run_date: NaiveDate,
    per_fuel: impl IntoIterator<Item = (String, Vec<ForecastResult>)>,
) -> ForecastRecord {
    let fuels = per_fuel
        .into_iter()
        .map(|(fuel_type, results)| {
            let by_region: BTreeMap<String, ForecastResult> = results
                .into_iter()
                .map(|r| (r.region.clone(), r))
                .collect();
            (fuel_type, by_region)
        })
        .collect();

    ForecastRecord {
        current_date: run_date,
        next_date: crate::time::next_date(run_date),
        fuels,
    }
}
