use crate::domain::forecast::PriceSeries;
use crate::domain::snapshot::DailySnapshot;
use std::collections::BTreeMap;

/// Group one fuel type's prices by region.
///
/// Snapshots are scanned in the order given (the store returns newest first)
/// and that order is kept in every series. A snapshot missing the pair is
/// skipped, not filled. Regions never priced for `fuel_type` get no entry.
pub fn assemble_series(
    snapshots: &[DailySnapshot],
    fuel_type: &str,
) -> BTreeMap<String, PriceSeries> {
    let mut out: BTreeMap<String, PriceSeries> = BTreeMap::new();

    for snapshot in snapshots {
        for (region, fuels) in &snapshot.regions {
            let Some(entry) = fuels.get(fuel_type) else {
                continue;
            };
            out.entry(region.clone())
                .or_insert_with(|| PriceSeries {
                    region: region.clone(),
                    fuel_type: fuel_type.to_string(),
                    samples: Vec::new(),
                })
                .samples
                .push(entry.price);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::PriceEntry;
    use chrono::NaiveDate;

    fn snapshot(day: u32, prices: &[(&str, &str, f64)]) -> DailySnapshot {
        let mut regions: BTreeMap<String, BTreeMap<String, PriceEntry>> = BTreeMap::new();
        for (region, fuel, price) in prices {
            regions.entry(region.to_string()).or_default().insert(
                fuel.to_string(),
                PriceEntry {
                    price: *price,
                    service_type: "self".to_string(),
                },
            );
        }
        DailySnapshot {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            regions,
        }
    }

    #[test]
    fn keeps_retrieval_order() {
        let docs = vec![
            snapshot(18, &[("lazio", "benzina", 1.80)]),
            snapshot(17, &[("lazio", "benzina", 1.82)]),
            snapshot(16, &[("lazio", "benzina", 1.81)]),
        ];

        let series = assemble_series(&docs, "benzina");
        assert_eq!(series.len(), 1);
        assert_eq!(series["lazio"].samples, vec![1.80, 1.82, 1.81]);
        assert_eq!(series["lazio"].fuel_type, "benzina");
    }

    #[test]
    fn skips_gaps_without_filling() {
        let docs = vec![
            snapshot(18, &[("lazio", "gpl", 0.80), ("molise", "gpl", 0.79)]),
            snapshot(17, &[("lazio", "benzina", 1.82)]),
            snapshot(16, &[("molise", "gpl", 0.78)]),
        ];

        let series = assemble_series(&docs, "gpl");
        assert_eq!(series["lazio"].samples, vec![0.80]);
        assert_eq!(series["molise"].samples, vec![0.79, 0.78]);
    }

    #[test]
    fn regions_without_the_fuel_are_absent() {
        let docs = vec![snapshot(
            18,
            &[("lazio", "benzina", 1.80), ("sardegna", "gasolio", 1.70)],
        )];

        let series = assemble_series(&docs, "metano");
        assert!(series.is_empty());

        let series = assemble_series(&docs, "benzina");
        assert!(series.contains_key("lazio"));
        assert!(!series.contains_key("sardegna"));
    }

    #[test]
    fn accepts_fuel_types_outside_the_tracked_set() {
        let docs = vec![snapshot(18, &[("lazio", "hvo", 1.95)])];
        assert_eq!(assemble_series(&docs, "hvo")["lazio"].samples, vec![1.95]);
    }
}
