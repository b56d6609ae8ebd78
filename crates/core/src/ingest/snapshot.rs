use crate::domain::snapshot::{DailySnapshot, PriceEntry};
use crate::ingest::types::RawFeed;
use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

const HEADER_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("row {row}: expected 4 ';'-separated fields, found {found}: {raw:?}")]
    FieldCount {
        row: usize,
        found: usize,
        raw: String,
    },

    #[error("row {row}: empty {field} field: {raw:?}")]
    EmptyField {
        row: usize,
        field: &'static str,
        raw: String,
    },

    #[error("row {row}: invalid price {value:?}")]
    InvalidPrice { row: usize, value: String },

    #[error("no date found in feed header {header:?}")]
    MissingDate { header: String },
}

/// Build the day's snapshot from a decoded feed.
///
/// A single malformed row rejects the whole batch. When a (region, fuel type)
/// pair repeats, the first row wins and later ones are dropped.
pub fn build_snapshot(feed: &RawFeed) -> Result<DailySnapshot, ParseError> {
    let date = parse_header_date(&feed.header)?;

    let mut regions: BTreeMap<String, BTreeMap<String, PriceEntry>> = BTreeMap::new();
    let mut duplicates: usize = 0;

    for (idx, raw) in feed.rows.iter().enumerate() {
        let row = parse_row(idx + 1, raw)?;

        match regions.entry(row.region).or_default().entry(row.fuel_type) {
            Entry::Vacant(slot) => {
                slot.insert(PriceEntry {
                    price: row.price,
                    service_type: row.service_type,
                });
            }
            Entry::Occupied(slot) => {
                duplicates += 1;
                tracing::debug!(
                    row = idx + 1,
                    fuel_type = %slot.key(),
                    "duplicate region/fuel row dropped"
                );
            }
        }
    }

    if regions.is_empty() {
        tracing::warn!(%date, "feed contained no price rows");
    }

    let snapshot = DailySnapshot { date, regions };
    tracing::info!(
        %date,
        rows = feed.rows.len(),
        regions = snapshot.regions.len(),
        entries = snapshot.entry_count(),
        duplicates,
        "snapshot built"
    );
    Ok(snapshot)
}

#[derive(Debug)]
struct FeedRow {
    region: String,
    fuel_type: String,
    service_type: String,
    price: f64,
}

fn parse_row(row: usize, raw: &str) -> Result<FeedRow, ParseError> {
    let fields: Vec<&str> = raw.trim().split(';').map(str::trim).collect();
    let [region, fuel_type, service_type, price] = fields.as_slice() else {
        return Err(ParseError::FieldCount {
            row,
            found: fields.len(),
            raw: raw.to_string(),
        });
    };

    for (field, value) in [
        ("region", region),
        ("fuel type", fuel_type),
        ("service type", service_type),
        ("price", price),
    ] {
        if value.is_empty() {
            return Err(ParseError::EmptyField {
                row,
                field,
                raw: raw.to_string(),
            });
        }
    }

    let price = parse_price(price).ok_or_else(|| ParseError::InvalidPrice {
        row,
        value: price.to_string(),
    })?;

    Ok(FeedRow {
        region: region.to_lowercase(),
        fuel_type: fuel_type.to_lowercase(),
        service_type: service_type.to_lowercase(),
        price,
    })
}

fn parse_price(s: &str) -> Option<f64> {
    let v = s.replace(',', ".").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_header_date(header: &str) -> Result<NaiveDate, ParseError> {
    header
        .split_whitespace()
        .find_map(|token| {
            HEADER_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
        })
        .ok_or_else(|| ParseError::MissingDate {
            header: header.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(rows: &[&str]) -> RawFeed {
        RawFeed::new(
            "Aggiornamento 2026-10-18",
            rows.iter().map(|r| r.to_string()).collect(),
        )
    }

    #[test]
    fn normalizes_keys_and_attaches_header_date() {
        let snapshot = build_snapshot(&feed(&[
            "  Lazio ;Benzina;SELF;1.812",
            "Valle D'Aosta;GPL;Servito;0,789",
        ]))
        .unwrap();

        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(snapshot.price("lazio", "benzina"), Some(1.812));
        assert_eq!(snapshot.price("valle d'aosta", "gpl"), Some(0.789));

        for (region, fuels) in &snapshot.regions {
            assert_eq!(region, &region.to_lowercase());
            for (fuel, entry) in fuels {
                assert_eq!(fuel, &fuel.to_lowercase());
                assert_eq!(entry.service_type, entry.service_type.to_lowercase());
            }
        }
    }

    #[test]
    fn first_occurrence_of_a_pair_wins() {
        let snapshot = build_snapshot(&feed(&[
            "Lazio;Benzina;self;1.812",
            "Lazio;Benzina;servito;1.950",
            "LAZIO;benzina;self;1.700",
        ]))
        .unwrap();

        let entry = &snapshot.regions["lazio"]["benzina"];
        assert_eq!(entry.price, 1.812);
        assert_eq!(entry.service_type, "self");
        assert_eq!(snapshot.entry_count(), 1);
    }

    #[test]
    fn one_malformed_row_rejects_the_batch() {
        let err = build_snapshot(&feed(&[
            "Lazio;Benzina;self;1.812",
            "Lazio;Gasolio;1.700",
            "Molise;Benzina;self;1.830",
        ]))
        .unwrap_err();

        assert_eq!(
            err,
            ParseError::FieldCount {
                row: 2,
                found: 3,
                raw: "Lazio;Gasolio;1.700".to_string(),
            }
        );
    }

    #[test]
    fn rejects_extra_fields_and_bad_prices() {
        assert!(matches!(
            build_snapshot(&feed(&["Lazio;Benzina;self;1.812;x"])),
            Err(ParseError::FieldCount { found: 5, .. })
        ));
        assert!(matches!(
            build_snapshot(&feed(&["Lazio;Benzina;self;n/d"])),
            Err(ParseError::InvalidPrice { row: 1, .. })
        ));
        assert!(matches!(
            build_snapshot(&feed(&["Lazio;;self;1.812"])),
            Err(ParseError::EmptyField { field: "fuel type", .. })
        ));
    }

    #[test]
    fn header_date_accepts_italian_format() {
        let raw = RawFeed::new("Aggiornamento del 18/10/2026", vec![]);
        let snapshot = build_snapshot(&raw).unwrap();
        assert_eq!(snapshot.date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(snapshot.regions.is_empty());
    }

    #[test]
    fn missing_header_date_is_a_parse_error() {
        let raw = RawFeed::new("Prezzi medi regionali", vec!["Lazio;Benzina;self;1.8".into()]);
        assert!(matches!(
            build_snapshot(&raw),
            Err(ParseError::MissingDate { .. })
        ));
    }
}
