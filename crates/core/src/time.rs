use anyhow::Context;
use chrono::{Duration, NaiveDate};

/// Date a run is filed under: an explicit `YYYY-MM-DD` override, else `today`.
pub fn resolve_run_date(
    run_date_arg: Option<&str>,
    today: NaiveDate,
) -> anyhow::Result<NaiveDate> {
    match run_date_arg {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid run date {s:?} (expected YYYY-MM-DD)")),
        None => Ok(today),
    }
}

/// Local calendar date of the host, used when no override is given.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn next_date(run_date: NaiveDate) -> NaiveDate {
    run_date + Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_date_wins() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let d = resolve_run_date(Some("2026-02-28"), today).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(next_date(d), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(resolve_run_date(None, today).unwrap(), today);
    }

    #[test]
    fn rejects_non_iso_dates() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(resolve_run_date(Some("18/10/2026"), today).is_err());
    }
}
