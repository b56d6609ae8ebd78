//! Per-series price forecasting.
//!
//! Each series gets exactly one next-value prediction:
//! - no samples: `Prediction::NoData`
//! - fewer than `MIN_MODEL_SAMPLES`: the sample mean
//! - otherwise: an ARIMA(1,1,1) one-step forecast
//!
//! A failed model fit is returned as an error and is not downgraded to the mean.

pub mod arima;
pub mod record;
pub mod series;

use crate::domain::forecast::{ForecastResult, Prediction, PriceSeries};

pub use record::assemble_record;
pub use series::assemble_series;

/// Series shorter than this are forecast with their mean.
pub const MIN_MODEL_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelFitError {
    #[error("series contains non-finite prices")]
    NonFiniteInput,

    #[error("series too short for ARIMA(1,1,1): need {required} samples, got {actual}")]
    TooShort { required: usize, actual: usize },

    #[error("degenerate series: differenced prices have zero variance")]
    Degenerate,

    #[error("no admissible ARIMA(1,1,1) parameters: likelihood is not finite anywhere")]
    NoAdmissibleParameters,
}

pub fn forecast(samples: &[f64]) -> Result<Prediction, ModelFitError> {
    if samples.is_empty() {
        return Ok(Prediction::NoData);
    }

    if samples.len() < MIN_MODEL_SAMPLES {
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        return Ok(Prediction::Value(round2(mean)));
    }

    let fit = arima::fit(samples)?;
    let next = fit.forecast_next();
    if !next.is_finite() {
        return Err(ModelFitError::NoAdmissibleParameters);
    }
    Ok(Prediction::Value(round2(next)))
}

pub fn forecast_series(series: &PriceSeries) -> Result<ForecastResult, ModelFitError> {
    let predicted = forecast(&series.samples).map_err(|err| {
        tracing::error!(
            region = %series.region,
            fuel_type = %series.fuel_type,
            samples = series.samples.len(),
            error = %err,
            "model fit failed"
        );
        err
    })?;

    Ok(ForecastResult {
        region: series.region.clone(),
        fuel_type: series.fuel_type.clone(),
        samples: series.samples.clone(),
        predicted,
    })
}

/// Rounds to 2 decimals on the exact value of `v`, ties to even.
fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if (scaled - scaled.trunc()).abs() != 0.5 {
        return scaled.round() / 100.0;
    }

    // The product landed on a half; the fma residual says which side the exact product is on.
    let residual = v.mul_add(100.0, -scaled);
    let rounded = if residual > 0.0 {
        scaled + 0.5
    } else if residual < 0.0 {
        scaled - 0.5
    } else {
        scaled.round_ties_even()
    };
    rounded / 100.0
}
