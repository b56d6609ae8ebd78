//! ARIMA(1,1,1) estimation for short daily price series.
//!
//! The series is differenced once and a zero-mean ARMA(1,1)
//!
//! ```text
//! x_t = phi * x_{t-1} + e_t + theta * e_{t-1}
//! ```
//!
//! is fitted to the differences by exact Gaussian maximum likelihood. The
//! likelihood is evaluated with a Kalman filter over the state-space form
//!
//! ```text
//! a_{t+1} = T a_t + R e_{t+1},   T = [[phi, 1], [0, 0]],   R = [1, theta]'
//! x_t     = [1, 0] a_t
//! ```
//!
//! with the innovation variance concentrated out. The filter starts from the
//! stationary state covariance, solved from `P = T P T' + R R'`.
//!
//! Parameters are kept inside `[-PARAM_BOUND, PARAM_BOUND]` (stationary and
//! invertible) and searched with a deterministic grid: a coarse pass over the
//! full square, then two finer passes around the incumbent. Windows are a few
//! dozen points, so a few thousand filter passes are cheap.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use super::ModelFitError;

const PARAM_BOUND: f64 = 0.98;

/// (step, half-width in steps) for each search pass.
const SEARCH_PASSES: [(f64, i32); 3] = [(0.04, 24), (0.004, 10), (0.0004, 10)];

/// Minimum number of differences needed to estimate two parameters.
pub const MIN_DIFFERENCES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    pub phi: f64,
    pub theta: f64,
    /// Innovation variance estimate.
    pub sigma2: f64,
    /// `n ln(sigma2) + sum(ln f_t)`, the concentrated objective (lower is better).
    pub objective: f64,
    next_difference: f64,
    last_level: f64,
}

impl ArimaFit {
    /// One-step-ahead forecast on the original (undifferenced) scale.
    pub fn forecast_next(&self) -> f64 {
        self.last_level + self.next_difference
    }
}

pub fn fit(samples: &[f64]) -> Result<ArimaFit, ModelFitError> {
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::NonFiniteInput);
    }

    let diffs: Vec<f64> = samples.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.len() < MIN_DIFFERENCES {
        return Err(ModelFitError::TooShort {
            required: MIN_DIFFERENCES + 1,
            actual: samples.len(),
        });
    }

    if diffs.iter().all(|d| d.abs() < f64::EPSILON) {
        return Err(ModelFitError::Degenerate);
    }

    let mut best: Option<(f64, f64, Evaluation)> = None;
    let mut center = (0.0, 0.0);

    for (step, half) in SEARCH_PASSES {
        for i in -half..=half {
            for j in -half..=half {
                let phi = clamp_param(center.0 + f64::from(i) * step);
                let theta = clamp_param(center.1 + f64::from(j) * step);
                let Some(eval) = evaluate(phi, theta, &diffs) else {
                    continue;
                };
                let improves = best
                    .as_ref()
                    .map_or(true, |(_, _, b)| eval.objective < b.objective);
                if improves {
                    best = Some((phi, theta, eval));
                }
            }
        }

        match &best {
            Some((phi, theta, _)) => center = (*phi, *theta),
            None => return Err(ModelFitError::NoAdmissibleParameters),
        }
    }

    let (phi, theta, eval) = best.ok_or(ModelFitError::NoAdmissibleParameters)?;
    let last_level = samples[samples.len() - 1];

    tracing::debug!(
        phi,
        theta,
        sigma2 = eval.sigma2,
        objective = eval.objective,
        n = samples.len(),
        "ARIMA(1,1,1) fitted"
    );

    Ok(ArimaFit {
        phi,
        theta,
        sigma2: eval.sigma2,
        objective: eval.objective,
        next_difference: eval.next_difference,
        last_level,
    })
}

fn clamp_param(v: f64) -> f64 {
    v.clamp(-PARAM_BOUND, PARAM_BOUND)
}

#[derive(Debug, Clone)]
struct Evaluation {
    objective: f64,
    sigma2: f64,
    next_difference: f64,
}

/// Run the Kalman filter for one parameter pair.
///
/// Returns `None` when the pair yields a non-positive innovation variance or a
/// non-finite objective.
fn evaluate(phi: f64, theta: f64, diffs: &[f64]) -> Option<Evaluation> {
    let t = Matrix2::new(phi, 1.0, 0.0, 0.0);
    let r = Vector2::new(1.0, theta);
    let q = r * r.transpose();

    let mut p = stationary_covariance(&t, &q)?;
    let mut a = Vector2::zeros();

    let mut sum_ln_f = 0.0;
    let mut sum_v2_f = 0.0;

    for &x in diffs {
        let f = p[(0, 0)];
        if !(f.is_finite() && f > 0.0) {
            return None;
        }

        let v = x - a[0];
        let k = t * p.column(0) / f;

        sum_ln_f += f.ln();
        sum_v2_f += v * v / f;

        a = t * a + k * v;
        p = t * p * t.transpose() - k * k.transpose() * f + q;
    }

    let n = diffs.len() as f64;
    let sigma2 = sum_v2_f / n;
    if !(sigma2.is_finite() && sigma2 > 0.0) {
        return None;
    }

    let objective = n * sigma2.ln() + sum_ln_f;
    if !objective.is_finite() || !a[0].is_finite() {
        return None;
    }

    Some(Evaluation {
        objective,
        sigma2,
        next_difference: a[0],
    })
}

/// Solve `P = T P T' + Q` via `(I - T (x) T) vec(P) = vec(Q)`.
fn stationary_covariance(t: &Matrix2<f64>, q: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let t_dyn = DMatrix::from_column_slice(2, 2, t.as_slice());
    let lhs = DMatrix::<f64>::identity(4, 4) - t_dyn.kronecker(&t_dyn);
    let rhs = DVector::from_column_slice(q.as_slice());

    let x = lhs.lu().solve(&rhs)?;
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }

    // vec() is column-major: [p00, p10, p01, p11].
    Some(Matrix2::new(x[0], x[2], x[1], x[3]))
}
