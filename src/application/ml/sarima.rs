use crate::domain::errors::PipelineError;
use serde::{Deserialize, Serialize};

/// Pre-fitted seasonal ARIMA `(p,d,q)(P,D,Q,s)` model.
///
/// The artifact carries the fitted coefficients together with the series it
/// was fitted on (already log-transformed) and the in-sample residuals, so
/// forecasts continue directly from the end of that history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarimaForecaster {
    order: [usize; 3],
    seasonal_order: [usize; 4],
    #[serde(default)]
    ar_params: Vec<f64>,
    #[serde(default)]
    ma_params: Vec<f64>,
    #[serde(default)]
    seasonal_ar_params: Vec<f64>,
    #[serde(default)]
    seasonal_ma_params: Vec<f64>,
    #[serde(default)]
    constant: f64,
    history: Vec<f64>,
    /// Residuals aligned with the tail of `history`.
    #[serde(default)]
    residuals: Vec<f64>,
}

/// Coefficients of `(1 - B^lag)^power`, in powers of B.
fn difference_poly(lag: usize, power: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..power {
        let mut step = vec![0.0; lag + 1];
        step[0] = 1.0;
        step[lag] -= 1.0;
        poly = poly_mul(&poly, &step);
    }
    poly
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * sum(params[k] * B^((k+1) * lag))`
fn lag_poly(params: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; params.len() * lag + 1];
    poly[0] = 1.0;
    for (k, p) in params.iter().enumerate() {
        poly[(k + 1) * lag] = sign * p;
    }
    poly
}

impl SarimaForecaster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order: [usize; 3],
        seasonal_order: [usize; 4],
        ar_params: Vec<f64>,
        ma_params: Vec<f64>,
        seasonal_ar_params: Vec<f64>,
        seasonal_ma_params: Vec<f64>,
        constant: f64,
        history: Vec<f64>,
        residuals: Vec<f64>,
    ) -> Self {
        Self {
            order,
            seasonal_order,
            ar_params,
            ma_params,
            seasonal_ar_params,
            seasonal_ma_params,
            constant,
            history,
            residuals,
        }
    }

    pub fn order(&self) -> [usize; 3] {
        self.order
    }

    pub fn seasonal_order(&self) -> [usize; 4] {
        self.seasonal_order
    }

    pub fn validate(&self) -> Result<(), String> {
        let [p, _, q] = self.order;
        let [sp, sd, sq, s] = self.seasonal_order;

        if self.ar_params.len() != p {
            return Err(format!("order p={} but {} AR params", p, self.ar_params.len()));
        }
        if self.ma_params.len() != q {
            return Err(format!("order q={} but {} MA params", q, self.ma_params.len()));
        }
        if self.seasonal_ar_params.len() != sp {
            return Err(format!(
                "seasonal P={} but {} seasonal AR params",
                sp,
                self.seasonal_ar_params.len()
            ));
        }
        if self.seasonal_ma_params.len() != sq {
            return Err(format!(
                "seasonal Q={} but {} seasonal MA params",
                sq,
                self.seasonal_ma_params.len()
            ));
        }
        if s == 0 && sp + sd + sq > 0 {
            return Err("seasonal terms with a zero season length".to_string());
        }
        if self.history.is_empty() {
            return Err("empty fitted history".to_string());
        }
        if self.residuals.len() > self.history.len() {
            return Err(format!(
                "{} residuals for {} history points",
                self.residuals.len(),
                self.history.len()
            ));
        }
        Ok(())
    }

    /// Expanded AR side `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D` and MA side
    /// `theta(B) Theta(B^s)`.
    fn polynomials(&self) -> (Vec<f64>, Vec<f64>) {
        let [_, d, _] = self.order;
        let [_, sd, _, s] = self.seasonal_order;
        let season = s.max(1);

        let mut ar = poly_mul(
            &lag_poly(&self.ar_params, 1, -1.0),
            &lag_poly(&self.seasonal_ar_params, season, -1.0),
        );
        ar = poly_mul(&ar, &difference_poly(1, d));
        ar = poly_mul(&ar, &difference_poly(season, sd));

        let ma = poly_mul(
            &lag_poly(&self.ma_params, 1, 1.0),
            &lag_poly(&self.seasonal_ma_params, season, 1.0),
        );
        (ar, ma)
    }

    /// Forecasts `steps` values past the end of the fitted history, on the
    /// same (log) scale. Future shocks are taken as zero.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, PipelineError> {
        let mut e = vec![0.0; self.history.len() - self.residuals.len()];
        e.extend(self.residuals.iter().map(|r| if r.is_finite() { *r } else { 0.0 }));
        self.extend(self.history.clone(), e, steps)
    }

    /// Applies the fitted coefficients to a new `history` (same scale as
    /// the fitted series) and forecasts `steps` values past its end.
    ///
    /// In-sample shocks are rebuilt from one-step-ahead errors, taken as zero
    /// until enough lags are available.
    pub fn forecast_from(&self, history: &[f64], steps: usize) -> Result<Vec<f64>, PipelineError> {
        if history.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::prediction("SARIMA history holds non-finite values"));
        }
        let (ar, ma) = self.polynomials();
        let warmup = (ar.len() - 1).max(ma.len() - 1);

        let mut e = Vec::with_capacity(history.len());
        for t in 0..history.len() {
            if t < warmup {
                e.push(0.0);
                continue;
            }
            let fitted = self.one_step(&ar, &ma, &history[..t], &e);
            e.push(history[t] - fitted);
        }
        self.extend(history.to_vec(), e, steps)
    }

    /// One-step-ahead value after `y`, given shocks `e` aligned with `y`.
    fn one_step(&self, ar: &[f64], ma: &[f64], y: &[f64], e: &[f64]) -> f64 {
        let t = y.len();
        let mut value = self.constant;
        for (k, a) in ar.iter().enumerate().skip(1) {
            value -= a * y[t - k];
        }
        for (k, m) in ma.iter().enumerate().skip(1) {
            if k <= t {
                value += m * e[t - k];
            }
        }
        value
    }

    fn extend(&self, mut y: Vec<f64>, mut e: Vec<f64>, steps: usize) -> Result<Vec<f64>, PipelineError> {
        let (ar, ma) = self.polynomials();
        let ar_lags = ar.len() - 1;
        if y.len() < ar_lags {
            return Err(PipelineError::prediction(format!(
                "SARIMA needs {} history points, got {}",
                ar_lags,
                y.len()
            )));
        }

        let mut out = Vec::with_capacity(steps);
        for _ in 0..steps {
            let value = self.one_step(&ar, &ma, &y, &e);
            y.push(value);
            e.push(0.0);
            out.push(value);
        }
        Ok(out)
    }
}
