use crate::domain::errors::PipelineError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Additive Fourier seasonality with a period in days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    pub period_days: f64,
    pub fourier_order: usize,
    /// `[sin_1, cos_1, sin_2, cos_2, ...]`, scaled like the target.
    pub coefficients: Vec<f64>,
}

impl Seasonality {
    /// Contribution at `t_days` (days since 1970-01-01), target-scaled.
    fn value(&self, t_days: f64) -> f64 {
        (0..self.fourier_order)
            .map(|i| {
                let x = 2.0 * (i + 1) as f64 * PI * t_days / self.period_days;
                self.coefficients[2 * i] * x.sin() + self.coefficients[2 * i + 1] * x.cos()
            })
            .sum()
    }
}

/// Piecewise-linear trend with changepoints plus Fourier seasonalities.
///
/// Time is scaled as `t = (date - start) / t_scale` for the trend; the
/// trend and seasonal parts are both multiplied by `y_scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSeasonalForecaster {
    start: NaiveDate,
    t_scale: f64,
    y_scale: f64,
    k: f64,
    m: f64,
    #[serde(default)]
    changepoints_t: Vec<f64>,
    #[serde(default)]
    deltas: Vec<f64>,
    #[serde(default)]
    seasonalities: Vec<Seasonality>,
}

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

impl TrendSeasonalForecaster {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start: NaiveDate,
        t_scale: f64,
        y_scale: f64,
        k: f64,
        m: f64,
        changepoints_t: Vec<f64>,
        deltas: Vec<f64>,
        seasonalities: Vec<Seasonality>,
    ) -> Self {
        Self {
            start,
            t_scale,
            y_scale,
            k,
            m,
            changepoints_t,
            deltas,
            seasonalities,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.t_scale > 0.0) {
            return Err(format!("t_scale must be positive, got {}", self.t_scale));
        }
        if self.changepoints_t.len() != self.deltas.len() {
            return Err(format!(
                "{} changepoints but {} deltas",
                self.changepoints_t.len(),
                self.deltas.len()
            ));
        }
        for s in &self.seasonalities {
            if !(s.period_days > 0.0) {
                return Err(format!("seasonality '{}' has a non-positive period", s.name));
            }
            if s.coefficients.len() != 2 * s.fourier_order {
                return Err(format!(
                    "seasonality '{}' of order {} has {} coefficients",
                    s.name,
                    s.fourier_order,
                    s.coefficients.len()
                ));
            }
        }
        Ok(())
    }

    fn trend(&self, t: f64) -> f64 {
        let mut rate = self.k;
        let mut offset = self.m;
        for (cp, delta) in self.changepoints_t.iter().zip(&self.deltas) {
            if t >= *cp {
                rate += delta;
                offset -= cp * delta;
            }
        }
        rate * t + offset
    }

    /// One value per requested date.
    pub fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<f64>, PipelineError> {
        self.validate().map_err(PipelineError::prediction)?;

        Ok(dates
            .iter()
            .map(|date| {
                let t = (*date - self.start).num_days() as f64 / self.t_scale;
                let t_days = (*date - epoch()).num_days() as f64;
                let seasonal: f64 = self.seasonalities.iter().map(|s| s.value(t_days)).sum();
                (self.trend(t) + seasonal) * self.y_scale
            })
            .collect())
    }
}
