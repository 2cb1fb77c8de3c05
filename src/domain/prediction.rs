use crate::domain::market::Asset;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of the regression pipeline.
///
/// Serializes either as `{"Prediction BTC": 123.45, "Prediction ETH": 6.78}`
/// or as `{"Error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegressionOutcome {
    Failed {
        #[serde(rename = "Error")]
        error: String,
    },
    Estimates(BTreeMap<String, f64>),
}

impl RegressionOutcome {
    pub fn from_estimates(estimates: &[(Asset, f64)]) -> Self {
        RegressionOutcome::Estimates(
            estimates
                .iter()
                .map(|(asset, value)| (Self::key(*asset), *value))
                .collect(),
        )
    }

    /// Payload key for an asset's point estimate.
    pub fn key(asset: Asset) -> String {
        format!("Prediction {}", asset.label())
    }

    pub fn estimate(&self, asset: Asset) -> Option<f64> {
        match self {
            RegressionOutcome::Estimates(map) => map.get(&Self::key(asset)).copied(),
            RegressionOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RegressionOutcome::Failed { error } => Some(error),
            RegressionOutcome::Estimates(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RegressionOutcome::Estimates(_))
    }
}

/// Observed closes and forecast values of one asset, keyed by calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPair {
    pub historical: BTreeMap<NaiveDate, f64>,
    pub forecast: BTreeMap<NaiveDate, f64>,
}

/// Result of the time-series pipeline, keyed by asset label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeriesPrediction {
    pub assets: BTreeMap<String, SeriesPair>,
}

impl TimeSeriesPrediction {
    pub fn insert(&mut self, asset: Asset, pair: SeriesPair) {
        self.assets.insert(asset.label().to_string(), pair);
    }

    pub fn get(&self, asset: Asset) -> Option<&SeriesPair> {
        self.assets.get(asset.label())
    }
}
