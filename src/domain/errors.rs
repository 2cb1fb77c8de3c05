use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised along the prediction-serving pipeline.
///
/// Infrastructure adapters report failures as `anyhow::Error`; the pipeline
/// stages map them into one of these kinds so callers can decide between
/// degrading to an error payload and propagating.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data fetched for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Not enough data to compute technical indicators: {rows} row(s), need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Model artifact {bucket}/{path} unavailable: {reason}")]
    ArtifactUnavailable {
        bucket: String,
        path: String,
        reason: String,
    },

    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Expected {expected} features, but got {actual}. Missing columns: {missing:?}, unexpected columns: {unexpected:?}")]
    FeatureSchemaMismatch {
        expected: usize,
        actual: usize,
        missing: BTreeSet<String>,
        unexpected: BTreeSet<String>,
    },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },
}

impl PipelineError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn prediction(reason: impl Into<String>) -> Self {
        Self::Prediction {
            reason: reason.into(),
        }
    }

    /// Builds a schema mismatch from the expected and actual column names.
    pub fn schema_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        let expected: Vec<String> = expected.into_iter().map(|s| s.as_ref().to_string()).collect();
        let actual: Vec<String> = actual.into_iter().map(|s| s.as_ref().to_string()).collect();

        let expected_set: BTreeSet<String> = expected.iter().cloned().collect();
        let actual_set: BTreeSet<String> = actual.iter().cloned().collect();

        Self::FeatureSchemaMismatch {
            expected: expected.len(),
            actual: actual.len(),
            missing: expected_set.difference(&actual_set).cloned().collect(),
            unexpected: actual_set.difference(&expected_set).cloned().collect(),
        }
    }

    /// Short machine-friendly name of the error kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::ArtifactUnavailable { .. } => "artifact_unavailable",
            Self::ModelLoad { .. } => "model_load",
            Self::FeatureSchemaMismatch { .. } => "feature_schema_mismatch",
            Self::Prediction { .. } => "prediction",
        }
    }
}
