use super::repository::LocalArtifact;
use super::sarima::SarimaForecaster;
use super::tabular::TabularRegressor;
use super::trend_seasonal::TrendSeasonalForecaster;
use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureTable;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Model family of an artifact. Always chosen by the caller, never inferred
/// from the artifact's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Tabular,
    Sarima,
    TrendSeasonal,
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFamily::Tabular => "tabular",
            ModelFamily::Sarima => "sarima",
            ModelFamily::TrendSeasonal => "trend_seasonal",
        };
        write!(f, "{}", name)
    }
}

/// What a model is asked to predict from.
#[derive(Debug, Clone, Copy)]
pub enum ModelInput<'a> {
    /// Feature table; tabular models read its latest row.
    Features(&'a FeatureTable),
    /// Number of steps past the fitted history.
    Steps(usize),
    /// Observed series to continue, and the number of steps to forecast.
    Continuation { history: &'a [f64], steps: usize },
    /// Calendar dates to evaluate.
    Dates(&'a [NaiveDate]),
}

impl ModelInput<'_> {
    fn kind(&self) -> &'static str {
        match self {
            ModelInput::Features(_) => "features",
            ModelInput::Steps(_) => "steps",
            ModelInput::Continuation { .. } => "continuation",
            ModelInput::Dates(_) => "dates",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Point(f64),
    Series(Vec<f64>),
}

impl ModelOutput {
    pub fn into_point(self) -> Result<f64, PipelineError> {
        match self {
            ModelOutput::Point(v) => Ok(v),
            ModelOutput::Series(_) => Err(PipelineError::prediction("expected a point estimate, got a series")),
        }
    }

    pub fn into_series(self) -> Result<Vec<f64>, PipelineError> {
        match self {
            ModelOutput::Series(v) => Ok(v),
            ModelOutput::Point(_) => Err(PipelineError::prediction("expected a series, got a point estimate")),
        }
    }
}

/// A deserialized model, created fresh for each pipeline invocation.
pub enum LoadedModel {
    Tabular(TabularRegressor),
    Sarima(SarimaForecaster),
    TrendSeasonal(TrendSeasonalForecaster),
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedModel::Tabular(m) => f.debug_tuple("Tabular").field(m).finish(),
            LoadedModel::Sarima(m) => f
                .debug_struct("Sarima")
                .field("order", &m.order())
                .field("seasonal_order", &m.seasonal_order())
                .finish(),
            LoadedModel::TrendSeasonal(_) => f.write_str("TrendSeasonal"),
        }
    }
}

impl LoadedModel {
    pub fn family(&self) -> ModelFamily {
        match self {
            LoadedModel::Tabular(_) => ModelFamily::Tabular,
            LoadedModel::Sarima(_) => ModelFamily::Sarima,
            LoadedModel::TrendSeasonal(_) => ModelFamily::TrendSeasonal,
        }
    }

    pub fn predict(&self, input: ModelInput<'_>) -> Result<ModelOutput, PipelineError> {
        match (self, input) {
            (LoadedModel::Tabular(m), ModelInput::Features(table)) => {
                m.predict(table).map(ModelOutput::Point)
            }
            (LoadedModel::Sarima(m), ModelInput::Steps(steps)) => {
                m.forecast(steps).map(ModelOutput::Series)
            }
            (LoadedModel::Sarima(m), ModelInput::Continuation { history, steps }) => {
                m.forecast_from(history, steps).map(ModelOutput::Series)
            }
            (LoadedModel::TrendSeasonal(m), ModelInput::Dates(dates)) => {
                m.predict(dates).map(ModelOutput::Series)
            }
            (model, input) => Err(PipelineError::prediction(format!(
                "{} model cannot predict from {} input",
                model.family(),
                input.kind()
            ))),
        }
    }
}

fn parse<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, PipelineError> {
    serde_json::from_slice(bytes).map_err(|e| PipelineError::ModelLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Deserializes the artifact as a model of `family`.
pub async fn load(
    artifact: &LocalArtifact,
    family: ModelFamily,
) -> Result<LoadedModel, PipelineError> {
    load_path(artifact.path(), family).await
}

/// Deserializes the file at `path` as a model of `family`.
pub async fn load_path(path: &Path, family: ModelFamily) -> Result<LoadedModel, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::ModelLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let (model, checked) = match family {
        ModelFamily::Tabular => {
            let m: TabularRegressor = parse(path, &bytes)?;
            let checked = m.validate();
            (LoadedModel::Tabular(m), checked)
        }
        ModelFamily::Sarima => {
            let m: SarimaForecaster = parse(path, &bytes)?;
            let checked = m.validate();
            (LoadedModel::Sarima(m), checked)
        }
        ModelFamily::TrendSeasonal => {
            let m: TrendSeasonalForecaster = parse(path, &bytes)?;
            let checked = m.validate();
            (LoadedModel::TrendSeasonal(m), checked)
        }
    };

    checked.map_err(|reason| PipelineError::ModelLoad {
        path: path.display().to_string(),
        reason,
    })?;

    info!("Loaded {} model from {:?}", family, path);
    Ok(model)
}
