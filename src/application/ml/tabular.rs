use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureTable;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;

pub type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fitted estimator behind a tabular regressor.
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Linear model exported from a fitted regressor (e.g. Bayesian ridge).
    Linear { coefficients: Vec<f64>, intercept: f64 },
    /// smartcore random forest, serialized with serde.
    RandomForest { forest: Forest },
}

impl Estimator {
    fn kind(&self) -> &'static str {
        match self {
            Estimator::Linear { .. } => "linear",
            Estimator::RandomForest { .. } => "random_forest",
        }
    }
}

/// Point regressor over a named feature vector.
///
/// Artifact layout:
/// `{"feature_names": [...], "model": {"kind": "linear", "coefficients": [...], "intercept": 0.0}}`
/// or `{"feature_names": [...], "model": {"kind": "random_forest", "forest": {...}}}`.
#[derive(Serialize, Deserialize)]
pub struct TabularRegressor {
    feature_names: Vec<String>,
    model: Estimator,
}

impl fmt::Debug for TabularRegressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabularRegressor")
            .field("features", &self.feature_names.len())
            .field("estimator", &self.model.kind())
            .finish()
    }
}

impl TabularRegressor {
    pub fn new(feature_names: Vec<String>, model: Estimator) -> Self {
        Self {
            feature_names,
            model,
        }
    }

    pub fn n_features_expected(&self) -> usize {
        self.feature_names.len()
    }

    pub fn expected_feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Structural checks run right after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names.is_empty() {
            return Err("model declares no feature names".to_string());
        }
        if let Estimator::Linear { coefficients, .. } = &self.model
            && coefficients.len() != self.feature_names.len()
        {
            return Err(format!(
                "{} coefficients for {} feature names",
                coefficients.len(),
                self.feature_names.len()
            ));
        }
        Ok(())
    }

    /// Model input built from the latest row of `table`, in the model's
    /// feature order. Gaps in that row become 0.
    pub fn select_features(&self, table: &FeatureTable) -> Result<Vec<f64>, PipelineError> {
        let mismatch = || {
            PipelineError::schema_mismatch(&self.feature_names, table.column_names())
        };

        if table.column_count() != self.feature_names.len() {
            return Err(mismatch());
        }

        let indices = self
            .feature_names
            .iter()
            .map(|name| table.column_index(name))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(mismatch)?;

        let (_, row) = table
            .latest()
            .ok_or_else(|| PipelineError::prediction("feature table has no rows"))?;

        Ok(indices
            .into_iter()
            .map(|i| if row[i].is_finite() { row[i] } else { 0.0 })
            .collect())
    }

    /// Unrounded estimate for one feature vector.
    pub fn predict_raw(&self, features: &[f64]) -> Result<f64, PipelineError> {
        match &self.model {
            Estimator::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != features.len() {
                    return Err(PipelineError::prediction(format!(
                        "linear model has {} coefficients, input has {} values",
                        coefficients.len(),
                        features.len()
                    )));
                }
                Ok(intercept
                    + coefficients
                        .iter()
                        .zip(features)
                        .map(|(c, x)| c * x)
                        .sum::<f64>())
            }
            Estimator::RandomForest { forest } => {
                let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()]).map_err(|e| {
                    PipelineError::prediction(format!("Matrix creation failed: {}", e))
                })?;
                let predictions = forest
                    .predict(&input)
                    .map_err(|e| PipelineError::prediction(e.to_string()))?;
                predictions
                    .first()
                    .copied()
                    .ok_or_else(|| PipelineError::prediction("No prediction returned"))
            }
        }
    }

    /// Estimate for the latest row of `table`, rounded to cents.
    pub fn predict(&self, table: &FeatureTable) -> Result<f64, PipelineError> {
        let features = self.select_features(table)?;
        let raw = self.predict_raw(&features)?;
        if !raw.is_finite() {
            return Err(PipelineError::prediction(format!(
                "model produced a non-finite estimate ({})",
                raw
            )));
        }
        Ok(round_cents(raw))
    }
}

/// Two-decimal rounding, ties to even.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use smartcore::ensemble::random_forest_regressor::RandomForestRegressorParameters;

    fn table(names: &[&str], rows: &[&[f64]]) -> FeatureTable {
        let dates = (0..rows.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap())
            .collect();
        let columns = names
            .iter()
            .enumerate()
            .map(|(c, name)| (name.to_string(), rows.iter().map(|r| r[c]).collect()))
            .collect();
        FeatureTable::from_columns(dates, columns).unwrap()
    }

    fn linear(names: &[&str], coefficients: Vec<f64>, intercept: f64) -> TabularRegressor {
        TabularRegressor::new(
            names.iter().map(|s| s.to_string()).collect(),
            Estimator::Linear {
                coefficients,
                intercept,
            },
        )
    }

    #[test]
    fn test_linear_prediction_uses_latest_row_in_model_order() {
        let model = linear(&["b", "a"], vec![10.0, 1.0], 0.5);
        let t = table(&["a", "b"], &[&[100.0, 100.0], &[2.0, 3.0]]);

        // 10 * b + 1 * a + 0.5
        assert_eq!(model.predict(&t).unwrap(), 32.5);
    }

    #[test]
    fn test_gap_in_latest_row_counts_as_zero() {
        let model = linear(&["a", "b"], vec![1.0, 1.0], 0.0);
        let t = table(&["a", "b"], &[&[1.0, 1.0], &[4.0, f64::NAN]]);
        assert_eq!(model.predict(&t).unwrap(), 4.0);
    }

    #[test]
    fn test_count_mismatch_reports_set_difference() {
        let model = linear(&["a", "b", "c"], vec![1.0; 3], 0.0);
        let t = table(&["a", "b"], &[&[1.0, 2.0]]);

        match model.predict(&t).unwrap_err() {
            PipelineError::FeatureSchemaMismatch {
                expected,
                actual,
                missing,
                unexpected,
            } => {
                assert_eq!((expected, actual), (3, 2));
                assert!(missing.contains("c"));
                assert!(unexpected.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_same_count_different_names_is_mismatch() {
        let model = linear(&["a", "x"], vec![1.0; 2], 0.0);
        let t = table(&["a", "b"], &[&[1.0, 2.0]]);
        assert!(matches!(
            model.predict(&t),
            Err(PipelineError::FeatureSchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        assert_eq!(round_cents(1.234), 1.23);
        assert_eq!(round_cents(2.5 / 100.0), 0.02);
        assert_eq!(round_cents(-7.456), -7.46);
    }

    #[test]
    fn test_estimate_equals_rounded_raw_output() {
        let model = linear(&["a"], vec![0.333], 1.0);
        let t = table(&["a"], &[&[12.345]]);
        let raw = model.predict_raw(&[12.345]).unwrap();
        assert_eq!(model.predict(&t).unwrap(), round_cents(raw));
    }

    #[test]
    fn test_random_forest_roundtrip_through_json() {
        let x = DenseMatrix::from_2d_vec(&vec![
            vec![1.0, 2.0],
            vec![2.0, 3.0],
            vec![3.0, 4.0],
            vec![4.0, 5.0],
            vec![5.0, 6.0],
            vec![6.0, 7.0],
        ])
        .unwrap();
        let y = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        let forest = Forest::fit(&x, &y, RandomForestRegressorParameters::default()).unwrap();

        let model = TabularRegressor::new(
            vec!["f1".to_string(), "f2".to_string()],
            Estimator::RandomForest { forest },
        );
        let json = serde_json::to_vec(&model).unwrap();
        let loaded: TabularRegressor = serde_json::from_slice(&json).unwrap();
        assert!(loaded.validate().is_ok());

        let t = table(&["f1", "f2"], &[&[3.0, 4.0]]);
        let estimate = loaded.predict(&t).unwrap();
        assert!((10.0..=60.0).contains(&estimate));
    }

    #[test]
    fn test_validate_rejects_coefficient_count() {
        let model = linear(&["a", "b"], vec![1.0], 0.0);
        assert!(model.validate().is_err());
    }
}
