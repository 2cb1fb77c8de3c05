use super::errors::PipelineError;
use chrono::NaiveDate;

/// Engineered features keyed by date, one row per date.
///
/// Values are stored row-major. A non-finite value marks a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    column_names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Builds a table from named columns of equal length.
    ///
    /// Fails with `Prediction` if a column's length differs from `dates`.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, PipelineError> {
        let n = dates.len();
        let mut column_names = Vec::with_capacity(columns.len());
        let mut rows = vec![Vec::with_capacity(columns.len()); n];

        for (name, values) in columns {
            if values.len() != n {
                return Err(PipelineError::prediction(format!(
                    "column {} has {} values for {} dates",
                    name,
                    values.len(),
                    n
                )));
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            column_names.push(name);
        }

        Ok(Self {
            dates,
            column_names,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == name)
    }

    /// Values of one column, in date order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Date and values of the most recent row.
    pub fn latest(&self) -> Option<(NaiveDate, &[f64])> {
        let last = self.rows.len().checked_sub(1)?;
        Some((self.dates[last], self.rows[last].as_slice()))
    }

    /// Keeps only rows in which every value is finite.
    pub fn drop_incomplete_rows(self) -> Self {
        let (dates, rows): (Vec<_>, Vec<_>) = self
            .dates
            .into_iter()
            .zip(self.rows)
            .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
            .unzip();

        Self {
            dates,
            column_names: self.column_names,
            rows,
        }
    }

    /// Removes the named columns, ignoring names that are absent.
    pub fn drop_columns(self, names: &[&str]) -> Self {
        let keep: Vec<bool> = self
            .column_names
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();

        let column_names = self
            .column_names
            .into_iter()
            .zip(&keep)
            .filter_map(|(c, k)| k.then_some(c))
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(v, k)| k.then_some(v))
                    .collect()
            })
            .collect();

        Self {
            dates: self.dates,
            column_names,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        let dates = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        FeatureTable::from_columns(
            dates,
            vec![
                ("a".to_string(), vec![1.0, 2.0, 3.0]),
                ("b".to_string(), vec![f64::NAN, 5.0, 6.0]),
                ("c".to_string(), vec![7.0, 8.0, 9.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_column_length_mismatch_is_an_error() {
        let dates = vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        let err = FeatureTable::from_columns(
            dates,
            vec![("short".to_string(), vec![]), ("ok".to_string(), vec![1.0])],
        )
        .unwrap_err();

        assert_eq!(err.kind(), "prediction");
        assert!(err.to_string().contains("column short has 0 values for 1 dates"));
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let t = table().drop_incomplete_rows();
        assert_eq!(t.len(), 2);
        assert_eq!(t.column("a"), Some(vec![2.0, 3.0]));
    }

    #[test]
    fn test_drop_columns_ignores_unknown_names() {
        let t = table().drop_columns(&["b", "missing"]);
        assert_eq!(t.column_names(), &["a".to_string(), "c".to_string()]);
        assert_eq!(t.latest().unwrap().1, &[3.0, 9.0]);
    }

    #[test]
    fn test_latest_row() {
        let t = table();
        let (date, row) = t.latest().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(row, &[3.0, 6.0, 9.0]);
    }
}
