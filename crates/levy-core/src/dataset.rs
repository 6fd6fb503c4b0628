//! Numeric tabular datasets.
//!
//! The training dataset is a CSV file whose columns are produced by an
//! external feature-engineering step: a set of numeric feature columns and
//! one numeric target column. Rows are in chronological order, and that order
//! is preserved everywhere in this module.

use std::io::Read;
use std::ops::Range;
use std::path::Path;

use ndarray::{Array2, Axis, s};

use crate::errors::CoreError;
use crate::fs;

/// A column-major table of `f64` values with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

/// Feature values (one row per observation) with their column names, as
/// consumed by models.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

/// The chronological train/test split of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub train_features: FeatureMatrix,
    pub test_features: FeatureMatrix,
    pub train_target: Vec<f64>,
    pub test_target: Vec<f64>,
}

impl Dataset {
    /// Build a dataset from column names and per-column values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the column count does not match,
    /// columns differ in length, or a name is duplicated.
    pub fn new(columns: Vec<String>, data: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        if columns.len() != data.len() {
            return Err(CoreError::Validation(format!(
                "{} column names for {} columns",
                columns.len(),
                data.len()
            )));
        }
        if let Some(first) = data.first() {
            if let Some((i, _)) = data.iter().enumerate().find(|(_, c)| c.len() != first.len()) {
                return Err(CoreError::Validation(format!(
                    "column '{}' has {} values, expected {}",
                    columns[i],
                    data[i].len(),
                    first.len()
                )));
            }
        }
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(CoreError::Validation(format!("duplicate column '{name}'")));
            }
        }
        Ok(Self { columns, data })
    }

    /// Load a dataset from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if the file cannot be read or a cell is not numeric.
    pub fn from_csv_path(path: &Path) -> Result<Self, CoreError> {
        let file = std::fs::File::open(path).map_err(|e| CoreError::io(path, e))?;
        Self::from_csv_reader(file)
    }

    /// Parse a dataset from any CSV source with a header row.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` on malformed CSV or non-numeric cells.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut data = vec![Vec::new(); columns.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for (col, cell) in record.iter().enumerate() {
                let value = cell.parse::<f64>().map_err(|_| CoreError::NonNumeric {
                    column: columns[col].clone(),
                    row: row + 1,
                    value: cell.to_string(),
                })?;
                data[col].push(value);
            }
        }

        Self::new(columns, data)
    }

    /// Write the dataset as CSV, atomically replacing `path`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if encoding or writing fails.
    pub fn write_csv(&self, path: &Path) -> Result<(), CoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(&self.columns)?;
        for i in 0..self.len() {
            wtr.write_record(self.data.iter().map(|c| c[i].to_string()))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::Validation(format!("flushing CSV buffer: {e}")))?;
        fs::write_atomic(path, &bytes)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    /// Select the named columns, in the given order, as a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingColumn` for the first absent name.
    pub fn feature_matrix(&self, names: &[String]) -> Result<FeatureMatrix, CoreError> {
        let cols = names
            .iter()
            .map(|n| self.column(n).ok_or_else(|| CoreError::MissingColumn(n.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let values = Array2::from_shape_fn((self.len(), cols.len()), |(i, j)| cols[j][i]);
        Ok(FeatureMatrix {
            names: names.to_vec(),
            values,
        })
    }

    /// Split into features (every column except `target`, in file order)
    /// and the target vector.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingColumn` if `target` is absent.
    pub fn split_target(&self, target: &str) -> Result<(FeatureMatrix, Vec<f64>), CoreError> {
        let y = self
            .column(target)
            .ok_or_else(|| CoreError::MissingColumn(target.to_string()))?
            .to_vec();
        let names: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.as_str() != target)
            .cloned()
            .collect();
        Ok((self.feature_matrix(&names)?, y))
    }

    /// Chronological train/test split: the trailing `test_fraction` of rows
    /// (rounded up) is the test set, everything before it is training data.
    /// Row order is never shuffled.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the fraction is outside (0, 1) or
    /// either side of the split would be empty, and `CoreError::MissingColumn`
    /// if `target` is absent.
    pub fn chronological_split(
        &self,
        target: &str,
        test_fraction: f64,
    ) -> Result<TrainTestSplit, CoreError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(CoreError::Validation(format!(
                "test fraction must be in (0, 1), got {test_fraction}"
            )));
        }
        if self.is_empty() {
            return Err(CoreError::EmptyDataset);
        }
        let n = self.len();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_train == 0 || n_test == 0 {
            return Err(CoreError::Validation(format!(
                "{n} rows cannot be split into non-empty train and test sets"
            )));
        }

        let (features, y) = self.split_target(target)?;
        Ok(TrainTestSplit {
            train_features: features.select_rows(0..n_train),
            test_features: features.select_rows(n_train..n),
            train_target: y[..n_train].to_vec(),
            test_target: y[n_train..].to_vec(),
        })
    }

    /// Copy of the dataset with `offset` added to every value of `column`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingColumn` if `column` is absent.
    pub fn with_offset(&self, column: &str, offset: f64) -> Result<Self, CoreError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| CoreError::MissingColumn(column.to_string()))?;
        let mut shifted = self.clone();
        for v in &mut shifted.data[idx] {
            *v += offset;
        }
        Ok(shifted)
    }
}

impl FeatureMatrix {
    /// Build a matrix from per-row values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if a row's width differs from `names`.
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, CoreError> {
        if let Some(i) = rows.iter().position(|r| r.len() != names.len()) {
            return Err(CoreError::Validation(format!(
                "row {i} has {} values, expected {}",
                rows[i].len(),
                names.len()
            )));
        }
        let values = Array2::from_shape_fn((rows.len(), names.len()), |(i, j)| rows[i][j]);
        Ok(Self { names, values })
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the column count differs from `names`.
    pub fn from_array(names: Vec<String>, values: Array2<f64>) -> Result<Self, CoreError> {
        if values.ncols() != names.len() {
            return Err(CoreError::Validation(format!(
                "{} columns for {} names",
                values.ncols(),
                names.len()
            )));
        }
        Ok(Self { names, values })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[must_use]
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn ncols(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn select_rows(&self, range: Range<usize>) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.slice(s![range, ..]).to_owned(),
        }
    }

    /// Reorder columns to match `names`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MissingColumn` for the first name not present.
    pub fn reorder(&self, names: &[String]) -> Result<Self, CoreError> {
        if names == self.names.as_slice() {
            return Ok(self.clone());
        }
        let idx = names
            .iter()
            .map(|n| {
                self.names
                    .iter()
                    .position(|c| c == n)
                    .ok_or_else(|| CoreError::MissingColumn(n.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            names: names.to_vec(),
            values: self.values.select(Axis(1), &idx),
        })
    }
}
