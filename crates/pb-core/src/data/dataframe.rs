//! DataFrame implementation for tabular data
//!
//! A DataFrame is a 2-dimensional labeled data structure with columns of
//! potentially different types. Panel datasets are DataFrames carrying an
//! entity column and a time column next to their numeric variables.

use super::*;

use indexmap::IndexMap;
use ndarray::{Axis, stack};

use std::collections::HashMap;

/// Main DataFrame structure
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Series>,
    pub(crate) nrows: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create DataFrame from columns
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Series)>,
        S: Into<String>,
    {
        let mut builder = DataFrameBuilder::new();

        for (name, series) in columns.into_iter() {
            builder = builder.with_column(name, series)?;
        }

        builder.build()
    }

    /// Get the shape of the DataFrame (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    /// Get the number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Get the number of columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// Get a reference to a column
    pub fn get_column(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Get a reference to a column, failing if it is absent
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Numeric column converted to f64, missing values stay NaN
    pub fn float_column(&self, name: &str) -> Result<FloatArray> {
        let series = self.column(name)?;
        series.to_float_array().ok_or_else(|| DataError::NonNumericData {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        })
    }

    /// Stack the named numeric columns into an (nrows × k) matrix
    pub fn numeric_matrix<S: AsRef<str>>(&self, names: &[S]) -> Result<Matrix> {
        if names.is_empty() {
            return Ok(Matrix::zeros((self.nrows, 0)));
        }

        let float_cols = names
            .iter()
            .map(|name| self.float_column(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let views: Vec<ndarray::ArrayView1<f64>> = float_cols.iter().map(|c| c.view()).collect();

        stack(Axis(1), &views).map_err(|e| DataError::DimensionMismatch {
            expected: "compatible dimensions".to_string(),
            actual: e.to_string(),
        })
    }

    /// String keys of a column, `None` where the value is missing
    pub fn keys(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.column(name)?;
        Ok((0..self.nrows).map(|i| series.key_at(i)).collect())
    }

    /// Select specific columns
    pub fn select<I, S>(&self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DataFrameBuilder::new();

        for name in names.into_iter() {
            let name = name.as_ref();
            builder = builder.with_column(name, self.column(name)?.clone())?;
        }

        builder.build()
    }

    /// Filter rows with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.nrows {
            return Err(DataError::DimensionMismatch {
                expected: format!("mask length {}", self.nrows),
                actual: format!("mask length {}", mask.len()),
            });
        }

        let mut columns = IndexMap::with_capacity(self.columns.len());
        for (name, series) in &self.columns {
            columns.insert(name.clone(), series.filter(mask)?);
        }

        Ok(Self {
            columns,
            nrows: mask.iter().filter(|keep| **keep).count(),
        })
    }

    /// Gather rows by position, in the given order
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(self.columns.len());
        for (name, series) in &self.columns {
            columns.insert(name.clone(), series.take(indices)?);
        }

        Ok(Self {
            columns,
            nrows: indices.len(),
        })
    }

    /// Add a new column
    pub fn with_column<S: Into<String>>(mut self, name: S, series: Series) -> Result<Self> {
        let name = name.into();

        if self.columns.contains_key(&name) {
            return Err(DataError::DuplicateColumn(name));
        }

        if !self.columns.is_empty() && series.len() != self.nrows {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} rows", self.nrows),
                actual: format!("{} rows", series.len()),
            });
        }

        if self.columns.is_empty() {
            self.nrows = series.len();
        }

        self.columns.insert(name, series);
        Ok(self)
    }

    /// Add a column, replacing any existing column with the same name
    pub fn with_column_replaced<S: Into<String>>(mut self, name: S, series: Series) -> Result<Self> {
        let name = name.into();
        if self.columns.shift_remove(&name).is_some() && self.columns.is_empty() {
            self.nrows = 0;
        }
        self.with_column(name, series)
    }

    /// Drop columns
    pub fn drop<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        for name in names {
            let name = name.as_ref();
            if self.columns.shift_remove(name).is_none() {
                return Err(DataError::ColumnNotFound(name.to_string()));
            }
        }

        if self.columns.is_empty() {
            self.nrows = 0;
        }

        Ok(self)
    }

    /// Inner join on a shared key column.
    ///
    /// Every key in `other` must be unique, so each left row matches at most
    /// one right row and the left row order is preserved. Rows with a missing
    /// key on either side never match.
    pub fn inner_join(&self, other: &DataFrame, key: &str) -> Result<Self> {
        let left_keys = self.keys(key)?;
        let right_keys = other.keys(key)?;

        for name in other.column_names() {
            if name != key && self.has_column(name) {
                return Err(DataError::DuplicateColumn(name.to_string()));
            }
        }

        let mut right_index: HashMap<&str, usize> = HashMap::with_capacity(right_keys.len());
        for (i, k) in right_keys.iter().enumerate() {
            if let Some(k) = k {
                if right_index.insert(k.as_str(), i).is_some() {
                    return Err(DataError::DuplicateJoinKey {
                        column: key.to_string(),
                        key: k.clone(),
                    });
                }
            }
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = left_keys
            .iter()
            .enumerate()
            .filter_map(|(i, k)| {
                k.as_deref()
                    .and_then(|k| right_index.get(k))
                    .map(|&j| (i, j))
            })
            .unzip();

        let mut joined = self.take(&left_rows)?;
        for (name, series) in &other.columns {
            if name != key {
                joined = joined.with_column(name.clone(), series.take(&right_rows)?)?;
            }
        }

        Ok(joined)
    }

    /// Get a row as a Row view
    pub fn get_row(&self, idx: usize) -> Result<Row<'_>> {
        if idx >= self.nrows {
            return Err(DataError::IndexOutOfBounds {
                index: idx,
                len: self.nrows,
            });
        }

        Ok(Row {
            df: self,
            row_idx: idx,
        })
    }
}

/// Row view into a DataFrame
pub struct Row<'a> {
    df: &'a DataFrame,
    row_idx: usize,
}

impl Row<'_> {
    /// Get a value from the row
    pub fn get(&self, col: &str) -> Result<Option<SeriesValue>> {
        Ok(self.df.column(col)?.get(self.row_idx))
    }

    /// Get value as float
    pub fn get_float(&self, col: &str) -> Result<Option<f64>> {
        match self.get(col)? {
            Some(SeriesValue::Float(v)) => Ok(Some(v)),
            Some(SeriesValue::Int(v)) => Ok(Some(v as f64)),
            Some(SeriesValue::Bool(v)) => Ok(Some(if v { 1.0 } else { 0.0 })),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Display for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataFrame({} rows × {} cols)", self.nrows, self.ncols())
    }
}
