//! Series data structure for holding homogeneous data
//!
//! A Series is a one-dimensional array that can hold data of a specific type.
//! It's the building block of DataFrames. Missing values only exist in float
//! series, where they are stored as NaN.

use super::*;

use std::collections::{BTreeSet, HashMap, HashSet};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A Series is a typed, one-dimensional array of data
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Floating point numbers (f64), NaN marks a missing value
    Float(FloatArray),
    /// Integer numbers (i64)
    Int(IntArray),
    /// Boolean values
    Bool(BoolArray),
    /// String values
    String(StringArray),
    /// Categorical data (encoded as u32)
    Categorical(Array1<u32>, Vec<String>), // values, categories
}

impl Series {
    /// Create a new Float series
    pub fn float(data: impl Into<FloatArray>) -> Self {
        Series::Float(data.into())
    }

    /// Create a new Int series
    pub fn int(data: impl Into<IntArray>) -> Self {
        Series::Int(data.into())
    }

    /// Create a new Bool series
    pub fn bool(data: impl Into<BoolArray>) -> Self {
        Series::Bool(data.into())
    }

    /// Create a new String series
    pub fn string(data: impl Into<StringArray>) -> Self {
        Series::String(data.into())
    }

    /// Create a new String series from anything string-like
    pub fn strings<T: AsRef<str>>(data: &[T]) -> Self {
        Series::String(data.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// Create a new Categorical series with sorted categories
    pub fn categorical<T: AsRef<str>>(data: &[T]) -> Self {
        let categories: Vec<String> = data
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let codes: HashMap<&str, u32> = categories
            .iter()
            .enumerate()
            .map(|(i, cat)| (cat.as_str(), i as u32))
            .collect();

        // Every value is in the category set by construction
        let encoded: Array1<u32> = data
            .iter()
            .map(|s| codes.get(s.as_ref()).copied().unwrap_or_default())
            .collect();

        Series::Categorical(encoded, categories)
    }

    /// Get the length of the series
    pub fn len(&self) -> usize {
        match self {
            Series::Float(arr) => arr.len(),
            Series::Int(arr) => arr.len(),
            Series::Bool(arr) => arr.len(),
            Series::String(arr) => arr.len(),
            Series::Categorical(arr, _) => arr.len(),
        }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the type name of the series
    pub fn dtype(&self) -> &'static str {
        match self {
            Series::Float(_) => "float64",
            Series::Int(_) => "int64",
            Series::Bool(_) => "bool",
            Series::String(_) => "string",
            Series::Categorical(_, _) => "categorical",
        }
    }

    /// Whether the series can be used as a regressor
    pub fn is_numeric(&self) -> bool {
        matches!(self, Series::Float(_) | Series::Int(_) | Series::Bool(_))
    }

    /// Get a value at index
    pub fn get(&self, idx: usize) -> Option<SeriesValue> {
        match self {
            Series::Float(arr) => arr.get(idx).map(|&v| SeriesValue::Float(v)),
            Series::Int(arr) => arr.get(idx).map(|&v| SeriesValue::Int(v)),
            Series::Bool(arr) => arr.get(idx).map(|&v| SeriesValue::Bool(v)),
            Series::String(arr) => arr.get(idx).map(|v| SeriesValue::String(v.clone())),
            Series::Categorical(arr, cats) => arr
                .get(idx)
                .and_then(|&code| cats.get(code as usize))
                .map(|cat| SeriesValue::String(cat.clone())),
        }
    }

    /// Whether the value at `idx` is missing
    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            Series::Float(arr) => arr.get(idx).is_some_and(|v| v.is_nan()),
            _ => false,
        }
    }

    /// Number of missing values
    pub fn missing_count(&self) -> usize {
        match self {
            Series::Float(arr) => arr.iter().filter(|v| v.is_nan()).count(),
            _ => 0,
        }
    }

    /// String form of the value at `idx`, used for row keys.
    ///
    /// Returns `None` for a missing value or an out-of-range index.
    pub fn key_at(&self, idx: usize) -> Option<String> {
        if self.is_missing(idx) {
            return None;
        }
        self.get(idx).map(|v| v.to_string())
    }

    /// Filter the series with a boolean mask
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(DataError::DimensionMismatch {
                expected: format!("mask length {}", self.len()),
                actual: format!("mask length {}", mask.len()),
            });
        }

        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();

        self.take(&keep)
    }

    /// Gather the rows at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= self.len()) {
            return Err(DataError::IndexOutOfBounds {
                index: bad,
                len: self.len(),
            });
        }

        Ok(match self {
            Series::Float(arr) => Series::Float(indices.iter().map(|&i| arr[i]).collect()),
            Series::Int(arr) => Series::Int(indices.iter().map(|&i| arr[i]).collect()),
            Series::Bool(arr) => Series::Bool(indices.iter().map(|&i| arr[i]).collect()),
            Series::String(vec) => Series::String(indices.iter().map(|&i| vec[i].clone()).collect()),
            Series::Categorical(arr, cats) => {
                Series::Categorical(indices.iter().map(|&i| arr[i]).collect(), cats.clone())
            }
        })
    }

    /// Numeric values as f64, `None` for string and categorical series
    pub fn to_float_array(&self) -> Option<FloatArray> {
        match self {
            Series::Float(arr) => Some(arr.clone()),
            Series::Int(arr) => Some(arr.mapv(|v| v as f64)),
            Series::Bool(arr) => Some(arr.mapv(|v| if v { 1.0 } else { 0.0 })),
            Series::String(_) | Series::Categorical(_, _) => None,
        }
    }

    /// Compute basic statistics for numeric series, skipping missing values
    pub fn describe(&self) -> Result<SeriesStats> {
        match self {
            Series::String(arr) => {
                let unique_count = arr.iter().collect::<HashSet<_>>().len();
                Ok(SeriesStats {
                    count: arr.len(),
                    unique_count: Some(unique_count),
                    ..SeriesStats::empty()
                })
            }
            Series::Categorical(arr, _) => {
                let unique_count = arr.iter().collect::<HashSet<_>>().len();
                Ok(SeriesStats {
                    count: arr.len(),
                    unique_count: Some(unique_count),
                    ..SeriesStats::empty()
                })
            }
            _ => {
                let values: Vec<f64> = self
                    .to_float_array()
                    .map(|arr| arr.iter().copied().filter(|v| !v.is_nan()).collect())
                    .unwrap_or_default();
                if values.is_empty() {
                    return Ok(SeriesStats::empty());
                }

                let arr = FloatArray::from(values);
                let std = if arr.len() > 1 { arr.std(1.0) } else { f64::NAN };

                Ok(SeriesStats {
                    count: arr.len(),
                    mean: arr.mean().unwrap_or(f64::NAN),
                    std,
                    min: arr.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
                    q05: quantile(&arr, 0.05).unwrap_or(f64::NAN),
                    q25: quantile(&arr, 0.25).unwrap_or(f64::NAN),
                    q50: quantile(&arr, 0.5).unwrap_or(f64::NAN),
                    q75: quantile(&arr, 0.75).unwrap_or(f64::NAN),
                    q95: quantile(&arr, 0.95).unwrap_or(f64::NAN),
                    max: arr.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
                    unique_count: None,
                })
            }
        }
    }
}

/// Linear-interpolated quantile
fn quantile(arr: &FloatArray, q: f64) -> Option<f64> {
    if arr.is_empty() {
        return None;
    }

    let mut sorted: Vec<f64> = arr.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let index = (n as f64 - 1.0) * q;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        Some(sorted[lower])
    } else {
        let weight = index - lower as f64;
        Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
    }
}

/// Statistical summary of a series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q05: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub q95: f64,
    pub max: f64,
    pub unique_count: Option<usize>,
}

impl SeriesStats {
    pub(crate) fn empty() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q05: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            q95: f64::NAN,
            max: f64::NAN,
            unique_count: None,
        }
    }
}

/// Enum for type-safe value access
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    String(String),
}

impl std::fmt::Display for SeriesValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesValue::Float(v) => write!(f, "{}", v),
            SeriesValue::Int(v) => write!(f, "{}", v),
            SeriesValue::Bool(v) => write!(f, "{}", v),
            SeriesValue::String(v) => write!(f, "{}", v),
        }
    }
}
