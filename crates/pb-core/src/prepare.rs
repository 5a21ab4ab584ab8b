//! Variable preparation
//!
//! Pure transformations that turn a loaded panel into model-ready columns:
//! complete-case filtering, centering, interactions, standardization,
//! indicator dummies, within-entity lags, composite keys and exclusion
//! filters. Every function borrows its input frame and returns a new one.

use std::collections::{BTreeMap, HashSet};

use crate::data::{DataError, DataFrame, FloatArray, Result, Series};
use crate::panel::PanelIndex;


/// Proof that a column was mean-centered by [`center`].
///
/// Only [`center`] can build one, so [`interact`] cannot be handed a raw
/// column by mistake.
#[derive(Debug, Clone, PartialEq)]
pub struct Centered {
    name: String,
    source: String,
    mean: f64,
    n: usize,
}

impl Centered {
    /// Name of the centered column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column the centered values were computed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Mean that was subtracted
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Number of rows the mean was computed over
    pub fn n(&self) -> usize {
        self.n
    }
}

/// Keep rows with no missing value in `columns`, returning the number dropped
pub fn complete_cases<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> Result<(DataFrame, usize)> {
    let series = columns
        .iter()
        .map(|c| df.column(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let mask: Vec<bool> = (0..df.nrows())
        .map(|i| series.iter().all(|s| !s.is_missing(i)))
        .collect();
    let dropped = mask.iter().filter(|keep| !**keep).count();

    Ok((df.filter(&mask)?, dropped))
}

/// Add `name` = column − mean(column), computed over every row of `df`.
///
/// Fails on a missing value: the mean must come from the rows the model uses,
/// so filter to complete cases first.
pub fn center(df: &DataFrame, column: &str, name: &str) -> Result<(DataFrame, Centered)> {
    let values = complete_float(df, column)?;
    let mean = values.mean().ok_or_else(|| DataError::EmptyAfterDrop {
        stage: "centering".to_string(),
        dropped: 0,
    })?;

    let centered = values.mapv(|v| v - mean);
    let frame = df.clone().with_column_replaced(name, Series::Float(centered))?;

    Ok((
        frame,
        Centered {
            name: name.to_string(),
            source: column.to_string(),
            mean,
            n: values.len(),
        },
    ))
}

/// Add `name` = centered × dummy, where the dummy holds only 0 and 1.
///
/// Rows with dummy 0 get exactly 0.0 and rows with dummy 1 get exactly the
/// centered value.
pub fn interact(df: &DataFrame, centered: &Centered, dummy: &str, name: &str) -> Result<DataFrame> {
    if df.nrows() != centered.n {
        return Err(DataError::DimensionMismatch {
            expected: format!("{} rows, as when '{}' was centered", centered.n, centered.name),
            actual: format!("{} rows", df.nrows()),
        });
    }

    let xc = complete_float(df, &centered.name)?;
    let d = complete_float(df, dummy)?;

    if let Some(bad) = d.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(DataError::InvalidParameter(format!(
            "dummy '{}' must contain only 0 and 1, found {}",
            dummy, bad
        )));
    }

    let product: FloatArray = xc
        .iter()
        .zip(d.iter())
        .map(|(&x, &flag)| if flag == 1.0 { x } else { 0.0 })
        .collect();

    df.clone().with_column_replaced(name, Series::Float(product))
}

/// Add `name` = (column − mean) / sd, with the sample standard deviation
pub fn standardize(df: &DataFrame, column: &str, name: &str) -> Result<DataFrame> {
    let values = complete_float(df, column)?;
    if values.len() < 2 {
        return Err(DataError::InvalidParameter(format!(
            "standardizing '{}' needs at least 2 rows, got {}",
            column,
            values.len()
        )));
    }

    let mean = values.mean().unwrap_or(f64::NAN);
    let sd = values.std(1.0);
    if sd.is_nan() || sd <= 0.0 {
        return Err(DataError::InvalidParameter(format!(
            "cannot standardize '{}': zero variance",
            column
        )));
    }

    let z = values.mapv(|v| (v - mean) / sd);
    df.clone().with_column_replaced(name, Series::Float(z))
}

/// Add one 0/1 float column per distinct value of `column`, named
/// `{prefix}_{value}`, and return the new names in order.
///
/// Numeric values are ordered numerically and everything else
/// lexicographically. With `drop_first` the lowest value gets no column.
pub fn indicator_dummies(
    df: &DataFrame,
    column: &str,
    prefix: &str,
    drop_first: bool,
) -> Result<(DataFrame, Vec<String>)> {
    let series = df.column(column)?;
    if series.missing_count() > 0 {
        return Err(DataError::MissingData(column.to_string()));
    }

    let keys: Vec<String> = df.keys(column)?.into_iter().flatten().collect();

    let mut levels: Vec<String> = keys.iter().cloned().collect::<HashSet<_>>().into_iter().collect();
    match series.to_float_array() {
        Some(_) => levels.sort_by(|a, b| match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            _ => a.cmp(b),
        }),
        None => levels.sort(),
    }

    let skip = usize::from(drop_first && !levels.is_empty());

    let mut frame = df.clone();
    let mut names = Vec::with_capacity(levels.len().saturating_sub(skip));
    for level in levels.iter().skip(skip) {
        let name = format!("{}_{}", prefix, level);
        let indicator: FloatArray = keys
            .iter()
            .map(|k| if k == level { 1.0 } else { 0.0 })
            .collect();
        frame = frame.with_column(name.clone(), Series::Float(indicator))?;
        names.push(name);
    }

    Ok((frame, names))
}

/// Add `name` holding the previous period's `column` value of the same entity.
///
/// Periods are ordered by `time` within each entity, so the row order of `df`
/// does not matter. The first period of every entity has no predecessor and
/// gets a missing value, as does any row whose predecessor is missing.
pub fn lag_within(
    df: &DataFrame,
    entity: &str,
    time: &str,
    column: &str,
    name: &str,
) -> Result<DataFrame> {
    let index = PanelIndex::build(df, entity, time)?;
    let values = df.float_column(column)?;

    let mut lagged = FloatArray::from_elem(df.nrows(), f64::NAN);
    for rows in index.time_ordered_groups() {
        for pair in rows.windows(2) {
            lagged[pair[1]] = values[pair[0]];
        }
    }

    df.clone().with_column(name, Series::Float(lagged))
}

/// Add a string column joining the values of `columns` with `separator`
pub fn composite_key<S: AsRef<str>>(
    df: &DataFrame,
    columns: &[S],
    separator: &str,
    name: &str,
) -> Result<DataFrame> {
    if columns.is_empty() {
        return Err(DataError::InvalidParameter(
            "composite key needs at least one column".to_string(),
        ));
    }

    let parts = columns
        .iter()
        .map(|c| {
            let column = c.as_ref();
            df.keys(column)?
                .into_iter()
                .map(|k| k.ok_or_else(|| DataError::MissingData(column.to_string())))
                .collect::<Result<Vec<String>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let joined: Vec<String> = (0..df.nrows())
        .map(|i| {
            parts
                .iter()
                .map(|p| p[i].as_str())
                .collect::<Vec<_>>()
                .join(separator)
        })
        .collect();

    df.clone().with_column_replaced(name, Series::String(joined))
}

/// Keep rows where `flag` equals 0, returning the number excluded.
///
/// A missing flag value counts as flagged.
pub fn exclude_flagged(df: &DataFrame, flag: &str) -> Result<(DataFrame, usize)> {
    let values = df.float_column(flag)?;
    let mask: Vec<bool> = values.iter().map(|&v| v == 0.0).collect();
    let excluded = mask.iter().filter(|keep| !**keep).count();

    Ok((df.filter(&mask)?, excluded))
}

/// Distinct values of `column` with their row counts, in key order
pub fn value_counts(df: &DataFrame, column: &str) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for key in df.keys(column)?.into_iter().flatten() {
        *counts.entry(key).or_insert(0) += 1;
    }
    Ok(counts)
}

fn complete_float(df: &DataFrame, column: &str) -> Result<FloatArray> {
    let values = df.float_column(column)?;
    if values.iter().any(|v| v.is_nan()) {
        return Err(DataError::MissingData(column.to_string()));
    }
    Ok(values)
}
