//! Statistical structures for model results

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Goodness-of-fit statistics of a panel fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    /// Within R-squared, on entity-demeaned data
    pub r_squared: Option<f64>,
    /// Squared correlation of entity means of observed and fitted values
    pub r_squared_between: Option<f64>,
    /// Squared correlation of observed and fitted values on the raw scale
    pub r_squared_overall: Option<f64>,
    /// Residual standard error
    pub residual_std_error: Option<f64>,
    /// F-statistic for all slopes jointly, homoskedastic form
    pub f_statistic: Option<f64>,
    /// F-statistic p-value
    pub f_p_value: Option<f64>,
    /// Residual sum of squares
    pub rss: Option<f64>,
    /// Within total sum of squares
    pub tss_within: Option<f64>,
    /// Residual degrees of freedom
    pub df_residual: Option<usize>,
    /// Model degrees of freedom (slopes)
    pub df_model: Option<usize>,
}

/// Residual statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidualStatistics {
    /// Minimum residual
    pub min: f64,
    /// First quartile
    pub q1: f64,
    /// Median
    pub median: f64,
    /// Third quartile
    pub q3: f64,
    /// Maximum residual
    pub max: f64,
    /// Mean residual
    pub mean: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Skewness
    pub skewness: Option<f64>,
    /// Excess kurtosis
    pub kurtosis: Option<f64>,
    /// Durbin-Watson statistic
    pub durbin_watson: Option<f64>,
}

impl ResidualStatistics {
    /// Summarize a residual vector
    pub fn from_residuals(residuals: &Array1<f64>) -> Self {
        if residuals.is_empty() {
            return Self::default();
        }

        let mut sorted = residuals.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let moments = Moments::of(residuals);

        Self {
            min: sorted[0],
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: moments.mean,
            std_dev: if residuals.len() > 1 { residuals.std(1.0) } else { 0.0 },
            skewness: moments.skewness,
            kurtosis: moments.excess_kurtosis,
            durbin_watson: crate::fe::diagnostics::durbin_watson(residuals),
        }
    }
}

/// Population moments of a sample
#[derive(Debug, Clone, Copy)]
pub(crate) struct Moments {
    pub mean: f64,
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
}

impl Moments {
    pub fn of(data: &Array1<f64>) -> Self {
        let n = data.len() as f64;
        let mean = data.mean().unwrap_or(f64::NAN);
        let m2 = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
        let m3 = data.iter().map(|&x| (x - mean).powi(3)).sum::<f64>() / n;
        let m4 = data.iter().map(|&x| (x - mean).powi(4)).sum::<f64>() / n;

        let defined = data.len() >= 3 && m2 > 1e-300;
        Self {
            mean,
            skewness: defined.then(|| m3 / m2.powf(1.5)),
            excess_kurtosis: (defined && data.len() >= 4).then(|| m4 / (m2 * m2) - 3.0),
        }
    }
}

/// Linear-interpolated quantile of sorted data
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let idx = (sorted.len() as f64 - 1.0) * q;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = idx - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}
