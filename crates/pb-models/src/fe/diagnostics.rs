//! Panel model diagnostics
//!
//! Pre-estimation screening of candidate variables and post-estimation
//! checks on multicollinearity (VIF), residual autocorrelation within
//! entities, heteroskedasticity and residual normality (Jarque-Bera).

use std::collections::HashMap;

use ndarray::{Array1, Array2, Axis, concatenate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use pb_core::data::{DataError, DataFrame};
use pb_core::prepare::complete_cases;

use crate::base::statistics::Moments;
use crate::base::{ModelError, Result};
use crate::linalg;

/// VIF below which collinearity is negligible
pub const VIF_MODERATE: f64 = 3.0;
/// VIF above which collinearity is severe
pub const VIF_SEVERE: f64 = 5.0;

/// |ρ| above which lag-1 residual autocorrelation is flagged
pub const AUTOCORRELATION_THRESHOLD: f64 = 0.3;
/// |corr(e², ŷ)| above which heteroskedasticity is flagged
pub const HETEROSKEDASTICITY_THRESHOLD: f64 = 0.3;

/// Multicollinearity band of a VIF value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollinearityLevel {
    /// VIF < 3
    Excellent,
    /// 3 ≤ VIF ≤ 5
    Moderate,
    /// VIF > 5
    Severe,
}

impl CollinearityLevel {
    pub fn classify(vif: f64) -> Self {
        if vif < VIF_MODERATE {
            CollinearityLevel::Excellent
        } else if vif <= VIF_SEVERE {
            CollinearityLevel::Moderate
        } else {
            CollinearityLevel::Severe
        }
    }
}

/// Variance Inflation Factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vif {
    pub variable: String,
    pub vif: f64,
    pub tolerance: f64,
    pub level: CollinearityLevel,
}

/// VIF of every column against the others, each regression with an intercept.
///
/// Rows with a missing value in any column are dropped first. A single column
/// has VIF 1 and a perfectly collinear column has VIF +∞.
pub fn vif<S: AsRef<str>>(frame: &DataFrame, columns: &[S]) -> Result<Vec<Vif>> {
    let (complete, _) = complete_cases(frame, columns)?;
    let x = complete.numeric_matrix(columns)?;
    let (n, p) = x.dim();

    columns
        .iter()
        .enumerate()
        .map(|(j, name)| -> Result<Vif> {
            let vif = if p == 1 {
                1.0
            } else {
                let target = x.column(j).to_owned();
                let others: Vec<usize> = (0..p).filter(|&k| k != j).collect();
                let design = concatenate(
                    Axis(1),
                    &[Array2::<f64>::ones((n, 1)).view(), x.select(Axis(1), &others).view()],
                )
                .map_err(|e| ModelError::numerical("vif", e))?;
                inflation(&design, &target)?
            };

            Ok(Vif {
                variable: name.as_ref().to_string(),
                vif,
                tolerance: 1.0 / vif,
                level: CollinearityLevel::classify(vif),
            })
        })
        .collect()
}

/// 1 / (1 − R²) of the auxiliary regression
fn inflation(design: &Array2<f64>, target: &Array1<f64>) -> Result<f64> {
    let mean = target.mean().unwrap_or(0.0);
    let tss = target.mapv(|v| (v - mean).powi(2)).sum();
    if tss <= 0.0 {
        return Ok(f64::INFINITY);
    }

    let beta = linalg::least_squares(design, target)
        .ok_or_else(|| ModelError::numerical("vif", "auxiliary regression failed"))?;
    let resid = target - &design.dot(&beta);
    let r2 = 1.0 - resid.mapv(|e| e * e).sum() / tss;

    Ok(if r2 >= 1.0 - 1e-12 { f64::INFINITY } else { 1.0 / (1.0 - r2) })
}

/// Outcome of the variance screen for one variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningStatus {
    Ok,
    HighMissing,
    NearZeroVariance,
}

/// Variance screen row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceScreen {
    pub variable: String,
    pub n: usize,
    pub missing: usize,
    pub missing_share: f64,
    pub variance: f64,
    pub p05: f64,
    pub p95: f64,
    pub status: ScreeningStatus,
}

/// Variance screen of a set of candidate variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub rows: Vec<VarianceScreen>,
    /// Requested columns absent from the frame
    pub skipped: Vec<String>,
}

impl ScreeningReport {
    /// Variables that passed the screen
    pub fn passed(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.status == ScreeningStatus::Ok)
            .map(|r| r.variable.as_str())
            .collect()
    }
}

/// Flag variables with too many missing values or too little variance.
///
/// The missing share is checked first. Absent columns are listed in
/// `skipped`; non-numeric columns are an error.
pub fn screen_variance<S: AsRef<str>>(
    frame: &DataFrame,
    columns: &[S],
    min_variance: f64,
    max_missing_share: f64,
) -> Result<ScreeningReport> {
    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for name in columns {
        let name = name.as_ref();
        if !frame.has_column(name) {
            skipped.push(name.to_string());
            continue;
        }

        let series = frame.column(name)?;
        if !series.is_numeric() {
            return Err(DataError::NonNumericData {
                column: name.to_string(),
                dtype: series.dtype().to_string(),
            }
            .into());
        }

        let stats = series.describe()?;
        let missing = series.missing_count();
        let missing_share = if series.is_empty() {
            0.0
        } else {
            missing as f64 / series.len() as f64
        };
        let variance = stats.std * stats.std;

        let status = if missing_share > max_missing_share {
            ScreeningStatus::HighMissing
        } else if variance.is_nan() || variance < min_variance {
            ScreeningStatus::NearZeroVariance
        } else {
            ScreeningStatus::Ok
        };

        rows.push(VarianceScreen {
            variable: name.to_string(),
            n: stats.count,
            missing,
            missing_share,
            variance,
            p05: stats.q05,
            p95: stats.q95,
            status,
        });
    }

    Ok(ScreeningReport { rows, skipped })
}

/// Per-entity variance of one variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityVariance {
    /// (entity, n, variance) in order of first appearance
    pub entities: Vec<(String, usize, f64)>,
    /// Entities whose variance is below the threshold or undefined
    pub low_variance: Vec<String>,
}

/// Sample variance of `column` within each entity
pub fn entity_variance(
    frame: &DataFrame,
    entity: &str,
    column: &str,
    min_variance: f64,
) -> Result<EntityVariance> {
    let keys = frame.keys(entity)?;
    let values = frame.float_column(column)?;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
    for (key, &value) in keys.into_iter().zip(values.iter()) {
        let Some(key) = key else { continue };
        if value.is_nan() {
            continue;
        }
        grouped
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(value);
    }

    let entities: Vec<(String, usize, f64)> = order
        .into_iter()
        .map(|key| {
            let group = grouped.remove(&key).unwrap_or_default();
            let variance = sample_variance(&group);
            (key, group.len(), variance)
        })
        .collect();

    let low_variance = entities
        .iter()
        .filter(|(_, _, v)| v.is_nan() || *v < min_variance)
        .map(|(k, _, _)| k.clone())
        .collect();

    Ok(EntityVariance {
        entities,
        low_variance,
    })
}

fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Durbin-Watson statistic, `None` for fewer than 2 residuals or zero RSS
pub fn durbin_watson(residuals: &Array1<f64>) -> Option<f64> {
    if residuals.len() < 2 {
        return None;
    }

    let sum_sq: f64 = residuals.iter().map(|&r| r * r).sum();
    if sum_sq <= f64::EPSILON * f64::EPSILON {
        return None;
    }

    let sum_sq_diff: f64 = residuals
        .windows(2)
        .into_iter()
        .map(|w| (w[1] - w[0]).powi(2))
        .sum();

    Some(sum_sq_diff / sum_sq)
}

/// Lag-1 residual autocorrelation within entities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SerialCorrelation {
    /// Correlation of e_t with e_{t−1} over all within-entity pairs
    pub rho: f64,
    /// Σ (e_t − e_{t−1})² over within-entity pairs / Σ e²
    pub durbin_watson: f64,
    /// Consecutive pairs used
    pub n_pairs: usize,
    /// |ρ| > [`AUTOCORRELATION_THRESHOLD`]
    pub flagged: bool,
}

/// Pair each residual with its predecessor in the same entity.
///
/// `groups` holds the row positions of every entity in time order, so no
/// pair crosses an entity boundary. `None` when fewer than two pairs exist or
/// either side of the pairs is constant.
pub fn serial_correlation(
    residuals: &Array1<f64>,
    groups: &[Vec<usize>],
) -> Option<SerialCorrelation> {
    let (current, previous): (Vec<f64>, Vec<f64>) = groups
        .iter()
        .flat_map(|rows| {
            rows.windows(2)
                .map(move |pair| (residuals[pair[1]], residuals[pair[0]]))
        })
        .unzip();

    let rho = pearson(&current, &previous)?;

    let sum_sq: f64 = residuals.iter().map(|&r| r * r).sum();
    if sum_sq <= f64::EPSILON * f64::EPSILON {
        return None;
    }
    let sum_sq_diff: f64 = current
        .iter()
        .zip(previous.iter())
        .map(|(c, p)| (c - p).powi(2))
        .sum();

    Some(SerialCorrelation {
        rho,
        durbin_watson: sum_sq_diff / sum_sq,
        n_pairs: current.len(),
        flagged: rho.abs() > AUTOCORRELATION_THRESHOLD,
    })
}

/// Correlation of squared residuals with fitted values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeteroskedasticityCheck {
    pub correlation: f64,
    /// |corr| > [`HETEROSKEDASTICITY_THRESHOLD`]
    pub flagged: bool,
}

/// corr(e², ŷ), `None` when either side is constant or the lengths differ
pub fn heteroskedasticity(
    residuals: &Array1<f64>,
    fitted: &Array1<f64>,
) -> Option<HeteroskedasticityCheck> {
    if residuals.len() != fitted.len() {
        return None;
    }
    let squared: Vec<f64> = residuals.iter().map(|&e| e * e).collect();
    let correlation = pearson(&squared, &fitted.to_vec())?;

    Some(HeteroskedasticityCheck {
        correlation,
        flagged: correlation.abs() > HETEROSKEDASTICITY_THRESHOLD,
    })
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len();
    if n < 2 || n != b.len() {
        return None;
    }
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let (da, db) = (x - mean_a, y - mean_b);
        sab += da * db;
        saa += da * da;
        sbb += db * db;
    }
    if saa <= 0.0 || sbb <= 0.0 {
        return None;
    }
    Some(sab / (saa * sbb).sqrt())
}

/// Jarque-Bera normality test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JarqueBera {
    pub statistic: f64,
    /// Upper tail of χ²(2)
    pub p_value: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
}

/// JB = n/6 · (S² + K²/4), with K the excess kurtosis
pub fn jarque_bera(residuals: &Array1<f64>) -> Result<JarqueBera> {
    let moments = Moments::of(residuals);
    let (Some(skewness), Some(excess_kurtosis)) = (moments.skewness, moments.excess_kurtosis)
    else {
        return Err(ModelError::numerical(
            "jarque_bera",
            format!(
                "needs at least 4 non-constant residuals, got {}",
                residuals.len()
            ),
        ));
    };

    let n = residuals.len() as f64;
    let statistic = n / 6.0 * (skewness.powi(2) + excess_kurtosis.powi(2) / 4.0);
    let chi2 = ChiSquared::new(2.0).map_err(|e| ModelError::numerical("jarque_bera", e))?;

    Ok(JarqueBera {
        statistic,
        p_value: chi2.sf(statistic),
        skewness,
        excess_kurtosis,
    })
}
