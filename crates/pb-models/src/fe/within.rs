//! Within (entity-demeaned) least squares
//!
//! Each variable z is transformed to z − z̄_entity + z̄, the constant column
//! stays 1, and OLS runs on the transformed data.

use ndarray::{Array1, Array2, Axis};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::debug;

use pb_core::data::{DataError, DataFrame};

use super::covariance::{self, Clusters};
use super::diagnostics;
use super::{CovarianceType, PanelFit, PanelSample, TestConfig};
use crate::base::{ModelError, ModelStatistics, ResidualStatistics, Result};
use crate::linalg;

/// Name of the intercept parameter
pub const INTERCEPT: &str = "const";

/// Fit `dependent` on `regressors` with entity fixed effects.
///
/// Rows with a missing value in any used column are dropped, and entities
/// with fewer than `config.min_periods_per_entity` observations are excluded
/// before fitting.
pub fn fit_within<S: AsRef<str>>(
    data: &DataFrame,
    dependent: &str,
    regressors: &[S],
    entity: &str,
    time: &str,
    config: &TestConfig,
) -> Result<PanelFit> {
    config.validate()?;

    let regressors: Vec<String> = regressors.iter().map(|r| r.as_ref().to_string()).collect();
    check_regressor_names(dependent, &regressors)?;

    let mut numeric = Vec::with_capacity(regressors.len() + 1);
    numeric.push(dependent.to_string());
    numeric.extend(regressors.iter().cloned());

    let sample = PanelSample::prepare(
        data,
        &numeric,
        entity,
        time,
        config.covariance.cluster_column(),
        config.min_periods_per_entity,
    )?;

    fit_sample(&sample, dependent, &regressors, config, "single")
}

/// Regressor names must be unique and distinct from the dependent and the
/// intercept parameter
fn check_regressor_names(dependent: &str, regressors: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for name in regressors {
        if name == INTERCEPT || name == dependent {
            return Err(DataError::InvalidParameter(format!(
                "'{}' is reserved and cannot be a regressor",
                name
            ))
            .into());
        }
        if !seen.insert(name.as_str()) {
            return Err(DataError::InvalidParameter(format!(
                "regressor '{}' appears more than once",
                name
            ))
            .into());
        }
    }
    Ok(())
}

/// Fit on an already prepared sample. `step` labels the model in errors.
pub(crate) fn fit_sample(
    sample: &PanelSample,
    dependent: &str,
    regressors: &[String],
    config: &TestConfig,
    step: &str,
) -> Result<PanelFit> {
    check_regressor_names(dependent, regressors)?;

    let frame = sample.frame();
    let index = sample.index();
    let groups = index.groups();

    let n = sample.n_obs();
    let n_entities = index.n_entities();
    let k = regressors.len() + 1;

    let y = frame.float_column(dependent)?;
    let x_raw = frame.numeric_matrix(regressors)?;

    // Transformed design, constant first
    let mut x = Array2::<f64>::ones((n, k));
    for (j, name) in regressors.iter().enumerate() {
        let column = x_raw.column(j).to_owned();
        let demeaned = Demeaned::new(&column, groups);

        if demeaned.within_ss() <= config.variation_tolerance * demeaned.total_ss() {
            return Err(ModelError::InsufficientVariation {
                variable: name.clone(),
                n_entities,
            });
        }

        x.column_mut(j + 1).assign(&demeaned.transformed());
    }

    if n <= k + n_entities.saturating_sub(1) {
        return Err(ModelError::InsufficientData {
            n_obs: n,
            n_params: k,
            n_entities,
        });
    }
    let df_residual = n - k - (n_entities - 1);

    let rank_error = |reciprocal_condition: f64| ModelError::RankDeficiency {
        variables: regressors.join(", "),
        step: step.to_string(),
        reciprocal_condition,
    };

    let reciprocal_condition = linalg::reciprocal_condition(&unit_columns(&x));
    if reciprocal_condition.is_nan() || reciprocal_condition < config.rank_tolerance {
        return Err(rank_error(reciprocal_condition));
    }

    let y_dm = Demeaned::new(&y, groups);
    let y_t = y_dm.transformed();

    let params = linalg::least_squares(&x, &y_t)
        .ok_or_else(|| ModelError::numerical("least_squares", "SVD solve failed"))?;
    let xtx_inv = linalg::symmetric_inverse(&x.t().dot(&x))
        .ok_or_else(|| rank_error(reciprocal_condition))?;

    let fitted_values = x.dot(&params);
    let residuals = &y_t - &fitted_values;
    let rss = residuals.mapv(|e| e * e).sum();

    let clusters = match &config.covariance {
        CovarianceType::Clustered(column) => Some(Clusters::from_frame(frame, column)?),
        _ => None,
    };
    let cov = covariance::estimate(
        &config.covariance,
        &x,
        &residuals,
        &xtx_inv,
        df_residual,
        clusters.as_ref(),
    )?;

    let n_clusters = clusters.as_ref().map(Clusters::n_clusters);
    let inference_df = n_clusters.map_or(df_residual, |g| g - 1);

    let std_errors = cov.diag().mapv(|v| v.max(0.0).sqrt());
    let t_stats = &params / &std_errors;

    let t_dist = StudentsT::new(0.0, 1.0, inference_df as f64)
        .map_err(|e| ModelError::numerical("students_t", e))?;
    let p_values = t_stats.mapv(|t| (2.0 * t_dist.sf(t.abs())).clamp(0.0, 1.0));
    let t_critical = t_dist.inverse_cdf(1.0 - (1.0 - config.confidence_level) / 2.0);
    let ci_lower = &params - &(&std_errors * t_critical);
    let ci_upper = &params + &(&std_errors * t_critical);

    // Raw-scale fitted values for the between and overall fits
    let slopes = params.slice(ndarray::s![1..]);
    let raw_fitted = x_raw.dot(&slopes) + params[0];

    let tss_within = y_dm.within_ss();
    let statistics = ModelStatistics {
        r_squared: (tss_within > 0.0).then(|| 1.0 - rss / tss_within),
        r_squared_between: squared_correlation(
            &entity_means(&y, groups),
            &entity_means(&raw_fitted, groups),
        ),
        r_squared_overall: squared_correlation(&y, &raw_fitted),
        residual_std_error: Some((rss / df_residual as f64).sqrt()),
        f_statistic: None,
        f_p_value: None,
        rss: Some(rss),
        tss_within: Some(tss_within),
        df_residual: Some(df_residual),
        df_model: Some(k - 1),
    };
    let statistics = with_slope_f(statistics, tss_within, rss, k - 1, df_residual);

    debug!(
        step,
        dependent,
        n_obs = n,
        n_entities,
        n_params = k,
        df_residual,
        rss,
        reciprocal_condition,
        covariance = %config.covariance,
        "fitted within regression"
    );

    let serial_correlation =
        diagnostics::serial_correlation(&residuals, index.time_ordered_groups());
    let heteroskedasticity = diagnostics::heteroskedasticity(&residuals, &fitted_values);
    let residual_statistics = ResidualStatistics {
        durbin_watson: serial_correlation.map(|s| s.durbin_watson),
        ..ResidualStatistics::from_residuals(&residuals)
    };

    let mut names = Vec::with_capacity(k);
    names.push(INTERCEPT.to_string());
    names.extend(regressors.iter().cloned());

    Ok(PanelFit {
        dependent: dependent.to_string(),
        entity: index.entity_col().to_string(),
        time: index.time_col().to_string(),
        names,
        params,
        std_errors,
        t_stats,
        p_values,
        ci_lower,
        ci_upper,
        cov,
        residual_statistics,
        serial_correlation,
        heteroskedasticity,
        fitted_values,
        residuals,
        rss,
        n_obs: n,
        n_entities,
        n_clusters,
        df_residual,
        covariance: config.covariance.clone(),
        confidence_level: config.confidence_level,
        reciprocal_condition,
        statistics,
    })
}

/// Entity-demeaned view of one variable
struct Demeaned {
    within: Array1<f64>,
    grand_mean: f64,
    total_ss: f64,
}

impl Demeaned {
    fn new(values: &Array1<f64>, groups: &[Vec<usize>]) -> Self {
        let mut within = values.clone();
        for rows in groups {
            let mean = rows.iter().map(|&i| values[i]).sum::<f64>() / rows.len() as f64;
            for &i in rows {
                within[i] -= mean;
            }
        }

        let grand_mean = values.mean().unwrap_or(0.0);
        let total_ss = values.mapv(|v| (v - grand_mean).powi(2)).sum();

        Self {
            within,
            grand_mean,
            total_ss,
        }
    }

    /// Σ (z − z̄_entity)²
    fn within_ss(&self) -> f64 {
        self.within.mapv(|v| v * v).sum()
    }

    /// Σ (z − z̄)²
    fn total_ss(&self) -> f64 {
        self.total_ss
    }

    /// z − z̄_entity + z̄
    fn transformed(&self) -> Array1<f64> {
        &self.within + self.grand_mean
    }
}

/// Columns rescaled to unit Euclidean norm, so conditioning ignores units
fn unit_columns(x: &Array2<f64>) -> Array2<f64> {
    let mut scaled = x.clone();
    for mut column in scaled.columns_mut() {
        let norm = column.dot(&column).sqrt();
        if norm > 0.0 {
            column /= norm;
        }
    }
    scaled
}

fn entity_means(values: &Array1<f64>, groups: &[Vec<usize>]) -> Array1<f64> {
    groups
        .iter()
        .map(|rows| rows.iter().map(|&i| values[i]).sum::<f64>() / rows.len() as f64)
        .collect()
}

/// Squared Pearson correlation, `None` when undefined
fn squared_correlation(a: &Array1<f64>, b: &Array1<f64>) -> Option<f64> {
    if a.len() < 2 || a.len() != b.len() {
        return None;
    }

    let stacked = ndarray::stack(Axis(0), &[a.view(), b.view()]).ok()?;
    let centered = &stacked - &stacked.mean_axis(Axis(1))?.insert_axis(Axis(1));
    let saa = centered.row(0).dot(&centered.row(0));
    let sbb = centered.row(1).dot(&centered.row(1));
    let sab = centered.row(0).dot(&centered.row(1));

    (saa > 0.0 && sbb > 0.0).then(|| sab * sab / (saa * sbb))
}

/// Homoskedastic F for all slopes jointly
fn with_slope_f(
    mut statistics: ModelStatistics,
    tss_within: f64,
    rss: f64,
    df_model: usize,
    df_residual: usize,
) -> ModelStatistics {
    if df_model == 0 || rss <= 0.0 {
        return statistics;
    }

    let f = ((tss_within - rss) / df_model as f64) / (rss / df_residual as f64);
    statistics.f_statistic = Some(f);
    statistics.f_p_value = FisherSnedecor::new(df_model as f64, df_residual as f64)
        .ok()
        .map(|dist| dist.sf(f));
    statistics
}
