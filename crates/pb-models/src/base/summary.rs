//! Model summary structures

use super::coefficient::Coefficient;
use super::statistics::{ModelStatistics, ResidualStatistics};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Printable summary of a fitted panel model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Estimator description
    pub estimator: String,
    /// Model in `y ~ x1 + x2 | entity` notation
    pub specification: String,
    /// Covariance estimator used for standard errors
    pub covariance: String,
    /// Number of observations
    pub n_obs: usize,
    /// Number of entities absorbed
    pub n_entities: usize,
    /// Number of parameters (including intercept)
    pub n_predictors: usize,
    /// Coefficients table
    pub coefficients: Vec<Coefficient>,
    /// Model statistics
    pub model_statistics: ModelStatistics,
    /// Residual statistics
    pub residual_statistics: ResidualStatistics,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.estimator)?;
        writeln!(f, "{:=<1$}", "", self.estimator.chars().count())?;
        writeln!(f, "Model: {}", self.specification)?;
        writeln!(f, "Covariance: {}", self.covariance)?;
        writeln!(f, "Observations: {}", self.n_obs)?;
        writeln!(f, "Entities: {}", self.n_entities)?;
        writeln!(f, "Parameters: {}", self.n_predictors)?;
        writeln!(f)?;

        writeln!(f, "Coefficients:")?;
        writeln!(
            f,
            "{:<20} {:>12} {:>12} {:>12} {:>12}",
            "Term", "Estimate", "Std Error", "t-value", "p-value"
        )?;
        writeln!(
            f,
            "{:-<20} {:-<12} {:-<12} {:-<12} {:-<12}",
            "", "", "", "", ""
        )?;

        for coeff in &self.coefficients {
            writeln!(
                f,
                "{:<20} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {}",
                coeff.name,
                coeff.estimate,
                coeff.std_error.unwrap_or(f64::NAN),
                coeff.t_stat.unwrap_or(f64::NAN),
                coeff.p_value.unwrap_or(f64::NAN),
                coeff.stars()
            )?;
        }
        writeln!(f, "---")?;
        writeln!(f, "Signif. codes: 0.01 '***' 0.05 '**' 0.10 '*'")?;
        writeln!(f)?;

        let stats = &self.model_statistics;
        writeln!(f, "Model Statistics:")?;
        if let Some(r2) = stats.r_squared {
            writeln!(f, "  R-squared (within): {:.4}", r2)?;
        }
        if let Some(r2) = stats.r_squared_between {
            writeln!(f, "  R-squared (between): {:.4}", r2)?;
        }
        if let Some(r2) = stats.r_squared_overall {
            writeln!(f, "  R-squared (overall): {:.4}", r2)?;
        }
        if let (Some(f_stat), Some(p)) = (stats.f_statistic, stats.f_p_value) {
            writeln!(f, "  F-statistic: {:.4} (p = {:.4})", f_stat, p)?;
        }
        if let Some(resid_se) = stats.residual_std_error {
            writeln!(f, "  Residual Std. Error: {:.4}", resid_se)?;
        }
        if let Some(df_resid) = stats.df_residual {
            writeln!(f, "  Residual DF: {}", df_resid)?;
        }
        if let Some(dw) = self.residual_statistics.durbin_watson {
            writeln!(f, "  Durbin-Watson: {:.4}", dw)?;
        }

        Ok(())
    }
}
