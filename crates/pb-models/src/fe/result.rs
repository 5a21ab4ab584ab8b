//! Within regression result structure
//!
//! This module defines the result of fitting an entity fixed-effects model,
//! containing everything later tests and reports read from the fit.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::diagnostics::{HeteroskedasticityCheck, SerialCorrelation};
use super::{CovarianceType, INTERCEPT};
use crate::base::{
    Coefficient, FittedModel, ModelError, ModelStatistics, ModelSummary, ResidualStatistics,
    Result,
};

/// Fitted entity fixed-effects regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFit {
    /// Dependent variable
    pub dependent: String,
    /// Entity key column whose effects were absorbed
    pub entity: String,
    /// Time key column
    pub time: String,
    /// Parameter names, `const` first
    pub names: Vec<String>,
    /// Parameter estimates (β)
    pub params: Array1<f64>,
    /// Standard errors
    pub std_errors: Array1<f64>,
    /// t-statistics
    pub t_stats: Array1<f64>,
    /// Two-sided p-values
    pub p_values: Array1<f64>,
    /// Lower confidence bounds
    pub ci_lower: Array1<f64>,
    /// Upper confidence bounds
    pub ci_upper: Array1<f64>,
    /// Parameter covariance matrix
    pub cov: Array2<f64>,
    /// Fitted values on the within-transformed scale
    pub fitted_values: Array1<f64>,
    /// Residuals on the within-transformed scale
    pub residuals: Array1<f64>,
    /// Residual sum of squares
    pub rss: f64,
    /// Observations used
    pub n_obs: usize,
    /// Entities absorbed
    pub n_entities: usize,
    /// Clusters, when the covariance is clustered
    pub n_clusters: Option<usize>,
    /// n − k − (N − 1)
    pub df_residual: usize,
    /// Covariance estimator behind `cov`
    pub covariance: CovarianceType,
    /// Level of the confidence bounds
    pub confidence_level: f64,
    /// 1 / cond of the transformed design with unit-norm columns
    pub reciprocal_condition: f64,
    /// Goodness of fit
    pub statistics: ModelStatistics,
    /// Residual summary; its Durbin-Watson only pairs periods of one entity
    pub residual_statistics: ResidualStatistics,
    /// Lag-1 residual autocorrelation within entities
    pub serial_correlation: Option<SerialCorrelation>,
    /// Squared residuals against fitted values
    pub heteroskedasticity: Option<HeteroskedasticityCheck>,
}

impl PanelFit {
    /// Estimate of a named parameter
    pub fn param(&self, name: &str) -> Option<f64> {
        self.param_index(name).map(|i| self.params[i])
    }

    /// Standard error of a named parameter
    pub fn std_error(&self, name: &str) -> Option<f64> {
        self.param_index(name).map(|i| self.std_errors[i])
    }

    /// Coefficient row of a named parameter
    pub fn coefficient(&self, name: &str) -> Option<Coefficient> {
        self.param_index(name).map(|i| self.coefficient_at(i))
    }

    /// Number of parameters, intercept included
    pub fn n_params(&self) -> usize {
        self.params.len()
    }

    /// Model in `y ~ x1 + x2 | entity` notation
    pub fn specification(&self) -> String {
        let slopes: Vec<&str> = self
            .names
            .iter()
            .filter(|n| n.as_str() != INTERCEPT)
            .map(|n| n.as_str())
            .collect();
        let rhs = if slopes.is_empty() {
            "1".to_string()
        } else {
            slopes.join(" + ")
        };
        format!("{} ~ {} | {}", self.dependent, rhs, self.entity)
    }

    /// Printable summary
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            estimator: "Entity Fixed Effects (Within) Regression".to_string(),
            specification: self.specification(),
            covariance: self.covariance.to_string(),
            n_obs: self.n_obs,
            n_entities: self.n_entities,
            n_predictors: self.n_params(),
            coefficients: self.coefficients(),
            model_statistics: self.statistics,
            residual_statistics: self.residual_statistics,
        }
    }

    /// Serialize the fit as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::numerical("to_json", e))
    }

    fn coefficient_at(&self, i: usize) -> Coefficient {
        let coefficient = Coefficient::new(self.names[i].clone(), self.params[i])
            .with_std_error(self.std_errors[i])
            .with_t_stat(self.t_stats[i])
            .with_p_value(self.p_values[i])
            .with_ci(self.ci_lower[i], self.ci_upper[i]);

        if self.names[i] == INTERCEPT {
            coefficient.as_intercept()
        } else {
            coefficient
        }
    }
}

impl FittedModel for PanelFit {
    fn param_names(&self) -> &[String] {
        &self.names
    }

    fn params(&self) -> &Array1<f64> {
        &self.params
    }

    fn std_errors(&self) -> &Array1<f64> {
        &self.std_errors
    }

    fn fitted_values(&self) -> &Array1<f64> {
        &self.fitted_values
    }

    fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    fn df_residual(&self) -> usize {
        self.df_residual
    }

    fn inference_df(&self) -> usize {
        match self.n_clusters {
            Some(g) => g.saturating_sub(1),
            None => self.df_residual,
        }
    }

    fn coefficients(&self) -> Vec<Coefficient> {
        (0..self.names.len()).map(|i| self.coefficient_at(i)).collect()
    }

    fn rss(&self) -> f64 {
        self.rss
    }
}

impl fmt::Display for PanelFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        let flag = |flagged: bool| if flagged { " (flagged)" } else { "" };
        if let Some(serial) = &self.serial_correlation {
            writeln!(
                f,
                "  Within-entity lag-1 rho: {:.4}{}",
                serial.rho,
                flag(serial.flagged)
            )?;
        }
        if let Some(check) = &self.heteroskedasticity {
            writeln!(
                f,
                "  corr(e^2, fitted): {:.4}{}",
                check.correlation,
                flag(check.flagged)
            )?;
        }
        Ok(())
    }
}
