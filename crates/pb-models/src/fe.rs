//! Entity fixed-effects ("within") panel regression
//!
//! The estimator demeans every variable by entity and adds back the grand
//! mean, so the intercept survives and reports the average entity effect.
//! Entity effects are absorbed rather than estimated: they cost N − 1
//! residual degrees of freedom but never appear as parameters.

pub mod diagnostics;

mod covariance;
mod result;
mod sample;
mod within;

#[cfg(test)]
mod tests;

// Re-exports
pub use result::PanelFit;
pub use sample::{PanelSample, SampleReport};
pub use within::{INTERCEPT, fit_within};

pub(crate) use within::fit_sample;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::base::{ModelError, Result};

/// Covariance estimator for the parameter estimates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovarianceType {
    /// Homoskedastic: s²(X'X)⁻¹
    Unadjusted,
    /// Heteroskedasticity-robust sandwich, scaled by n / df
    #[default]
    Robust,
    /// Cluster-robust sandwich over the groups of the named column
    Clustered(String),
}

impl CovarianceType {
    /// Cluster column, when clustered
    pub fn cluster_column(&self) -> Option<&str> {
        match self {
            CovarianceType::Clustered(column) => Some(column),
            _ => None,
        }
    }
}

impl fmt::Display for CovarianceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovarianceType::Unadjusted => write!(f, "Unadjusted"),
            CovarianceType::Robust => write!(f, "Robust"),
            CovarianceType::Clustered(column) => write!(f, "Clustered ({})", column),
        }
    }
}

/// Estimation and testing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    /// Significance level of the nested test
    pub alpha: f64,
    /// Covariance estimator
    pub covariance: CovarianceType,
    /// Largest tolerated gap between the Wald F and the sum-of-squares F
    pub divergence_tolerance: f64,
    /// Smallest accepted reciprocal condition number of the design
    pub rank_tolerance: f64,
    /// Share of a regressor's total sum of squares that must lie within
    /// entities; at or below it the regressor counts as constant
    pub variation_tolerance: f64,
    /// Entities with fewer observations are excluded before fitting
    pub min_periods_per_entity: usize,
    /// Confidence level for coefficient intervals
    pub confidence_level: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            covariance: CovarianceType::Robust,
            divergence_tolerance: 1e-2,
            rank_tolerance: 1e-10,
            variation_tolerance: 1e-12,
            min_periods_per_entity: 2,
            confidence_level: 0.95,
        }
    }
}

impl TestConfig {
    /// Set the significance level
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the covariance estimator
    pub fn with_covariance(mut self, covariance: CovarianceType) -> Self {
        self.covariance = covariance;
        self
    }

    /// Check that every field is in range
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if value > 0.0 && value < 1.0 {
                Ok(())
            } else {
                Err(ModelError::InvalidConfig {
                    message: format!("{} must lie in (0, 1), got {}", name, value),
                })
            }
        };
        let tolerance = |name: &str, value: f64| {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ModelError::InvalidConfig {
                    message: format!("{} must be a finite non-negative number, got {}", name, value),
                })
            }
        };

        unit("alpha", self.alpha)?;
        unit("confidence_level", self.confidence_level)?;
        tolerance("divergence_tolerance", self.divergence_tolerance)?;
        tolerance("rank_tolerance", self.rank_tolerance)?;
        tolerance("variation_tolerance", self.variation_tolerance)?;

        if self.min_periods_per_entity == 0 {
            return Err(ModelError::InvalidConfig {
                message: "min_periods_per_entity must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
