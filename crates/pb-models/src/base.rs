//! Core traits and types for fitted models
//!
//! This module defines the shared result vocabulary of PanelBreak:
//! coefficient rows, goodness-of-fit and residual statistics, the printable
//! summary, and the `FittedModel` trait the inference helpers are written
//! against.

use ndarray::Array1;

// Re-export core types
pub use coefficient::{Coefficient, significance_stars};
pub use statistics::{ModelStatistics, ResidualStatistics};
pub use summary::ModelSummary;

pub use crate::error::ModelError;

pub mod coefficient;
pub mod statistics;
pub mod summary;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Read access to a fitted linear model
pub trait FittedModel: Send + Sync {
    /// Parameter names, in estimation order
    fn param_names(&self) -> &[String];

    /// Parameter estimates
    fn params(&self) -> &Array1<f64>;

    /// Standard errors under the model's covariance estimator
    fn std_errors(&self) -> &Array1<f64>;

    /// Fitted values
    fn fitted_values(&self) -> &Array1<f64>;

    /// Residuals
    fn residuals(&self) -> &Array1<f64>;

    /// Degrees of freedom of the residual
    fn df_residual(&self) -> usize;

    /// Degrees of freedom used for t and F reference distributions
    fn inference_df(&self) -> usize;

    /// Coefficient table
    fn coefficients(&self) -> Vec<Coefficient>;

    /// Position of a parameter by name
    fn param_index(&self, name: &str) -> Option<usize> {
        self.param_names().iter().position(|n| n == name)
    }

    /// Residual sum of squares
    fn rss(&self) -> f64 {
        self.residuals().mapv(|r| r * r).sum()
    }
}
