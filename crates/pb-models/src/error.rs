//! Model-related error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pb_core::data::DataError;

/// Model-related errors
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ModelError {
    /// Data-related error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// The within-transformed design is numerically singular
    #[error(
        "Rank deficiency in {step} model [{variables}]: reciprocal condition number {reciprocal_condition:.3e}"
    )]
    RankDeficiency {
        /// Regressor set of the failing model
        variables: String,
        /// Which model was being fit
        step: String,
        /// 1 / cond of the transformed design
        reciprocal_condition: f64,
    },

    /// A regressor is constant within every entity
    #[error("Regressor '{variable}' has no within-entity variation across {n_entities} entities")]
    InsufficientVariation {
        /// Offending regressor
        variable: String,
        /// Number of entities in the sample
        n_entities: usize,
    },

    /// Insufficient data for model fitting
    #[error(
        "Not enough data: {n_obs} observations for {n_params} parameters and {n_entities} entity effects"
    )]
    InsufficientData {
        /// Number of observations
        n_obs: usize,
        /// Number of parameters, intercept included
        n_params: usize,
        /// Number of absorbed entity effects
        n_entities: usize,
    },

    /// Clustered covariance needs at least two clusters
    #[error("Clustered covariance on '{column}' needs at least 2 clusters, found {n_clusters}")]
    InsufficientClusters {
        /// Cluster column
        column: String,
        /// Distinct clusters in the sample
        n_clusters: usize,
    },

    /// A restricted parameter is absent from the unrestricted model
    #[error("Restriction '{name}' not found among parameters [{}]", .available.join(", "))]
    RestrictionNotFound {
        /// Requested parameter
        name: String,
        /// Parameters of the model
        available: Vec<String>,
    },

    /// A restricted name matches more than one parameter
    #[error("Restriction '{name}' matches {matches} parameters")]
    AmbiguousRestriction {
        /// Requested parameter
        name: String,
        /// Number of parameters with that name
        matches: usize,
    },

    /// The Wald and sum-of-squares statistics disagree
    #[error("Numerical divergence: {message}")]
    NumericalDivergence {
        /// Description of the disagreement
        message: String,
    },

    /// Numerical computation error
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },

    /// Invalid model configuration
    #[error("Invalid model configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },
}

impl ModelError {
    pub(crate) fn numerical(operation: &str, message: impl std::fmt::Display) -> Self {
        ModelError::NumericalError {
            message: message.to_string(),
            operation: operation.to_string(),
        }
    }
}
