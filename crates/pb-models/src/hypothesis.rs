//! Directional hypothesis tests on single coefficients

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

use crate::base::{FittedModel, ModelError, Result, significance_stars};

/// Alternative hypothesis relative to the reference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// H1: β < b0
    Less,
    /// H1: β > b0
    Greater,
    /// H1: β ≠ b0
    TwoSided,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Less => write!(f, "<"),
            Direction::Greater => write!(f, ">"),
            Direction::TwoSided => write!(f, "!="),
        }
    }
}

/// Outcome of a single-coefficient test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTest {
    pub parameter: String,
    pub direction: Direction,
    pub reference: f64,
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub df: usize,
    pub p_value: f64,
    pub alpha: f64,
    pub reject: bool,
    pub stars: String,
}

impl fmt::Display for CoefficientTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H1: {} {} {}  estimate = {:.6}, t({}) = {:.4}, p = {:.4}{} -> {}",
            self.parameter,
            self.direction,
            self.reference,
            self.estimate,
            self.df,
            self.t_stat,
            self.p_value,
            self.stars,
            if self.reject { "reject H0" } else { "do not reject H0" }
        )
    }
}

/// Test one named coefficient of `model` against `reference`.
///
/// The one-sided p-value halves the two-sided one when the estimate lies on
/// the hypothesized side and is 1 − p/2 otherwise.
pub fn test_coefficient<M: FittedModel>(
    model: &M,
    parameter: &str,
    direction: Direction,
    reference: f64,
    alpha: f64,
) -> Result<CoefficientTest> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(ModelError::InvalidConfig {
            message: format!("alpha must lie in (0, 1), got {}", alpha),
        });
    }

    let i = model
        .param_index(parameter)
        .ok_or_else(|| ModelError::RestrictionNotFound {
            name: parameter.to_string(),
            available: model.param_names().to_vec(),
        })?;

    let estimate = model.params()[i];
    let std_error = model.std_errors()[i];
    let t_stat = (estimate - reference) / std_error;
    let df = model.inference_df();

    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| ModelError::numerical("test_coefficient", e))?;
    let two_sided = (2.0 * dist.sf(t_stat.abs())).clamp(0.0, 1.0);

    let p_value = match direction {
        Direction::TwoSided => two_sided,
        Direction::Less if t_stat < 0.0 => two_sided / 2.0,
        Direction::Greater if t_stat > 0.0 => two_sided / 2.0,
        Direction::Less | Direction::Greater => 1.0 - two_sided / 2.0,
    };

    Ok(CoefficientTest {
        parameter: parameter.to_string(),
        direction,
        reference,
        estimate,
        std_error,
        t_stat,
        df,
        p_value,
        alpha,
        reject: p_value < alpha,
        stars: significance_stars(p_value).to_string(),
    })
}
