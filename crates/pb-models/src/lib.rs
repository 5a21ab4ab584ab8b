//! PanelBreak models: nested fixed-effects significance testing
//!
//! The central entry point is [`nested::test_nested_significance`], which fits
//! a restricted and an unrestricted entity fixed-effects regression on one
//! panel sample, tests the added regressors jointly, and recommends a model.
//! The within estimator, diagnostics, single-coefficient hypotheses and a
//! batch runner are available on their own.

pub mod base;
pub mod batch;
pub mod error;
pub mod fe;
pub mod hypothesis;
pub mod nested;
pub mod wald;

mod linalg;

#[cfg(test)]
mod test_support;

pub use base::{FittedModel, ModelError, Result};
pub use fe::{CovarianceType, PanelFit, TestConfig, fit_within};
pub use nested::{NestedSpec, NestedTestOutcome, Verdict, VerdictKind, test_nested_significance};
