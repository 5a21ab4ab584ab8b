//! Joint linear restriction tests
//!
//! `WaldTest` tests H0: Rβ = 0 with the covariance estimator of the fit.
//! `ManualFTest` is the classical sum-of-squares F between a restricted and an
//! unrestricted fit on the same sample, used as a numerical cross-check.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor};
use std::fmt;
use tracing::debug;

use crate::base::{FittedModel, ModelError, Result};
use crate::fe::{CovarianceType, PanelFit};
use crate::linalg;

/// Selection matrix R (q × p) with a single 1 per row, located by parameter name.
///
/// A name must match exactly one parameter.
pub fn restriction_matrix<S: AsRef<str>>(names: &[String], restricted: &[S]) -> Result<Array2<f64>> {
    let mut r = Array2::<f64>::zeros((restricted.len(), names.len()));
    for (row, name) in restricted.iter().enumerate() {
        let name = name.as_ref();
        let positions: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(i, _)| i)
            .collect();

        match positions.as_slice() {
            [] => {
                return Err(ModelError::RestrictionNotFound {
                    name: name.to_string(),
                    available: names.to_vec(),
                });
            }
            [col] => r[[row, *col]] = 1.0,
            _ => {
                return Err(ModelError::AmbiguousRestriction {
                    name: name.to_string(),
                    matches: positions.len(),
                });
            }
        }
    }
    Ok(r)
}

/// Wald test of H0: the restricted parameters are jointly zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaldTest {
    /// Parameters set to zero under H0
    pub restrictions: Vec<String>,
    /// W = (Rβ)'(RVR')⁻¹(Rβ)
    pub chi2_statistic: f64,
    /// W / q
    pub f_statistic: f64,
    /// q
    pub df_num: usize,
    /// Residual df of the fit, or G − 1 when clustered
    pub df_denom: usize,
    /// Upper tail of F(q, df_denom)
    pub p_value: f64,
    /// Upper tail of χ²(q)
    pub chi2_p_value: f64,
    /// Covariance estimator behind V
    pub covariance: CovarianceType,
}

impl WaldTest {
    /// Test that the named parameters of `fit` are jointly zero
    pub fn compute<S: AsRef<str>>(fit: &PanelFit, restricted: &[S]) -> Result<Self> {
        if restricted.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: "Wald test needs at least one restriction".to_string(),
            });
        }

        let r = restriction_matrix(&fit.names, restricted)?;
        let q = r.nrows();

        let rb: Array1<f64> = r.dot(&fit.params);
        let rvr = r.dot(&fit.cov).dot(&r.t());
        let rvr_inv = linalg::symmetric_inverse(&rvr).ok_or_else(|| {
            ModelError::numerical("wald", "R V R' is singular for the requested restrictions")
        })?;

        let chi2_statistic = rb.dot(&rvr_inv.dot(&rb));
        let f_statistic = chi2_statistic / q as f64;
        let df_denom = fit.inference_df();

        let f_dist = FisherSnedecor::new(q as f64, df_denom as f64)
            .map_err(|e| ModelError::numerical("wald", e))?;
        let chi2_dist = ChiSquared::new(q as f64).map_err(|e| ModelError::numerical("wald", e))?;

        let test = Self {
            restrictions: restricted.iter().map(|s| s.as_ref().to_string()).collect(),
            chi2_statistic,
            f_statistic,
            df_num: q,
            df_denom,
            p_value: f_dist.sf(f_statistic),
            chi2_p_value: chi2_dist.sf(chi2_statistic),
            covariance: fit.covariance.clone(),
        };

        debug!(
            q,
            df_denom,
            f = test.f_statistic,
            p_value = test.p_value,
            covariance = %test.covariance,
            "computed Wald test"
        );

        Ok(test)
    }
}

impl fmt::Display for WaldTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wald test: {} = 0", self.restrictions.join(" = "))?;
        writeln!(f, "  Covariance: {}", self.covariance)?;
        writeln!(
            f,
            "  F({}, {}) = {:.4}, p = {:.4}",
            self.df_num, self.df_denom, self.f_statistic, self.p_value
        )?;
        write!(
            f,
            "  Chi2({}) = {:.4}, p = {:.4}",
            self.df_num, self.chi2_statistic, self.chi2_p_value
        )
    }
}

/// Sum-of-squares F between nested fits on the same sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualFTest {
    pub rss_restricted: f64,
    pub rss_unrestricted: f64,
    /// Number of restrictions
    pub q: usize,
    /// Residual df of the unrestricted fit
    pub df_denom: usize,
    /// ((RSS_r − RSS_u) / q) / (RSS_u / df_u)
    pub statistic: f64,
    /// Upper tail of F(q, df_denom)
    pub p_value: f64,
}

impl ManualFTest {
    /// F statistic from the two residual sums of squares
    pub fn compute(restricted: &PanelFit, unrestricted: &PanelFit) -> Result<Self> {
        if restricted.n_obs != unrestricted.n_obs {
            return Err(ModelError::numerical(
                "manual_f",
                format!(
                    "fits use different samples ({} vs {} observations)",
                    restricted.n_obs, unrestricted.n_obs
                ),
            ));
        }

        let q = unrestricted
            .n_params()
            .checked_sub(restricted.n_params())
            .filter(|&q| q > 0)
            .ok_or_else(|| {
                ModelError::numerical("manual_f", "unrestricted fit must have more parameters")
            })?;

        let df_denom = unrestricted.df_residual();
        let rss_r = restricted.rss();
        let rss_u = unrestricted.rss();
        let statistic = ((rss_r - rss_u) / q as f64) / (rss_u / df_denom as f64);

        let dist = FisherSnedecor::new(q as f64, df_denom as f64)
            .map_err(|e| ModelError::numerical("manual_f", e))?;

        Ok(Self {
            rss_restricted: rss_r,
            rss_unrestricted: rss_u,
            q,
            df_denom,
            statistic,
            p_value: dist.sf(statistic),
        })
    }
}

impl fmt::Display for ManualFTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sum-of-squares F({}, {}) = {:.4}, p = {:.4} (RSS {:.6} -> {:.6})",
            self.q,
            self.df_denom,
            self.statistic,
            self.p_value,
            self.rss_restricted,
            self.rss_unrestricted
        )
    }
}
