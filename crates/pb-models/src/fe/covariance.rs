//! Parameter covariance estimators for the within regression
//!
//! Every estimator works on the transformed design X̃ and the within
//! residuals e, and uses the fixed-effects residual df for its scaling.

use std::collections::HashMap;

use ndarray::{Array1, Array2, Axis};

use pb_core::data::DataFrame;

use super::CovarianceType;
use crate::base::{ModelError, Result};

/// Cluster code of every sample row
#[derive(Debug, Clone)]
pub(crate) struct Clusters {
    codes: Vec<usize>,
    n_clusters: usize,
}

impl Clusters {
    /// Group the rows of `frame` by the values of `column`
    pub fn from_frame(frame: &DataFrame, column: &str) -> Result<Self> {
        let keys = frame.keys(column)?;
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut codes = Vec::with_capacity(keys.len());

        for key in keys {
            // Missing keys were dropped with the sample, keep them together if any remain
            let key = key.unwrap_or_default();
            let next = lookup.len();
            codes.push(*lookup.entry(key).or_insert(next));
        }

        let n_clusters = lookup.len();
        if n_clusters < 2 {
            return Err(ModelError::InsufficientClusters {
                column: column.to_string(),
                n_clusters,
            });
        }

        Ok(Self { codes, n_clusters })
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// Covariance of the within estimates under `kind`
pub(crate) fn estimate(
    kind: &CovarianceType,
    x: &Array2<f64>,
    residuals: &Array1<f64>,
    xtx_inv: &Array2<f64>,
    df_residual: usize,
    clusters: Option<&Clusters>,
) -> Result<Array2<f64>> {
    let n = x.nrows() as f64;
    let df = df_residual as f64;

    match kind {
        CovarianceType::Unadjusted => {
            let sigma2 = residuals.mapv(|e| e * e).sum() / df;
            Ok(xtx_inv * sigma2)
        }
        CovarianceType::Robust => {
            // X' diag(e²) X
            let e2 = residuals.mapv(|e| e * e).insert_axis(Axis(1));
            let weighted = x * &e2;
            let meat = weighted.t().dot(x);
            Ok(sandwich(xtx_inv, &meat) * (n / df))
        }
        CovarianceType::Clustered(column) => {
            let clusters = clusters.ok_or_else(|| ModelError::InvalidConfig {
                message: format!("cluster codes for '{}' were not built", column),
            })?;
            let g = clusters.n_clusters as f64;

            // Row g holds the score s_g = X_g' e_g
            let mut scores = Array2::<f64>::zeros((clusters.n_clusters, x.ncols()));
            for (i, &code) in clusters.codes.iter().enumerate() {
                let mut row = scores.row_mut(code);
                row.scaled_add(residuals[i], &x.row(i));
            }
            let meat = scores.t().dot(&scores);

            let correction = (g / (g - 1.0)) * ((n - 1.0) / df);
            Ok(sandwich(xtx_inv, &meat) * correction)
        }
    }
}

fn sandwich(bread: &Array2<f64>, meat: &Array2<f64>) -> Array2<f64> {
    bread.dot(meat).dot(bread)
}
