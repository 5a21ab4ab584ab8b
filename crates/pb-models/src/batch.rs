//! Independent runs over many specifications or sub-groups
//!
//! Each member runs in isolation on rayon's pool; a failing member is logged
//! and recorded without affecting its siblings. Results keep input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pb_core::data::DataFrame;
use pb_core::prepare::value_counts;

use crate::base::{ModelError, Result};
use crate::fe::{PanelFit, TestConfig, fit_within};
use crate::nested::{NestedSpec, NestedTestOutcome, test_nested_significance};

/// One labelled nested test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub label: String,
    /// The outcome, or the error of the failed run
    pub outcome: Result<NestedTestOutcome>,
}

/// Results of a batch of nested tests, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Entries that completed
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &NestedTestOutcome)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok().map(|o| (e.label.as_str(), o)))
    }

    /// Entries that failed, with their errors
    pub fn failed(&self) -> impl Iterator<Item = (&str, &ModelError)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|err| (e.label.as_str(), err)))
    }

    /// Outcome for a label
    pub fn get(&self, label: &str) -> Option<&Result<NestedTestOutcome>> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.outcome)
    }

    /// Serialize the report as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::numerical("to_json", e))
    }
}

/// Run every labelled specification against `data`
pub fn run_nested_batch(
    data: &DataFrame,
    specs: &[(String, NestedSpec)],
    config: &TestConfig,
) -> BatchReport {
    let entries: Vec<BatchEntry> = specs
        .par_iter()
        .map(|(label, spec)| {
            let outcome = test_nested_significance(data, spec, config);
            if let Err(e) = &outcome {
                warn!(label = %label, error = %e, "nested test failed");
            }
            BatchEntry {
                label: label.clone(),
                outcome,
            }
        })
        .collect();

    let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
    info!(
        total = entries.len(),
        failed,
        "nested batch finished"
    );

    BatchReport { entries }
}

/// Fit one within regression per distinct value of `group_col`.
///
/// Groups are returned in sorted key order, each with its own result.
pub fn fit_by_group<S: AsRef<str> + Sync>(
    data: &DataFrame,
    group_col: &str,
    dependent: &str,
    regressors: &[S],
    entity: &str,
    time: &str,
    config: &TestConfig,
) -> Result<Vec<(String, Result<PanelFit>)>> {
    let keys = data.keys(group_col)?;
    let groups: Vec<String> = value_counts(data, group_col)?.into_keys().collect();

    let fits = groups
        .into_par_iter()
        .map(|group| {
            let mask: Vec<bool> = keys.iter().map(|k| k.as_deref() == Some(group.as_str())).collect();
            let fit = data
                .filter(&mask)
                .map_err(ModelError::from)
                .and_then(|subset| fit_within(&subset, dependent, regressors, entity, time, config));

            if let Err(e) = &fit {
                warn!(group = %group, error = %e, "group fit failed");
            }
            (group, fit)
        })
        .collect();

    Ok(fits)
}
