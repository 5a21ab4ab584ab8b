//! Estimation sample: column checks, missing-value removal and entity exclusion

use serde::{Deserialize, Serialize};
use tracing::debug;

use pb_core::data::{DataError, DataFrame};
use pb_core::panel::PanelIndex;
use pb_core::prepare::complete_cases;

use crate::base::Result;

/// How the estimation sample was derived from the input frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReport {
    /// Rows in the input frame
    pub rows_in: usize,
    /// Rows dropped for a missing value in a required column
    pub rows_dropped_missing: usize,
    /// Entities excluded for having too few observations
    pub entities_excluded: Vec<String>,
    /// Rows removed together with those entities
    pub rows_excluded: usize,
    /// Observations used for estimation
    pub n_obs: usize,
    /// Entities used for estimation
    pub n_entities: usize,
    /// Distinct time periods in the sample
    pub n_periods: usize,
    /// Whether every entity is observed in every period
    pub balanced: bool,
}

/// A validated panel restricted to the rows a model can use
#[derive(Debug, Clone)]
pub struct PanelSample {
    frame: DataFrame,
    index: PanelIndex,
    report: SampleReport,
}

impl PanelSample {
    /// Build the sample for `numeric` variables keyed by (`entity`, `time`).
    ///
    /// Fails on absent or non-numeric columns, duplicated keys, or when no
    /// rows survive filtering.
    pub fn prepare<S: AsRef<str>>(
        data: &DataFrame,
        numeric: &[S],
        entity: &str,
        time: &str,
        cluster: Option<&str>,
        min_periods: usize,
    ) -> Result<Self> {
        for name in numeric {
            let name = name.as_ref();
            let series = data.column(name)?;
            if !series.is_numeric() {
                return Err(DataError::NonNumericData {
                    column: name.to_string(),
                    dtype: series.dtype().to_string(),
                }
                .into());
            }
        }

        let mut required: Vec<&str> = Vec::with_capacity(numeric.len() + 3);
        let keys = [Some(entity), Some(time), cluster];
        for name in numeric.iter().map(|s| s.as_ref()).chain(keys.into_iter().flatten()) {
            if !required.contains(&name) {
                required.push(name);
            }
        }

        let selected = data.select(required.iter())?;
        let (complete, rows_dropped_missing) = complete_cases(&selected, required.as_slice())?;
        if complete.nrows() == 0 {
            return Err(DataError::EmptyAfterDrop {
                stage: "missing-value removal".to_string(),
                dropped: rows_dropped_missing,
            }
            .into());
        }

        let index = PanelIndex::build(&complete, entity, time)?;
        let (mask, entities_excluded) = index.rows_with_min_periods(min_periods);
        let rows_excluded = mask.iter().filter(|keep| !**keep).count();

        let (frame, index) = if rows_excluded > 0 {
            let frame = complete.filter(&mask)?;
            if frame.nrows() == 0 {
                return Err(DataError::EmptyAfterDrop {
                    stage: "entity exclusion".to_string(),
                    dropped: rows_excluded,
                }
                .into());
            }
            let index = PanelIndex::build(&frame, entity, time)?;
            (frame, index)
        } else {
            (complete, index)
        };

        debug!(
            rows_in = data.nrows(),
            rows_dropped_missing,
            entities_excluded = entities_excluded.len(),
            rows_excluded,
            n_obs = frame.nrows(),
            n_entities = index.n_entities(),
            "prepared panel sample"
        );

        let report = SampleReport {
            rows_in: data.nrows(),
            rows_dropped_missing,
            entities_excluded,
            rows_excluded,
            n_obs: frame.nrows(),
            n_entities: index.n_entities(),
            n_periods: index.n_periods(),
            balanced: index.is_balanced(),
        };

        Ok(Self {
            frame,
            index,
            report,
        })
    }

    /// Rows of the sample, restricted to the required columns
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Entity index of the sample rows
    pub fn index(&self) -> &PanelIndex {
        &self.index
    }

    /// How the sample was derived
    pub fn report(&self) -> &SampleReport {
        &self.report
    }

    /// Number of observations
    pub fn n_obs(&self) -> usize {
        self.frame.nrows()
    }
}
