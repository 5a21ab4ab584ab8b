//! Nested-model significance testing
//!
//! Fits a restricted model (intercept + base regressors) and an unrestricted
//! model (base + extra regressors) on one shared panel sample, tests the extra
//! regressors jointly with a Wald test, cross-checks it against the
//! sum-of-squares F, and recommends one of the two models.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pb_core::data::{DataError, DataFrame};

use crate::base::{ModelError, Result};
use crate::fe::{
    CovarianceType, INTERCEPT, PanelFit, PanelSample, SampleReport, TestConfig, fit_sample,
};
use crate::wald::{ManualFTest, WaldTest};


/// Variables of a nested comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSpec {
    pub dependent: String,
    /// Regressors of the restricted model
    pub base: Vec<String>,
    /// Regressors added by the unrestricted model
    pub extra: Vec<String>,
    pub entity: String,
    pub time: String,
    /// Cluster column; overrides the configured covariance when set
    pub cluster: Option<String>,
}

impl NestedSpec {
    pub fn new<S: AsRef<str>>(
        dependent: &str,
        base: &[S],
        extra: &[S],
        entity: &str,
        time: &str,
    ) -> Self {
        Self {
            dependent: dependent.to_string(),
            base: base.iter().map(|s| s.as_ref().to_string()).collect(),
            extra: extra.iter().map(|s| s.as_ref().to_string()).collect(),
            entity: entity.to_string(),
            time: time.to_string(),
            cluster: None,
        }
    }

    /// Cluster the covariance on `column`
    pub fn with_cluster(mut self, column: &str) -> Self {
        self.cluster = Some(column.to_string());
        self
    }

    /// Regressors of the unrestricted model, base first
    pub fn unrestricted_regressors(&self) -> Vec<String> {
        self.base.iter().chain(self.extra.iter()).cloned().collect()
    }

    /// Check the regressor sets: both non-empty, disjoint, free of duplicates,
    /// of the dependent and key columns and of the intercept name
    pub fn validate(&self) -> std::result::Result<(), DataError> {
        let invalid = |message: String| Err(DataError::InvalidParameter(message));

        if self.base.is_empty() {
            return invalid("base regressor set is empty".to_string());
        }
        if self.extra.is_empty() {
            return invalid("extra regressor set is empty".to_string());
        }

        let reserved = [
            self.dependent.as_str(),
            self.entity.as_str(),
            self.time.as_str(),
            INTERCEPT,
        ];
        let mut seen = HashSet::new();
        for name in self.base.iter().chain(self.extra.iter()) {
            if reserved.contains(&name.as_str()) {
                return invalid(format!(
                    "'{}' is the dependent, a key column or the intercept and cannot be a regressor",
                    name
                ));
            }
            if !seen.insert(name.as_str()) {
                return invalid(format!("regressor '{}' appears more than once", name));
            }
        }

        if self.entity == self.time {
            return invalid("entity and time columns must differ".to_string());
        }

        Ok(())
    }
}

/// Recommended model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictKind {
    /// Extra regressors are not jointly significant
    Restricted,
    /// Extra regressors are jointly significant
    Unrestricted,
}

/// Recommendation with the evidence behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub p_value: f64,
    pub alpha: f64,
}

impl Verdict {
    /// p > α keeps the restricted model, p ≤ α selects the unrestricted one.
    /// A NaN p-value is no evidence and keeps the restricted model.
    pub fn decide(p_value: f64, alpha: f64) -> Self {
        let kind = if p_value.is_nan() || p_value > alpha {
            VerdictKind::Restricted
        } else {
            VerdictKind::Unrestricted
        };
        Self {
            kind,
            p_value,
            alpha,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.p_value.is_nan() {
            return write!(
                f,
                "p-value is NaN: no evidence against the restricted model, keep it"
            );
        }
        match self.kind {
            VerdictKind::Restricted => write!(
                f,
                "p = {:.4} > {}: extra regressors not jointly significant, keep the restricted model",
                self.p_value, self.alpha
            ),
            VerdictKind::Unrestricted => write!(
                f,
                "p = {:.4} <= {}: extra regressors jointly significant, use the unrestricted model",
                self.p_value, self.alpha
            ),
        }
    }
}

/// Non-fatal numerical problem found while testing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericalWarning {
    /// The Wald and sum-of-squares F statistics differ by more than the tolerance
    StatisticMismatch {
        wald_f: f64,
        manual_f: f64,
        gap: f64,
        tolerance: f64,
    },
    /// A p-value is NaN or outside [0, 1]
    PValueOutOfRange { source: String, value: f64 },
}

impl fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericalWarning::StatisticMismatch {
                wald_f,
                manual_f,
                gap,
                tolerance,
            } => write!(
                f,
                "Wald F = {:.6} and sum-of-squares F = {:.6} differ by {:.6} (tolerance {})",
                wald_f, manual_f, gap, tolerance
            ),
            NumericalWarning::PValueOutOfRange { source, value } => {
                write!(f, "{} p-value {} is outside [0, 1]", source, value)
            }
        }
    }
}

/// Everything the nested test produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedTestOutcome {
    pub spec: NestedSpec,
    /// Configuration actually used, including a cluster override
    pub config: TestConfig,
    pub sample: SampleReport,
    pub restricted: PanelFit,
    pub unrestricted: PanelFit,
    pub wald: WaldTest,
    pub manual_f: ManualFTest,
    /// |F_wald − F_manual|
    pub statistic_gap: f64,
    pub warnings: Vec<NumericalWarning>,
    pub verdict: Verdict,
}

impl NestedTestOutcome {
    /// The recommended fit
    pub fn selected(&self) -> &PanelFit {
        match self.verdict.kind {
            VerdictKind::Restricted => &self.restricted,
            VerdictKind::Unrestricted => &self.unrestricted,
        }
    }

    /// Fail with the first numerical warning, if any
    pub fn into_strict(self) -> Result<Self> {
        match self.warnings.first() {
            Some(warning) => Err(ModelError::NumericalDivergence {
                message: warning.to_string(),
            }),
            None => Ok(self),
        }
    }

    /// Serialize the outcome as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::numerical("to_json", e))
    }
}

impl fmt::Display for NestedTestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nested Model Significance Test")?;
        writeln!(f, "==============================")?;
        writeln!(f, "Restricted:   {}", self.restricted.specification())?;
        writeln!(f, "Unrestricted: {}", self.unrestricted.specification())?;
        writeln!(
            f,
            "Sample: {} observations, {} entities ({} rows dropped for missing values, {} entities excluded)",
            self.sample.n_obs,
            self.sample.n_entities,
            self.sample.rows_dropped_missing,
            self.sample.entities_excluded.len()
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.wald)?;
        writeln!(f, "{}", self.manual_f)?;
        for warning in &self.warnings {
            writeln!(f, "Warning: {}", warning)?;
        }
        writeln!(f)?;
        writeln!(f, "Verdict: {}", self.verdict)?;
        writeln!(f)?;
        writeln!(f, "{}", self.restricted)?;
        write!(f, "{}", self.unrestricted)
    }
}

/// Test whether `spec.extra` is jointly significant given `spec.base`.
///
/// Both models are fit on the same sample: rows missing any variable of the
/// unrestricted model are dropped, and entities with too few observations are
/// excluded, before either fit.
pub fn test_nested_significance(
    data: &DataFrame,
    spec: &NestedSpec,
    config: &TestConfig,
) -> Result<NestedTestOutcome> {
    config.validate()?;
    spec.validate()?;

    let mut config = config.clone();
    if let Some(cluster) = &spec.cluster {
        config.covariance = CovarianceType::Clustered(cluster.clone());
    }

    let unrestricted_regressors = spec.unrestricted_regressors();
    let mut numeric = Vec::with_capacity(unrestricted_regressors.len() + 1);
    numeric.push(spec.dependent.clone());
    numeric.extend(unrestricted_regressors.iter().cloned());

    let sample = PanelSample::prepare(
        data,
        &numeric,
        &spec.entity,
        &spec.time,
        config.covariance.cluster_column(),
        config.min_periods_per_entity,
    )?;

    let restricted = fit_sample(&sample, &spec.dependent, &spec.base, &config, "restricted")?;
    let unrestricted = fit_sample(
        &sample,
        &spec.dependent,
        &unrestricted_regressors,
        &config,
        "unrestricted",
    )?;

    let wald = WaldTest::compute(&unrestricted, &spec.extra)?;
    let manual_f = ManualFTest::compute(&restricted, &unrestricted)?;
    let statistic_gap = (wald.f_statistic - manual_f.statistic).abs();

    let mut warnings = Vec::new();
    if statistic_gap.is_nan() || statistic_gap > config.divergence_tolerance {
        warnings.push(NumericalWarning::StatisticMismatch {
            wald_f: wald.f_statistic,
            manual_f: manual_f.statistic,
            gap: statistic_gap,
            tolerance: config.divergence_tolerance,
        });
    }
    for (source, value) in [
        ("Wald F", wald.p_value),
        ("Wald chi2", wald.chi2_p_value),
        ("sum-of-squares F", manual_f.p_value),
    ] {
        if !(0.0..=1.0).contains(&value) {
            warnings.push(NumericalWarning::PValueOutOfRange {
                source: source.to_string(),
                value,
            });
        }
    }
    for warning in &warnings {
        warn!(%warning, "numerical warning in nested test");
    }

    debug!(
        wald_f = wald.f_statistic,
        manual_f = manual_f.statistic,
        statistic_gap,
        "compared Wald and sum-of-squares statistics"
    );

    let verdict = Verdict::decide(wald.p_value, config.alpha);
    info!(
        dependent = %spec.dependent,
        extra = %spec.extra.join(", "),
        p_value = verdict.p_value,
        verdict = ?verdict.kind,
        "nested significance test finished"
    );

    Ok(NestedTestOutcome {
        spec: spec.clone(),
        sample: sample.report().clone(),
        config,
        restricted,
        unrestricted,
        wald,
        manual_f,
        statistic_gap,
        warnings,
        verdict,
    })
}
