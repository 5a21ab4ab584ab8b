//! Tests for the within estimator, its sample preparation and diagnostics

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, array, s};
use statrs::distribution::{ContinuousCDF, StudentsT};

use pb_core::data::{DataError, DataFrame, DataFrameBuilder, Series};

use super::diagnostics::{
    CollinearityLevel, ScreeningStatus, durbin_watson, entity_variance, heteroskedasticity,
    jarque_bera, screen_variance, serial_correlation, vif,
};
use super::*;
use crate::base::{FittedModel, ModelError};
use crate::linalg;
use crate::test_support::{entity_label, random_panel};

// ==================== Test Fixtures ====================

fn unadjusted() -> TestConfig {
    TestConfig::default().with_covariance(CovarianceType::Unadjusted)
}

/// Six entities over ten periods, y = effect + 2·x1 − x2 + small noise
fn clean_panel() -> DataFrame {
    random_panel(6, 10, 2.0, -1.0, 0.001, 7)
}

/// Noisy panel for comparisons against closed forms
fn noisy_panel() -> DataFrame {
    random_panel(5, 8, 1.0, 0.5, 1.0, 11)
}

fn with_float(df: DataFrame, name: &str, values: Vec<f64>) -> DataFrame {
    df.with_column(name, Series::float(values)).unwrap()
}

/// Ten entities over twenty periods, y = effect + 2·x1 + u with
/// u_t = ρ·u_{t−1} + N(0, 1). Rows of each entity are stored newest first.
fn ar1_panel(rho: f64, seed: u64) -> DataFrame {
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();

    let mut entity = Vec::new();
    let mut time = Vec::new();
    let mut x1 = Vec::new();
    let mut y = Vec::new();

    for e in 0..10 {
        let mut u = 0.0;
        let mut rows = Vec::new();
        for t in 0..20 {
            u = rho * u + normal.sample(&mut rng);
            let x: f64 = normal.sample(&mut rng);
            rows.push((t as i64 + 1, x, e as f64 + 2.0 * x + u));
        }
        for (t, x, value) in rows.into_iter().rev() {
            entity.push(entity_label(e));
            time.push(t);
            x1.push(x);
            y.push(value);
        }
    }

    DataFrameBuilder::new()
        .with_column("entity", Series::String(entity))
        .unwrap()
        .with_column("time", Series::int(time))
        .unwrap()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}

// ==================== Estimation ====================

#[test]
fn test_within_recovers_slopes() {
    let df = clean_panel();
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();

    assert_eq!(fit.names, vec!["const", "x1", "x2"]);
    assert_abs_diff_eq!(fit.param("x1").unwrap(), 2.0, epsilon = 1e-2);
    assert_abs_diff_eq!(fit.param("x2").unwrap(), -1.0, epsilon = 1e-2);

    assert_eq!(fit.n_obs, 60);
    assert_eq!(fit.n_entities, 6);
    assert_eq!(fit.n_clusters, None);
    // n − k − (N − 1)
    assert_eq!(fit.df_residual, 60 - 3 - 5);
    assert_eq!(fit.inference_df(), fit.df_residual);
    assert_eq!(fit.entity, "entity");
    assert_eq!(fit.time, "time");
}

#[test]
fn test_intercept_passes_through_grand_means() {
    let df = noisy_panel();
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();

    let mean = |name: &str| df.float_column(name).unwrap().mean().unwrap();
    let expected = mean("y") - fit.params[1] * mean("x1") - fit.params[2] * mean("x2");
    assert_abs_diff_eq!(fit.param(INTERCEPT).unwrap(), expected, epsilon = 1e-10);

    // Transformed residuals sum to zero with an intercept
    assert_abs_diff_eq!(fit.residuals.sum(), 0.0, epsilon = 1e-9);
}

#[test]
fn test_matches_dummy_variable_regression() {
    let n_entities = 5;
    let n_periods = 8;
    let df = noisy_panel();
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();

    let x = df.numeric_matrix(&["x1", "x2"]).unwrap();
    let y = df.float_column("y").unwrap();
    let n = df.nrows();

    let mut z = Array2::<f64>::zeros((n, 2 + n_entities));
    z.slice_mut(s![.., 0..2]).assign(&x);
    for r in 0..n {
        z[[r, 2 + r / n_periods]] = 1.0;
    }

    let beta = linalg::least_squares(&z, &y).unwrap();
    let resid: Array1<f64> = &y - &z.dot(&beta);
    let rss = resid.mapv(|e| e * e).sum();
    let df_dummies = n - z.ncols();
    let cov = linalg::symmetric_inverse(&z.t().dot(&z)).unwrap() * (rss / df_dummies as f64);

    assert_eq!(fit.df_residual, df_dummies);
    assert_abs_diff_eq!(fit.rss, rss, epsilon = 1e-8);
    for j in 0..2 {
        assert_abs_diff_eq!(fit.params[j + 1], beta[j], epsilon = 1e-8);
        assert_abs_diff_eq!(fit.std_errors[j + 1], cov[[j, j]].sqrt(), epsilon = 1e-8);
    }
}

#[test]
fn test_covariance_choice_leaves_estimates_unchanged() {
    let df = noisy_panel();
    let plain = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();
    let robust =
        fit_within(&df, "y", &["x1", "x2"], "entity", "time", &TestConfig::default()).unwrap();

    assert_eq!(robust.covariance, CovarianceType::Robust);
    for j in 0..3 {
        assert_abs_diff_eq!(plain.params[j], robust.params[j], epsilon = 1e-12);
    }
    assert!((plain.std_errors[1] - robust.std_errors[1]).abs() > 1e-8);
}

#[test]
fn test_regressor_units_do_not_change_inference() {
    let df = noisy_panel();
    let x2 = df.float_column("x2").unwrap();
    let df = with_float(df, "x2_small", (&x2 * 1e-7).to_vec());
    let config = TestConfig::default();

    let original = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &config).unwrap();
    let rescaled = fit_within(&df, "y", &["x1", "x2_small"], "entity", "time", &config).unwrap();

    assert_abs_diff_eq!(rescaled.t_stats[2], original.t_stats[2], epsilon = 1e-6);
    assert_abs_diff_eq!(rescaled.p_values[2], original.p_values[2], epsilon = 1e-8);
    assert_abs_diff_eq!(
        rescaled.param("x2_small").unwrap() * 1e-7,
        original.param("x2").unwrap(),
        epsilon = 1e-8
    );
    assert_abs_diff_eq!(
        rescaled.reciprocal_condition,
        original.reciprocal_condition,
        epsilon = 1e-8
    );
}

#[test]
fn test_confidence_interval_brackets_estimate() {
    let df = noisy_panel();
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();

    let t = StudentsT::new(0.0, 1.0, fit.df_residual as f64).unwrap();
    let critical = t.inverse_cdf(0.975);
    for j in 0..3 {
        assert!(fit.ci_lower[j] < fit.params[j] && fit.params[j] < fit.ci_upper[j]);
        assert_abs_diff_eq!(
            fit.ci_upper[j] - fit.params[j],
            critical * fit.std_errors[j],
            epsilon = 1e-10
        );
    }
}

#[test]
fn test_goodness_of_fit_in_range() {
    let fit = fit_within(&clean_panel(), "y", &["x1", "x2"], "entity", "time", &unadjusted())
        .unwrap();
    let stats = fit.statistics;

    let within = stats.r_squared.unwrap();
    assert!(within > 0.99 && within <= 1.0);
    let overall = stats.r_squared_overall.unwrap();
    assert!((0.0..=1.0).contains(&overall));
    assert!((0.0..=1.0).contains(&stats.r_squared_between.unwrap()));
    assert_eq!(stats.df_model, Some(2));
    assert_eq!(stats.df_residual, Some(fit.df_residual));
    assert!(stats.f_p_value.unwrap() < 1e-10);
}

// ==================== Clustering ====================

#[test]
fn test_clustered_on_entity() {
    let df = noisy_panel();
    let config = TestConfig::default().with_covariance(CovarianceType::Clustered("entity".into()));
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &config).unwrap();

    assert_eq!(fit.n_clusters, Some(5));
    assert_eq!(fit.inference_df(), 4);

    // p-values use G − 1 degrees of freedom
    let t = StudentsT::new(0.0, 1.0, 4.0).unwrap();
    let expected = 2.0 * t.sf(fit.t_stats[1].abs());
    assert_abs_diff_eq!(fit.p_values[1], expected, epsilon = 1e-12);
}

#[test]
fn test_single_cluster_rejected() {
    let df = noisy_panel();
    let n = df.nrows();
    let df = df
        .with_column("region", Series::strings(&vec!["north"; n]))
        .unwrap();
    let config = TestConfig::default().with_covariance(CovarianceType::Clustered("region".into()));

    let err = fit_within(&df, "y", &["x1"], "entity", "time", &config).unwrap_err();
    assert_eq!(
        err,
        ModelError::InsufficientClusters {
            column: "region".to_string(),
            n_clusters: 1,
        }
    );
}

#[test]
fn test_absent_cluster_column() {
    let config = TestConfig::default().with_covariance(CovarianceType::Clustered("region".into()));
    let err = fit_within(&noisy_panel(), "y", &["x1"], "entity", "time", &config).unwrap_err();
    assert_eq!(
        err,
        ModelError::Data(DataError::ColumnNotFound("region".to_string()))
    );
}

// ==================== Failure Modes ====================

#[test]
fn test_time_invariant_regressor_rejected() {
    let df = clean_panel();
    let size: Vec<f64> = (0..df.nrows()).map(|r| (r / 10) as f64 * 1.5).collect();
    let df = with_float(df, "size", size);

    let err = fit_within(&df, "y", &["x1", "size"], "entity", "time", &unadjusted()).unwrap_err();
    assert_eq!(
        err,
        ModelError::InsufficientVariation {
            variable: "size".to_string(),
            n_entities: 6,
        }
    );
}

#[test]
fn test_collinear_regressors_rejected() {
    let df = clean_panel();
    let x1 = df.float_column("x1").unwrap();
    let x2 = df.float_column("x2").unwrap();
    let x3 = (&x1 + &(&x2 * 2.0)).to_vec();
    let df = with_float(df, "x3", x3);

    let err = fit_within(&df, "y", &["x1", "x2", "x3"], "entity", "time", &unadjusted())
        .unwrap_err();
    match err {
        ModelError::RankDeficiency {
            variables,
            step,
            reciprocal_condition,
        } => {
            assert_eq!(variables, "x1, x2, x3");
            assert_eq!(step, "single");
            assert!(reciprocal_condition < 1e-10);
        }
        other => panic!("expected rank deficiency, got {:?}", other),
    }
}

#[test]
fn test_too_few_observations() {
    let df = random_panel(2, 2, 1.0, 1.0, 1.0, 3);
    let err = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap_err();
    assert_eq!(
        err,
        ModelError::InsufficientData {
            n_obs: 4,
            n_params: 3,
            n_entities: 2,
        }
    );
}

#[test]
fn test_duplicate_entity_time_rejected() {
    let df = noisy_panel();
    let mut rows: Vec<usize> = (0..df.nrows()).collect();
    rows.push(0);
    let df = df.take(&rows).unwrap();

    let err = fit_within(&df, "y", &["x1"], "entity", "time", &unadjusted()).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::DuplicateKey { .. })
    ));
}

#[test]
fn test_non_numeric_regressor_rejected() {
    let df = noisy_panel();
    let n = df.nrows();
    let df = df.with_column("label", Series::strings(&vec!["a"; n])).unwrap();

    let err = fit_within(&df, "y", &["label"], "entity", "time", &unadjusted()).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::NonNumericData { ref column, .. }) if column == "label"
    ));
}

#[test]
fn test_invalid_config() {
    let df = noisy_panel();
    for config in [
        TestConfig::default().with_alpha(0.0),
        TestConfig::default().with_alpha(1.0),
        TestConfig {
            min_periods_per_entity: 0,
            ..TestConfig::default()
        },
        TestConfig {
            divergence_tolerance: f64::NAN,
            ..TestConfig::default()
        },
    ] {
        let err = fit_within(&df, "y", &["x1"], "entity", "time", &config).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig { .. }));
    }
}

#[test]
fn test_config_defaults_fill_partial_json() {
    let config: TestConfig = serde_json::from_str(r#"{"alpha": 0.1}"#).unwrap();
    assert_eq!(config.alpha, 0.1);
    assert_eq!(config.covariance, CovarianceType::Robust);
    assert_eq!(config.min_periods_per_entity, 2);
    assert!(config.validate().is_ok());

    let config: TestConfig =
        serde_json::from_str(r#"{"covariance": {"Clustered": "firm"}}"#).unwrap();
    assert_eq!(config.covariance.cluster_column(), Some("firm"));
}

#[test]
fn test_intercept_name_rejected_as_regressor() {
    let df = clean_panel();
    let x1 = df.float_column("x1").unwrap().to_vec();
    let df = with_float(df, "const", x1);

    let err = fit_within(&df, "y", &["x2", "const"], "entity", "time", &unadjusted())
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::InvalidParameter(ref message)) if message.contains("const")
    ));
}

#[test]
fn test_repeated_regressor_rejected() {
    let err = fit_within(&clean_panel(), "y", &["x1", "x1"], "entity", "time", &unadjusted())
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::InvalidParameter(ref message)) if message.contains("x1")
    ));

    let err = fit_within(&clean_panel(), "y", &["x1", "y"], "entity", "time", &unadjusted())
        .unwrap_err();
    assert!(matches!(err, ModelError::Data(DataError::InvalidParameter(_))));
}

// ==================== Sample Preparation ====================

#[test]
fn test_singleton_entity_excluded() {
    let df = random_panel(5, 5, 1.0, 1.0, 1.0, 21);
    let mask: Vec<bool> = (0..df.nrows()).map(|r| r <= 20).collect();
    let df = df.filter(&mask).unwrap();

    let sample = PanelSample::prepare(&df, &["y", "x1", "x2"], "entity", "time", None, 2).unwrap();
    let report = sample.report();
    assert_eq!(report.rows_in, 21);
    assert_eq!(report.entities_excluded, vec!["E".to_string()]);
    assert_eq!(report.rows_excluded, 1);
    assert_eq!(report.n_obs, 20);
    assert_eq!(report.n_entities, 4);
    assert!(report.balanced);

    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();
    assert_eq!(fit.n_obs, 20);
    assert_eq!(fit.n_entities, 4);
}

#[test]
fn test_missing_rows_dropped() {
    let df = noisy_panel();
    let mut y = df.float_column("y").unwrap();
    y[3] = f64::NAN;
    y[17] = f64::NAN;
    let df = df.with_column_replaced("y", Series::float(y)).unwrap();

    let sample = PanelSample::prepare(&df, &["y", "x1"], "entity", "time", None, 2).unwrap();
    assert_eq!(sample.report().rows_dropped_missing, 2);
    assert_eq!(sample.n_obs(), 38);
    assert!(!sample.report().balanced);

    let fit = fit_within(&df, "y", &["x1"], "entity", "time", &unadjusted()).unwrap();
    assert_eq!(fit.n_obs, 38);
    assert_eq!(fit.df_residual, 38 - 2 - 4);
}

#[test]
fn test_every_row_missing() {
    let df = noisy_panel();
    let n = df.nrows();
    let df = df
        .with_column_replaced("y", Series::float(vec![f64::NAN; n]))
        .unwrap();

    let err = fit_within(&df, "y", &["x1"], "entity", "time", &unadjusted()).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Data(DataError::EmptyAfterDrop { dropped: 40, .. })
    ));
}

// ==================== Reporting ====================

#[test]
fn test_display_and_json() {
    let fit = fit_within(&noisy_panel(), "y", &["x1", "x2"], "entity", "time", &unadjusted())
        .unwrap();

    assert_eq!(fit.specification(), "y ~ x1 + x2 | entity");
    let text = fit.to_string();
    assert!(text.contains("Entity Fixed Effects"));
    assert!(text.contains("const"));
    assert!(text.contains("x2"));

    let json: serde_json::Value = serde_json::from_str(&fit.to_json().unwrap()).unwrap();
    assert_eq!(json["names"][1], "x1");
    assert_eq!(json["df_residual"], 33);
}

#[test]
fn test_coefficient_rows() {
    let fit = fit_within(&noisy_panel(), "y", &["x1", "x2"], "entity", "time", &unadjusted())
        .unwrap();

    let rows = fit.coefficients();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_intercept);
    assert!(!rows[1].is_intercept);

    let x1 = fit.coefficient("x1").unwrap();
    assert_eq!(x1.std_error, Some(fit.std_errors[1]));
    assert_eq!(x1.p_value, Some(fit.p_values[1]));
    assert!(fit.coefficient("x9").is_none());
}

// ==================== Diagnostics ====================

fn collinearity_frame() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("a", Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))
        .unwrap()
        .with_column("b", Series::float(vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0]))
        .unwrap()
        .with_column("c", Series::float(vec![3.0, 3.0, 7.0, 7.0, 11.0, 11.0]))
        .unwrap()
        .with_column("flat", Series::float(vec![1.0; 6]))
        .unwrap()
        .with_column(
            "sparse",
            Series::float(vec![1.0, f64::NAN, f64::NAN, f64::NAN, 2.0, 3.0]),
        )
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_vif_single_column_is_one() {
    let result = vif(&collinearity_frame(), &["a"]).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].vif, 1.0);
    assert_eq!(result[0].level, CollinearityLevel::Excellent);
}

#[test]
fn test_vif_perfect_collinearity() {
    // c = a + b
    let result = vif(&collinearity_frame(), &["a", "b", "c"]).unwrap();
    for row in &result {
        assert!(row.vif.is_infinite());
        assert_eq!(row.level, CollinearityLevel::Severe);
        assert_eq!(row.tolerance, 0.0);
    }
}

#[test]
fn test_vif_two_columns() {
    let result = vif(&collinearity_frame(), &["a", "b"]).unwrap();
    // corr(a, b) = 29/35, so VIF = 1 / (1 − r²)
    let r: f64 = 29.0 / 35.0;
    let expected = 1.0 / (1.0 - r * r);
    assert_abs_diff_eq!(result[0].vif, expected, epsilon = 1e-8);
    assert_abs_diff_eq!(result[1].vif, expected, epsilon = 1e-8);
    assert_eq!(result[0].level, CollinearityLevel::Moderate);
}

#[test]
fn test_collinearity_bands() {
    assert_eq!(CollinearityLevel::classify(2.99), CollinearityLevel::Excellent);
    assert_eq!(CollinearityLevel::classify(3.0), CollinearityLevel::Moderate);
    assert_eq!(CollinearityLevel::classify(5.0), CollinearityLevel::Moderate);
    assert_eq!(CollinearityLevel::classify(5.01), CollinearityLevel::Severe);
}

#[test]
fn test_screen_variance() {
    let report = screen_variance(
        &collinearity_frame(),
        &["a", "flat", "sparse", "absent"],
        1e-8,
        0.3,
    )
    .unwrap();

    assert_eq!(report.skipped, vec!["absent".to_string()]);
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.rows[0].status, ScreeningStatus::Ok);
    assert_abs_diff_eq!(report.rows[0].variance, 3.5, epsilon = 1e-12);
    assert_eq!(report.rows[1].status, ScreeningStatus::NearZeroVariance);
    assert_eq!(report.rows[2].status, ScreeningStatus::HighMissing);
    assert_eq!(report.rows[2].missing, 3);
    assert_eq!(report.passed(), vec!["a"]);
}

#[test]
fn test_entity_variance() {
    let df = DataFrameBuilder::new()
        .with_column("firm", Series::strings(&["A", "A", "A", "B", "B", "C"]))
        .unwrap()
        .with_column("v", Series::float(vec![1.0, 2.0, 3.0, 5.0, 5.0, 9.0]))
        .unwrap()
        .build()
        .unwrap();

    let result = entity_variance(&df, "firm", "v", 1e-6).unwrap();
    assert_eq!(result.entities.len(), 3);
    assert_eq!(result.entities[0].0, "A");
    assert_eq!(result.entities[0].1, 3);
    assert_abs_diff_eq!(result.entities[0].2, 1.0, epsilon = 1e-12);
    assert!(result.entities[2].2.is_nan());
    assert_eq!(result.low_variance, vec!["B".to_string(), "C".to_string()]);
}

#[test]
fn test_durbin_watson() {
    let alternating = array![1.0, -1.0, 1.0, -1.0];
    assert_abs_diff_eq!(durbin_watson(&alternating).unwrap(), 3.0, epsilon = 1e-12);

    assert_eq!(durbin_watson(&array![1.0]), None);
    assert_eq!(durbin_watson(&array![0.0, 0.0, 0.0]), None);
}

#[test]
fn test_serial_correlation_pairs_periods_within_entities() {
    let residuals = array![1.0, 2.0, 3.0, 4.0];
    let serial = serial_correlation(&residuals, &[vec![0, 1], vec![2, 3]]).unwrap();

    // Pairs (2, 1) and (4, 3); the step from 2 to 3 crosses entities
    assert_eq!(serial.n_pairs, 2);
    assert_abs_diff_eq!(serial.rho, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(serial.durbin_watson, 2.0 / 30.0, epsilon = 1e-12);
    assert!(serial.flagged);
    assert_abs_diff_eq!(durbin_watson(&residuals).unwrap(), 3.0 / 30.0, epsilon = 1e-12);

    assert_eq!(serial_correlation(&residuals, &[vec![0, 1], vec![2], vec![3]]), None);
}

#[test]
fn test_fit_flags_autocorrelated_errors() {
    let config = TestConfig::default();
    let fit = fit_within(&ar1_panel(0.8, 5), "y", &["x1"], "entity", "time", &config).unwrap();
    let serial = fit.serial_correlation.unwrap();

    assert_eq!(serial.n_pairs, 10 * 19);
    assert!(serial.rho > 0.5, "rho = {}", serial.rho);
    assert!(serial.flagged);
    assert!(serial.durbin_watson < 1.0);
    assert_eq!(fit.residual_statistics.durbin_watson, Some(serial.durbin_watson));
    assert!(fit.to_string().contains("Within-entity lag-1 rho"));

    let independent = fit_within(&ar1_panel(0.0, 5), "y", &["x1"], "entity", "time", &config)
        .unwrap()
        .serial_correlation
        .unwrap();
    assert!(!independent.flagged, "rho = {}", independent.rho);
}

#[test]
fn test_heteroskedasticity_check() {
    let fitted = Array1::from_iter((1..=20).map(|i| i as f64));
    let residuals =
        Array1::from_iter((1..=20).map(|i| if i % 2 == 0 { i as f64 } else { -(i as f64) }));

    let check = heteroskedasticity(&residuals, &fitted).unwrap();
    assert!(check.correlation > 0.9);
    assert!(check.flagged);

    assert_eq!(heteroskedasticity(&Array1::from_elem(20, 0.5), &fitted), None);
    assert_eq!(heteroskedasticity(&residuals, &fitted.slice(s![..10]).to_owned()), None);
}

#[test]
fn test_fit_reports_heteroskedasticity() {
    let df = random_panel(20, 10, 1.0, 0.5, 1.0, 21);
    let fit = fit_within(&df, "y", &["x1", "x2"], "entity", "time", &unadjusted()).unwrap();

    let check = fit.heteroskedasticity.unwrap();
    assert!(!check.flagged, "corr = {}", check.correlation);
    assert!(fit.to_string().contains("corr(e^2, fitted)"));
}

#[test]
fn test_jarque_bera() {
    let symmetric = array![-2.0, -1.0, 0.0, 1.0, 2.0];
    let jb = jarque_bera(&symmetric).unwrap();
    assert_abs_diff_eq!(jb.skewness, 0.0, epsilon = 1e-12);
    assert!(jb.statistic >= 0.0);
    assert!((0.0..=1.0).contains(&jb.p_value));

    assert!(jarque_bera(&array![1.0, 2.0]).is_err());
}

#[test]
fn test_jarque_bera_on_fit_residuals() {
    let fit = fit_within(&noisy_panel(), "y", &["x1", "x2"], "entity", "time", &unadjusted())
        .unwrap();
    let jb = jarque_bera(&fit.residuals).unwrap();
    assert!(jb.p_value > 0.0 && jb.p_value <= 1.0);
    assert!(fit.residual_statistics.durbin_watson.is_some());
}
