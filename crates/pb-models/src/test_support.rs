//! Synthetic panels shared by the unit tests

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use pb_core::data::{DataFrame, DataFrameBuilder, Series};

/// Entity labels A, B, C, ... then E26, E27, ...
pub(crate) fn entity_label(e: usize) -> String {
    if e < 26 {
        ((b'A' + e as u8) as char).to_string()
    } else {
        format!("E{}", e)
    }
}

/// y = effect_e + b1·x1 + b2·x2 + N(0, noise_sd²), with x1, x2 ~ N(0, 1)
/// and effect_e = 3·e
pub(crate) fn random_panel(
    n_entities: usize,
    n_periods: usize,
    b1: f64,
    b2: f64,
    noise_sd: f64,
    seed: u64,
) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let std_normal = Normal::new(0.0, 1.0).unwrap();
    let noise = Normal::new(0.0, noise_sd).unwrap();

    let mut entity = Vec::new();
    let mut time = Vec::new();
    let mut x1 = Vec::new();
    let mut x2 = Vec::new();
    let mut y = Vec::new();

    for e in 0..n_entities {
        for t in 0..n_periods {
            let a = std_normal.sample(&mut rng);
            let b = std_normal.sample(&mut rng);
            entity.push(entity_label(e));
            time.push(t as i64 + 1);
            x1.push(a);
            x2.push(b);
            y.push(3.0 * e as f64 + b1 * a + b2 * b + noise.sample(&mut rng));
        }
    }

    DataFrameBuilder::new()
        .with_column("entity", Series::String(entity))
        .unwrap()
        .with_column("time", Series::int(time))
        .unwrap()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("x2", Series::float(x2))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}

/// Panel where x2 alternates ±1 within every entity and x1 is constant over
/// period pairs, so the transformed x2 is orthogonal to the constant and x1.
/// `n_periods` must be even.
pub(crate) fn orthogonal_panel(n_entities: usize, n_periods: usize, b2: f64, seed: u64) -> DataFrame {
    assert!(n_periods % 2 == 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let std_normal = Normal::new(0.0, 1.0).unwrap();

    let mut entity = Vec::new();
    let mut time = Vec::new();
    let mut x1 = Vec::new();
    let mut x2 = Vec::new();
    let mut y = Vec::new();

    for e in 0..n_entities {
        let mut pair_value = 0.0;
        for t in 0..n_periods {
            if t % 2 == 0 {
                pair_value = std_normal.sample(&mut rng);
            }
            let sign = if t % 2 == 0 { 1.0 } else { -1.0 };
            entity.push(entity_label(e));
            time.push(t as i64 + 1);
            x1.push(pair_value);
            x2.push(sign);
            y.push(e as f64 + 1.5 * pair_value + b2 * sign + std_normal.sample(&mut rng));
        }
    }

    DataFrameBuilder::new()
        .with_column("entity", Series::String(entity))
        .unwrap()
        .with_column("time", Series::int(time))
        .unwrap()
        .with_column("x1", Series::float(x1))
        .unwrap()
        .with_column("x2", Series::float(x2))
        .unwrap()
        .with_column("y", Series::float(y))
        .unwrap()
        .build()
        .unwrap()
}
