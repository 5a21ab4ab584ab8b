//! Bridge between ndarray storage and nalgebra decompositions

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

pub(crate) fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Smallest over largest singular value, 0 for an empty or zero matrix
pub(crate) fn reciprocal_condition(a: &Array2<f64>) -> f64 {
    if a.is_empty() {
        return 0.0;
    }

    let sv = to_dmatrix(a).singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    let min = sv.iter().copied().fold(f64::INFINITY, f64::min);

    if max > 0.0 && min.is_finite() { min / max } else { 0.0 }
}

/// SVD least-squares solution of `x b = y`
pub(crate) fn least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let rhs = DVector::from_iterator(y.len(), y.iter().copied());
    let svd = to_dmatrix(x).svd(true, true);
    svd.solve(&rhs, 1e-14)
        .ok()
        .map(|b| b.iter().copied().collect())
}

/// Inverse of a symmetric positive definite matrix, falling back to LU
pub(crate) fn symmetric_inverse(a: &Array2<f64>) -> Option<Array2<f64>> {
    let m = to_dmatrix(a);
    let inv = match m.clone().cholesky() {
        Some(chol) => chol.inverse(),
        None => m.try_inverse()?,
    };

    if inv.iter().all(|v| v.is_finite()) {
        // Symmetrize to remove round-off asymmetry
        let sym = (&inv + inv.transpose()) * 0.5;
        Some(from_dmatrix(&sym))
    } else {
        None
    }
}
