//! Test helpers shared by the crates in the workspace.
use nalgebra::{DMatrix, DVector};

/// Poor man's approx assertion for matrices and vectors
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Dense tridiagonal matrix of the 1D Laplacian with `n` nodes, scaled by `scale`.
///
/// The first and last rows have diagonal entry `scale`, corresponding to natural boundary
/// conditions at both ends, so the matrix is singular until a Dirichlet condition is imposed.
pub fn laplace_1d(n: usize, scale: f64) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(n, n);
    for i in 0..n.saturating_sub(1) {
        matrix[(i, i)] += scale;
        matrix[(i + 1, i + 1)] += scale;
        matrix[(i, i + 1)] -= scale;
        matrix[(i + 1, i)] -= scale;
    }
    matrix
}

/// A symmetric positive definite matrix with a known, well-separated spectrum.
pub fn spd_matrix(n: usize) -> DMatrix<f64> {
    let mut matrix = laplace_1d(n, 1.0);
    for i in 0..n {
        matrix[(i, i)] += 1.0 + i as f64 / n as f64;
    }
    matrix
}

pub fn linspace(n: usize, start: f64, end: f64) -> DVector<f64> {
    if n == 1 {
        return DVector::from_element(1, start);
    }
    let h = (end - start) / (n - 1) as f64;
    DVector::from_fn(n, |i, _| start + h * i as f64)
}
