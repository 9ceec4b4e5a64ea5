//! Block operations on CSR matrices.
//!
//! These are the building blocks for augmenting a system with constraint rows and for
//! eliminating prescribed degrees of freedom. All operations allocate new matrices and leave
//! their inputs untouched.
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use pyrit_traits::Real;

/// Computes `y = A x`.
///
/// # Panics
///
/// Panics if the dimensions of `y`, `A` and `x` are not compatible.
pub fn spmv<T: Real>(mut y: DVectorViewMut<T>, a: &CsrMatrix<T>, x: DVectorView<T>) {
    assert_eq!(a.nrows(), y.len(), "Output length must match number of rows.");
    assert_eq!(a.ncols(), x.len(), "Input length must match number of columns.");
    for (i, row) in a.row_iter().enumerate() {
        let mut sum = T::zero();
        for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
            sum += a_ij * x[j];
        }
        y[i] = sum;
    }
}

/// Convenience wrapper around [`spmv`] returning a newly allocated vector.
pub fn csr_mul_vector<T: Real>(a: &CsrMatrix<T>, x: &DVector<T>) -> DVector<T> {
    let mut y = DVector::zeros(a.nrows());
    spmv((&mut y).into(), a, x.into());
    y
}

/// Computes `A + B`.
///
/// # Panics
///
/// Panics if the shapes of `A` and `B` differ.
pub fn csr_add<T: Real>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> CsrMatrix<T> {
    assert_eq!(a.nrows(), b.nrows(), "Matrices must have the same number of rows.");
    assert_eq!(a.ncols(), b.ncols(), "Matrices must have the same number of columns.");
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (i, j, &v) in a.triplet_iter().chain(b.triplet_iter()) {
        coo.push(i, j, v);
    }
    // Duplicates are summed by the conversion
    CsrMatrix::from(&coo)
}

/// Builds the symmetric saddle point matrix
///
/// ```text
/// [ A  Bᵀ ]
/// [ B  0  ]
/// ```
///
/// where `B` holds one constraint per row.
///
/// # Panics
///
/// Panics if `A` is not square or `B` does not have as many columns as `A`.
pub fn augment_with_constraints<T: Real>(a: &CsrMatrix<T>, b: &CooMatrix<T>) -> CsrMatrix<T> {
    assert_eq!(a.nrows(), a.ncols(), "System matrix must be square.");
    assert_eq!(
        b.ncols(),
        a.ncols(),
        "Constraint matrix must have as many columns as the system matrix."
    );
    let n = a.nrows();
    let m = b.nrows();

    let mut coo = CooMatrix::new(n + m, n + m);
    for (i, j, &v) in a.triplet_iter() {
        coo.push(i, j, v);
    }
    for (i, j, &v) in b.triplet_iter() {
        coo.push(n + i, j, v);
        coo.push(j, n + i, v);
    }
    CsrMatrix::from(&coo)
}

/// Extracts the sub-matrix `A[rows, cols]`.
///
/// The rows and columns of the result appear in the order given by `rows` and `cols`.
///
/// # Panics
///
/// Panics if an index is out of bounds or `cols` contains duplicates.
pub fn extract_submatrix<T: Real>(a: &CsrMatrix<T>, rows: &[usize], cols: &[usize]) -> CsrMatrix<T> {
    let mut col_map = vec![None; a.ncols()];
    for (local, &global) in cols.iter().enumerate() {
        assert!(col_map[global].is_none(), "Column indices must be unique.");
        col_map[global] = Some(local);
    }

    let mut coo = CooMatrix::new(rows.len(), cols.len());
    for (local_row, &global_row) in rows.iter().enumerate() {
        let row = a.row(global_row);
        for (&j, &v) in row.col_indices().iter().zip(row.values()) {
            if let Some(local_col) = col_map[j] {
                coo.push(local_row, local_col, v);
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Gathers `v[indices]` into a new vector.
pub fn gather<T: Real>(v: &DVector<T>, indices: &[usize]) -> DVector<T> {
    DVector::from_iterator(indices.len(), indices.iter().map(|&i| v[i]))
}

/// Appends `count` zeros to `v`.
pub fn extend_with_zeros<T: Real>(v: &DVector<T>, count: usize) -> DVector<T> {
    let mut extended = DVector::zeros(v.len() + count);
    extended.rows_mut(0, v.len()).copy_from(v);
    extended
}
