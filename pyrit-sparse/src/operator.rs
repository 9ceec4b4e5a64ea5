use crate::ops::spmv;
use nalgebra::{DMatrix, DVectorView, DVectorViewMut};
use nalgebra_sparse::CsrMatrix;
use pyrit_traits::Real;
use std::error::Error;

/// A linear operator `y = A x`.
pub trait LinearOperator<T: Real> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: Real,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

impl<T: Real> LinearOperator<T> for DMatrix<T> {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        check_dimensions((self.nrows(), self.ncols()), y.len(), x.len())?;
        y.gemv(T::one(), self, &x, T::zero());
        Ok(())
    }
}

impl<T: Real> LinearOperator<T> for CsrMatrix<T> {
    fn apply(&self, y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        check_dimensions((self.nrows(), self.ncols()), y.len(), x.len())?;
        spmv(y, self, x);
        Ok(())
    }
}

fn check_dimensions((nrows, ncols): (usize, usize), y_len: usize, x_len: usize) -> Result<(), Box<dyn Error>> {
    if nrows != y_len || ncols != x_len {
        Err(format!(
            "cannot apply {nrows}x{ncols} operator to vector of length {x_len} with output of length {y_len}"
        )
        .into())
    } else {
        Ok(())
    }
}

/// The identity operator, used as the default (no-op) preconditioner.
#[derive(Debug, Clone, Copy)]
pub struct IdentityOperator;

impl<T: Real> LinearOperator<T> for IdentityOperator {
    fn apply(&self, mut y: DVectorViewMut<T>, x: DVectorView<T>) -> Result<(), Box<dyn Error>> {
        y.copy_from(&x);
        Ok(())
    }
}
