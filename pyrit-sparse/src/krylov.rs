//! Types shared by the Krylov subspace solvers.
use crate::operator::LinearOperator;
use core::fmt;
use nalgebra::{DVectorView, DVectorViewMut};
use pyrit_traits::Real;
use std::error::Error;
use std::ops::{Deref, DerefMut};

pub trait StoppingCriterion<T: Real> {
    fn has_converged(&self, b_norm: T, iteration: usize, residual_norm: T) -> bool;
}

/// Relative residual tolerance ||r|| <= tol * ||b||.
///
/// Note that CG and BiCGStab track an *approximate* residual through their recurrences. For
/// ill-conditioned problems the approximate residual may converge while the true one does not.
#[derive(Debug, Clone, Copy)]
pub struct RelativeResidualCriterion<T> {
    tol: T,
}

impl<T: Real> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }

    pub fn tolerance(&self) -> T {
        self.tol
    }
}

impl Default for RelativeResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl Default for RelativeResidualCriterion<f32> {
    fn default() -> Self {
        Self::new(1e-4)
    }
}

impl<T: Real> StoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, b_norm: T, _iteration: usize, residual_norm: T) -> bool {
        residual_norm <= self.tol * b_norm
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(Box<dyn Error>),
    PreconditionerError(Box<dyn Error>),
    IndefiniteOperator,
    IndefinitePreconditioner,
    /// A scalar in the recurrence vanished, so the iteration cannot proceed.
    Breakdown,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => {
                write!(f, "Error applying operator: ")?;
                err.fmt(f)
            }
            Self::PreconditionerError(err) => {
                write!(f, "Error applying preconditioner: ")?;
                err.fmt(f)
            }
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite."),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner."),
            Self::Breakdown => write!(f, "Breakdown in Krylov recurrence."),
            Self::MaxIterationsReached { max_iter } => {
                write!(f, "Max iterations ({}) reached.", max_iter)
            }
        }
    }
}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct SolveOutput<T> {
    /// Number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
    /// Norm of the last residual tracked by the solver.
    pub residual_norm: T,
}

impl<T: Real> SolveOutput<T> {
    pub(crate) fn new() -> Self {
        Self {
            num_iterations: 0,
            residual_norm: T::zero(),
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError<T> {
    pub output: SolveOutput<T>,
    pub kind: SolveErrorKind,
}

impl<T> SolveError<T> {
    pub(crate) fn new(output: SolveOutput<T>, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl<T> fmt::Display for SolveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Krylov solve failed after {} iterations. ", self.output.num_iterations)?;
        write!(f, "Error: {}", self.kind)
    }
}

impl<T: fmt::Debug> Error for SolveError<T> {}

/// y = Ax
pub(crate) fn apply_operator<'a, T, A>(
    y: impl Into<DVectorViewMut<'a, T>>,
    a: &'a A,
    x: impl Into<DVectorView<'a, T>>,
) -> Result<(), Box<dyn Error>>
where
    T: Real,
    A: ?Sized + LinearOperator<T>,
{
    a.apply(y.into(), x.into())
}

#[derive(Debug)]
pub(crate) enum OwnedOrMutRef<'a, T> {
    Owned(T),
    MutRef(&'a mut T),
}

impl<'a, T> Deref for OwnedOrMutRef<'a, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}

impl<'a, T> DerefMut for OwnedOrMutRef<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Self::Owned(owned) => owned,
            Self::MutRef(mutref) => mutref,
        }
    }
}
