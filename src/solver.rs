//! Solution of (reduced) linear systems.
//!
//! A solver is selected by a [`Solver`] value, typically parsed from a string such as `"spsolve"`
//! or `"gmres"`. The optional high-performance direct solver is not part of this crate: it is
//! injected as a [`DirectSolverBackend`], and selecting it without an available backend fails with
//! [`PyritError::SolverUnavailable`].
use crate::error::{PyritError, PyritResult};
use crate::shapefunction::shrink::check_system;
use log::debug;
use nalgebra::{convert, DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use pyrit_sparse::bicgstab::BiCgStab;
use pyrit_sparse::cg::ConjugateGradient;
use pyrit_sparse::gmres::{Gmres, DEFAULT_RESTART};
use pyrit_sparse::krylov::{RelativeResidualCriterion, SolveError, SolveOutput};
use pyrit_traits::Real;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KrylovMethod {
    /// Conjugate gradients, for symmetric positive definite systems.
    Cg,
    BiCgStab,
    /// Restarted GMRES, also suited for the indefinite systems of Lagrange multipliers.
    Gmres,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Solver {
    /// Dense LU decomposition.
    #[default]
    Direct,
    Krylov(KrylovMethod),
    /// An injected high-performance direct solver.
    HighPerformanceDirect,
}

impl Solver {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Direct => "spsolve",
            Self::Krylov(KrylovMethod::Cg) => "cg",
            Self::Krylov(KrylovMethod::BiCgStab) => "bicgstab",
            Self::Krylov(KrylovMethod::Gmres) => "gmres",
            Self::HighPerformanceDirect => "pardiso",
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Solver {
    type Err = PyritError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spsolve" => Ok(Self::Direct),
            "cg" => Ok(Self::Krylov(KrylovMethod::Cg)),
            "bicgstab" => Ok(Self::Krylov(KrylovMethod::BiCgStab)),
            "gmres" => Ok(Self::Krylov(KrylovMethod::Gmres)),
            "pardiso" => Ok(Self::HighPerformanceDirect),
            _ => Err(PyritError::SolverUnknown(s.to_string())),
        }
    }
}

/// Options of the iterative solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Relative residual tolerance.
    pub tolerance: f64,
    pub max_iter: Option<usize>,
    /// Krylov subspace dimension of GMRES before restarting.
    pub restart: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iter: None,
            restart: DEFAULT_RESTART,
        }
    }
}

impl SolverOptions {
    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }

    pub fn with_restart(self, restart: usize) -> Self {
        Self { restart, ..self }
    }
}

/// Diagnostics of a linear solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveInfo<T> {
    pub solver: String,
    /// Iterations of an iterative solver, `None` for direct solvers.
    pub num_iterations: Option<usize>,
    pub residual_norm: Option<T>,
}

impl<T> SolveInfo<T> {
    pub fn direct(solver: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            num_iterations: None,
            residual_norm: None,
        }
    }
}

/// A solver of sparse linear systems.
pub trait LinearSolver<T: Real> {
    fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        options: &SolverOptions,
    ) -> eyre::Result<(DVector<T>, SolveInfo<T>)>;
}

impl<T, F> LinearSolver<T> for F
where
    T: Real,
    F: Fn(&CsrMatrix<T>, &DVector<T>, &SolverOptions) -> eyre::Result<(DVector<T>, SolveInfo<T>)>,
{
    fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        options: &SolverOptions,
    ) -> eyre::Result<(DVector<T>, SolveInfo<T>)> {
        self(matrix, rhs, options)
    }
}

/// A direct solver that depends on an external library and may therefore be missing at runtime.
pub trait DirectSolverBackend<T: Real>: LinearSolver<T> {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;
}

/// Solves the system by a dense LU decomposition with partial pivoting.
pub fn solve_direct<T: Real>(matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> PyritResult<DVector<T>> {
    check_system(matrix, rhs)?;
    DMatrix::from(matrix)
        .lu()
        .solve(rhs)
        .ok_or(PyritError::SingularMatrix)
}

fn iterative_error<T>(method: KrylovMethod, err: SolveError<T>) -> PyritError {
    PyritError::IterativeSolve {
        solver: Solver::Krylov(method).to_string(),
        message: err.to_string(),
    }
}

/// Solves the system with a Krylov method, starting from a zero initial guess.
pub fn solve_iterative<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    method: KrylovMethod,
    options: &SolverOptions,
) -> PyritResult<(DVector<T>, SolveOutput<T>)> {
    check_system(matrix, rhs)?;
    let criterion = RelativeResidualCriterion::new(convert::<f64, T>(options.tolerance));
    let mut x = DVector::zeros(rhs.len());
    let output = match method {
        KrylovMethod::Cg => {
            let mut cg = ConjugateGradient::new()
                .with_operator(matrix)
                .with_stopping_criterion(criterion);
            if let Some(max_iter) = options.max_iter {
                cg = cg.with_max_iter(max_iter);
            }
            cg.solve_with_guess(rhs, &mut x)
        }
        KrylovMethod::BiCgStab => {
            let mut bicgstab = BiCgStab::new(matrix).with_stopping_criterion(criterion);
            if let Some(max_iter) = options.max_iter {
                bicgstab = bicgstab.with_max_iter(max_iter);
            }
            bicgstab.solve_with_guess(rhs, &mut x)
        }
        KrylovMethod::Gmres => {
            if options.restart == 0 {
                return Err(PyritError::IterativeSolve {
                    solver: Solver::Krylov(method).to_string(),
                    message: "restart length must be positive".to_string(),
                });
            }
            let mut gmres = Gmres::new(matrix)
                .with_restart(options.restart)
                .with_stopping_criterion(criterion);
            if let Some(max_iter) = options.max_iter {
                gmres = gmres.with_max_iter(max_iter);
            }
            gmres.solve_with_guess(rhs, &mut x)
        }
    }
    .map_err(|err| iterative_error(method, err))?;
    Ok((x, output))
}

/// Dispatches linear solves to the built-in solvers or an injected backend.
pub struct SolverDispatch<'a, T: Real> {
    options: SolverOptions,
    high_performance: Option<&'a dyn DirectSolverBackend<T>>,
}

impl<'a, T: Real> Default for SolverDispatch<'a, T> {
    fn default() -> Self {
        Self {
            options: SolverOptions::default(),
            high_performance: None,
        }
    }
}

impl<'a, T: Real> SolverDispatch<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(self, options: SolverOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_high_performance_backend(self, backend: &'a dyn DirectSolverBackend<T>) -> Self {
        Self {
            high_performance: Some(backend),
            ..self
        }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        solver: Solver,
    ) -> PyritResult<(DVector<T>, SolveInfo<T>)> {
        debug!("Solving a system of size {} with {}", rhs.len(), solver);
        match solver {
            Solver::Direct => {
                let x = solve_direct(matrix, rhs)?;
                Ok((x, SolveInfo::direct(solver.name())))
            }
            Solver::Krylov(method) => {
                let (x, output) = solve_iterative(matrix, rhs, method, &self.options)?;
                debug!(
                    "{} converged after {} iteration(s) with residual norm {}",
                    solver, output.num_iterations, output.residual_norm
                );
                let info = SolveInfo {
                    solver: solver.name().to_string(),
                    num_iterations: Some(output.num_iterations),
                    residual_norm: Some(output.residual_norm),
                };
                Ok((x, info))
            }
            Solver::HighPerformanceDirect => match self.high_performance {
                Some(backend) if backend.is_available() => {
                    check_system(matrix, rhs)?;
                    backend
                        .solve(matrix, rhs, &self.options)
                        .map_err(PyritError::CustomSolver)
                }
                Some(backend) => Err(PyritError::SolverUnavailable(backend.name().to_string())),
                None => Err(PyritError::SolverUnavailable(solver.name().to_string())),
            },
        }
    }

    /// Solves the system with a user-provided solver.
    pub fn solve_custom(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        solver: &dyn LinearSolver<T>,
    ) -> PyritResult<(DVector<T>, SolveInfo<T>)> {
        check_system(matrix, rhs)?;
        solver
            .solve(matrix, rhs, &self.options)
            .map_err(PyritError::CustomSolver)
    }
}

/// Solves `matrix * x = rhs` with the solver named by `solver`, e.g. `"spsolve"` or `"cg"`.
pub fn solve_linear_system<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    solver: &str,
    options: &SolverOptions,
) -> PyritResult<(DVector<T>, SolveInfo<T>)> {
    SolverDispatch::new()
        .with_options(options.clone())
        .solve(matrix, rhs, solver.parse()?)
}
