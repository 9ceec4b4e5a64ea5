//! Restarted GMRES for general (in particular symmetric indefinite) square operators.
//!
//! The saddle point systems produced by Lagrange multiplier constraints are indefinite, which
//! rules out CG. GMRES makes no assumption on the operator beyond non-singularity.
use crate::krylov::{apply_operator, SolveError, SolveErrorKind, SolveOutput, StoppingCriterion};
use crate::operator::LinearOperator;
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};
use pyrit_traits::Real;

/// Default dimension of the Krylov subspace before a restart.
pub const DEFAULT_RESTART: usize = 30;

#[derive(Debug)]
pub struct Gmres<T, A, Criterion = ()> {
    operator: A,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
    restart: usize,
    marker: std::marker::PhantomData<T>,
}

impl<T: Real, A> Gmres<T, A> {
    pub fn new(operator: A) -> Self {
        Self {
            operator,
            stopping_criterion: (),
            max_iter: None,
            restart: DEFAULT_RESTART,
            marker: Default::default(),
        }
    }
}

impl<T, A> Gmres<T, A, ()> {
    pub fn with_stopping_criterion<Criterion>(self, stopping_criterion: Criterion) -> Gmres<T, A, Criterion> {
        Gmres {
            operator: self.operator,
            stopping_criterion,
            max_iter: self.max_iter,
            restart: self.restart,
            marker: self.marker,
        }
    }
}

impl<T, A, Criterion> Gmres<T, A, Criterion> {
    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }

    /// Sets the subspace dimension after which the iteration is restarted.
    ///
    /// # Panics
    ///
    /// Panics if `restart` is zero.
    pub fn with_restart(self, restart: usize) -> Self {
        assert!(restart > 0, "Restart length must be positive.");
        Self { restart, ..self }
    }
}

impl<T, A, Criterion> Gmres<T, A, Criterion>
where
    T: Real,
    A: LinearOperator<T>,
    Criterion: StoppingCriterion<T>,
{
    pub fn solve_with_guess<'b>(
        &self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<SolveOutput<T>, SolveError<T>> {
        self.solve_with_guess_(b.into(), x.into())
    }

    fn solve_with_guess_(&self, b: DVectorView<T>, mut x: DVectorViewMut<T>) -> Result<SolveOutput<T>, SolveError<T>> {
        use SolveErrorKind::*;
        assert_eq!(b.len(), x.len());
        let n = b.len();
        let m = self.restart;
        let mut output = SolveOutput::new();

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        let mut r = DVector::zeros(n);
        let mut w = DVector::zeros(n);
        let mut h = DMatrix::zeros(m + 1, m);
        let mut g = DVector::zeros(m + 1);
        let mut cs = vec![T::zero(); m];
        let mut sn = vec![T::zero(); m];
        let mut basis: Vec<DVector<T>> = Vec::with_capacity(m + 1);

        loop {
            // r = b - Ax
            if let Err(err) = apply_operator(&mut r, &self.operator, &x) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            r.axpy(T::one(), &b, -T::one());
            let beta = r.norm();
            output.residual_norm = beta;

            if self.stopping_criterion.has_converged(b_norm, output.num_iterations, beta) {
                return Ok(output);
            }

            basis.clear();
            basis.push(r.unscale(beta));
            h.fill(T::zero());
            g.fill(T::zero());
            g[0] = beta;

            let mut k = 0;
            while k < m {
                if let Some(max_iter) = self.max_iter {
                    if output.num_iterations >= max_iter {
                        return Err(SolveError::new(output, MaxIterationsReached { max_iter }));
                    }
                }

                if let Err(err) = apply_operator(&mut w, &self.operator, &basis[k]) {
                    return Err(SolveError::new(output, OperatorError(err)));
                }

                // Modified Gram-Schmidt
                for (i, v_i) in basis.iter().enumerate() {
                    let h_ik = w.dot(v_i);
                    h[(i, k)] = h_ik;
                    w.axpy(-h_ik, v_i, T::one());
                }
                let w_norm = w.norm();
                h[(k + 1, k)] = w_norm;

                // Apply the previous Givens rotations to the new column
                for i in 0..k {
                    let (h_ik, h_i1k) = (h[(i, k)], h[(i + 1, k)]);
                    h[(i, k)] = cs[i] * h_ik + sn[i] * h_i1k;
                    h[(i + 1, k)] = -sn[i] * h_ik + cs[i] * h_i1k;
                }

                let (h_kk, h_k1k) = (h[(k, k)], h[(k + 1, k)]);
                let denom = (h_kk * h_kk + h_k1k * h_k1k).sqrt();
                if denom == T::zero() {
                    return Err(SolveError::new(output, Breakdown));
                }
                cs[k] = h_kk / denom;
                sn[k] = h_k1k / denom;
                h[(k, k)] = denom;
                h[(k + 1, k)] = T::zero();

                g[k + 1] = -sn[k] * g[k];
                g[k] = cs[k] * g[k];

                output.num_iterations += 1;
                output.residual_norm = g[k + 1].abs();
                k += 1;

                let converged =
                    self.stopping_criterion
                        .has_converged(b_norm, output.num_iterations, output.residual_norm);
                // A vanishing w means the Krylov subspace is invariant and the solution is exact
                if converged || w_norm == T::zero() {
                    break;
                }
                basis.push(w.unscale(w_norm));
            }

            // Back substitution on the k x k upper triangular system H y = g
            let mut y = DVector::zeros(k);
            for i in (0..k).rev() {
                let mut sum = g[i];
                for j in (i + 1)..k {
                    sum -= h[(i, j)] * y[j];
                }
                y[i] = sum / h[(i, i)];
            }

            for (y_i, v_i) in y.iter().zip(&basis) {
                x.axpy(*y_i, v_i, T::one());
            }
        }
    }
}
