//! Stabilized bi-conjugate gradient method (BiCGStab) for general square operators.
use crate::krylov::{apply_operator, SolveError, SolveErrorKind, SolveOutput, StoppingCriterion};
use crate::operator::LinearOperator;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use pyrit_traits::Real;

#[derive(Debug)]
pub struct BiCgStab<T, A, Criterion = ()> {
    operator: A,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
    marker: std::marker::PhantomData<T>,
}

impl<T: Real, A> BiCgStab<T, A> {
    pub fn new(operator: A) -> Self {
        Self {
            operator,
            stopping_criterion: (),
            max_iter: None,
            marker: Default::default(),
        }
    }
}

impl<T, A> BiCgStab<T, A, ()> {
    pub fn with_stopping_criterion<Criterion>(self, stopping_criterion: Criterion) -> BiCgStab<T, A, Criterion> {
        BiCgStab {
            operator: self.operator,
            stopping_criterion,
            max_iter: self.max_iter,
            marker: self.marker,
        }
    }
}

impl<T, A, Criterion> BiCgStab<T, A, Criterion> {
    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<T, A, Criterion> BiCgStab<T, A, Criterion>
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
        let mut output = SolveOutput::new();

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        // r = b - Ax
        let mut r = DVector::zeros(n);
        if let Err(err) = apply_operator(&mut r, &self.operator, &x) {
            return Err(SolveError::new(output, OperatorError(err)));
        }
        r.axpy(T::one(), &b, -T::one());

        let r_hat = r.clone();
        let mut p = DVector::zeros(n);
        let mut v = DVector::zeros(n);
        let mut s = DVector::zeros(n);
        let mut t = DVector::zeros(n);
        let (mut rho, mut alpha, mut omega) = (T::one(), T::one(), T::one());

        loop {
            output.residual_norm = r.norm();
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations, output.residual_norm)
            {
                return Ok(output);
            } else if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(SolveError::new(output, MaxIterationsReached { max_iter }));
                }
            }

            let rho_next = r_hat.dot(&r);
            if rho_next == T::zero() || omega == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }
            let beta = (rho_next / rho) * (alpha / omega);

            // p <- r + beta * (p - omega * v)
            p.axpy(-omega, &v, T::one());
            p.axpy(T::one(), &r, beta);

            if let Err(err) = apply_operator(&mut v, &self.operator, &p) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            let r_hat_dot_v = r_hat.dot(&v);
            if r_hat_dot_v == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }
            alpha = rho_next / r_hat_dot_v;

            // s <- r - alpha * v
            s.copy_from(&r);
            s.axpy(-alpha, &v, T::one());

            let s_norm = s.norm();
            if self
                .stopping_criterion
                .has_converged(b_norm, output.num_iterations + 1, s_norm)
            {
                x.axpy(alpha, &p, T::one());
                r.copy_from(&s);
                output.num_iterations += 1;
                output.residual_norm = s_norm;
                return Ok(output);
            }

            if let Err(err) = apply_operator(&mut t, &self.operator, &s) {
                return Err(SolveError::new(output, OperatorError(err)));
            }
            let t_dot_t = t.dot(&t);
            if t_dot_t == T::zero() {
                return Err(SolveError::new(output, Breakdown));
            }
            omega = t.dot(&s) / t_dot_t;

            // x <- x + alpha * p + omega * s
            x.axpy(alpha, &p, T::one());
            x.axpy(omega, &s, T::one());

            // r <- s - omega * t
            r.copy_from(&s);
            r.axpy(-omega, &t, T::one());

            rho = rho_next;
            output.num_iterations += 1;
        }
    }
}
