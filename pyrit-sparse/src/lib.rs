//! Sparse matrix functionality for `pyrit`.
//!
//! Contains the block operations needed to augment and reduce finite element systems, and a small
//! collection of Krylov subspace solvers operating on any [`LinearOperator`].
pub mod bicgstab;
pub mod cg;
pub mod gmres;
pub mod krylov;
pub mod ops;
pub mod operator;

pub use nalgebra_sparse::{CooMatrix, CsrMatrix};
pub use operator::{IdentityOperator, LinearOperator};
