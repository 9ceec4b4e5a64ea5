//! Boundary-condition reduction of finite element systems.
//!
//! Given an assembled system `A x = b` together with the boundary conditions of a problem, the
//! [`shapefunction::NodalShapeFunction::shrink`] operation applies Neumann, Robin, binary,
//! floating and Dirichlet conditions (in this order) and returns a smaller system. Once the reduced
//! system is solved, [`shapefunction::NodalShapeFunction::inflate`] undoes the reduction and
//! yields a vector over all nodes of the mesh.
pub mod bdrycond;
pub mod classify;
pub mod error;
pub mod excitation;
pub mod material;
pub mod mesh;
pub mod problem;
pub mod region;
pub mod shapefunction;
pub mod solver;

#[cfg(feature = "proptest")]
pub mod proptest;

pub use error::{PyritError, PyritResult};
pub use pyrit_traits::Real;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate pyrit_sparse;

/// Identifier of a region of the mesh.
pub type RegionId = usize;
/// Identifier of a boundary condition.
pub type BcId = usize;
/// Identifier of a material.
pub type MaterialId = usize;
/// Identifier of an excitation.
pub type ExcitationId = usize;
