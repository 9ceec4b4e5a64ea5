//! Nodal shape functions and the shrink/inflate reduction of their systems.
//!
//! A nodal shape function associates one degree of freedom with each mesh node. Boundary
//! conditions are applied to an assembled system `A x = b` by [`NodalShapeFunction::shrink`]:
//!
//! 1. Neumann conditions add a load vector to `b`.
//! 2. Robin conditions add a boundary mass matrix to `A` and a load vector to `b`.
//! 3. Binary conditions append one Lagrange multiplier per pair of nodes.
//! 4. Floating conditions append one Lagrange multiplier per non-master node.
//! 5. Dirichlet conditions eliminate the fixed nodes.
//!
//! The solution of the reduced system is mapped back to the nodes by
//! [`NodalShapeFunction::inflate`], which undoes steps 5, 4 and 3 in this order.
use crate::bdrycond::BoundaryConditions;
use crate::classify::Classification;
use crate::error::PyritResult;
use crate::mesh::MeshTopology;
use crate::region::Regions;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use pyrit_traits::Real;

pub mod inflate;
pub mod shrink;
pub mod simplex;

pub use shrink::{DirichletSupport, ReducedSystem, SupportData};
pub use simplex::LinearSimplexShapeFunction;

/// The parts of a problem read by shrink and inflate.
pub struct ShrinkInflateProblem<'a, T> {
    pub mesh: &'a dyn MeshTopology,
    pub regions: &'a Regions,
    pub boundary_conditions: &'a BoundaryConditions<T>,
}

impl<'a, T> Clone for ShrinkInflateProblem<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for ShrinkInflateProblem<'a, T> {}

impl<'a, T> ShrinkInflateProblem<'a, T> {
    pub fn new(
        mesh: &'a dyn MeshTopology,
        regions: &'a Regions,
        boundary_conditions: &'a BoundaryConditions<T>,
    ) -> Self {
        Self {
            mesh,
            regions,
            boundary_conditions,
        }
    }
}

pub trait NodalShapeFunction<T: Real> {
    /// The load vector `q_i = ∫ g N_i` of all Neumann conditions, with one entry per node.
    fn neumann_term(
        &self,
        regions: &Regions,
        boundary_conditions: &BoundaryConditions<T>,
        integration_order: usize,
    ) -> eyre::Result<DVector<T>>;

    /// The matrix `S_ij = ∫ (alpha / beta) N_i N_j` and the load vector `q_i = ∫ (g / beta) N_i`
    /// of all Robin conditions.
    fn robin_terms(
        &self,
        regions: &Regions,
        boundary_conditions: &BoundaryConditions<T>,
        integration_order: usize,
    ) -> eyre::Result<(CsrMatrix<T>, DVector<T>)>;

    /// Applies all boundary conditions of `problem` to the system `matrix * x = rhs`.
    fn shrink(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        problem: &ShrinkInflateProblem<T>,
        integration_order: usize,
    ) -> PyritResult<ReducedSystem<T>> {
        shrink::shrink(self, matrix, rhs, problem, integration_order)
    }

    /// Maps the solution of a reduced system back to all nodes.
    ///
    /// If `support_data` is missing or incomplete, it is recomputed from `problem`.
    fn inflate(
        &self,
        solution: &DVector<T>,
        problem: &ShrinkInflateProblem<T>,
        support_data: Option<&SupportData<T>>,
    ) -> PyritResult<DVector<T>> {
        inflate::inflate(solution, problem, support_data)
    }

    /// Computes the support data of a reduced system with `size_solution` unknowns from the
    /// boundary conditions alone.
    fn compute_support_data(
        &self,
        classification: &Classification,
        size_solution: usize,
        problem: &ShrinkInflateProblem<T>,
    ) -> PyritResult<SupportData<T>> {
        inflate::compute_support_data(classification, size_solution, problem)
    }
}
