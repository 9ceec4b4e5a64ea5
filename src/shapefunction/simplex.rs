//! Linear nodal shape functions on simplex meshes.
use crate::bdrycond::{BoundaryCondition, BoundaryConditions};
use crate::mesh::{MeshTopology, TaggedMesh};
use crate::region::Regions;
use crate::shapefunction::NodalShapeFunction;
use eyre::{bail, eyre};
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DVector, DefaultAllocator, DimName};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use pyrit_traits::Real;

/// Piecewise linear nodal shape functions on a simplex mesh.
///
/// Boundary integrals are evaluated exactly for constant boundary data, so the integration order
/// has no effect.
#[derive(Debug, Clone, Copy)]
pub struct LinearSimplexShapeFunction<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: &'a TaggedMesh<T, D>,
}

impl<'a, T, D> LinearSimplexShapeFunction<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(mesh: &'a TaggedMesh<T, D>) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &'a TaggedMesh<T, D> {
        self.mesh
    }

    /// Calls `f` with the node indices and the measure of every entity of the regions of `bc`.
    fn for_each_entity(
        &self,
        regions: &Regions,
        bc: &BoundaryCondition<T>,
        mut f: impl FnMut(&[usize], T),
    ) -> eyre::Result<()> {
        for region_id in regions.regions_with_bc(bc.id()) {
            let region = regions.get_region(region_id)?;
            let dim = region.dim;
            if dim == 0 {
                for node in self.mesh.entities_in_region(0, region_id) {
                    f(std::slice::from_ref(&node), T::one());
                }
                continue;
            }
            for index in self.mesh.entities_in_region(dim, region_id) {
                let nodes = self.mesh.entity_nodes(dim, index);
                if nodes.len() != dim + 1 {
                    bail!(
                        "entity {} of dimension {} in region {} has {} nodes, expected a simplex with {}",
                        index,
                        dim,
                        region_id,
                        nodes.len(),
                        dim + 1
                    );
                }
                f(nodes, self.mesh.simplex_measure(dim, index));
            }
        }
        Ok(())
    }
}

impl<'a, T, D> NodalShapeFunction<T> for LinearSimplexShapeFunction<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn neumann_term(
        &self,
        regions: &Regions,
        boundary_conditions: &BoundaryConditions<T>,
        _integration_order: usize,
    ) -> eyre::Result<DVector<T>> {
        let mut q = DVector::zeros(self.mesh.num_nodes());
        for bc in boundary_conditions.iter() {
            let BoundaryCondition::Neumann { value, .. } = bc else {
                continue;
            };
            // ∫ g N_i = g |K| / (k + 1) on a k-simplex K
            self.for_each_entity(regions, bc, |nodes, measure| {
                let weight = *value * measure / convert(nodes.len() as f64);
                for &node in nodes {
                    q[node] += weight;
                }
            })?;
        }
        Ok(q)
    }

    fn robin_terms(
        &self,
        regions: &Regions,
        boundary_conditions: &BoundaryConditions<T>,
        _integration_order: usize,
    ) -> eyre::Result<(CsrMatrix<T>, DVector<T>)> {
        let n = self.mesh.num_nodes();
        let mut s = CooMatrix::new(n, n);
        let mut q = DVector::zeros(n);
        for bc in boundary_conditions.iter() {
            let BoundaryCondition::Robin { id, alpha, beta, value } = bc
            else {
                continue;
            };
            if *beta == T::zero() {
                return Err(eyre!("Robin boundary condition {} has beta = 0", id));
            }
            let stiffness = *alpha / *beta;
            let load = *value / *beta;
            // ∫ N_i N_j = |K| (1 + δ_ij) / ((k + 1) (k + 2)) and ∫ N_i = |K| / (k + 1) on a k-simplex K
            self.for_each_entity(regions, bc, |nodes, measure| {
                let num_nodes: T = convert(nodes.len() as f64);
                let off_diagonal = measure / (num_nodes * (num_nodes + T::one()));
                for &i in nodes {
                    q[i] += load * measure / num_nodes;
                    for &j in nodes {
                        let mass = if i == j {
                            off_diagonal + off_diagonal
                        } else {
                            off_diagonal
                        };
                        s.push(i, j, stiffness * mass);
                    }
                }
            })?;
        }
        Ok((CsrMatrix::from(&s), q))
    }
}
