//! Application of boundary conditions to an assembled system.
use crate::bdrycond::{BoundaryCondition, BoundaryConditions};
use crate::classify::{nodes_of_bc, BoundaryConditionKind, Classification, RegionsOfBc};
use crate::error::{PyritError, PyritResult};
use crate::shapefunction::{NodalShapeFunction, ShrinkInflateProblem};
use crate::BcId;
use log::debug;
use nalgebra::{DVector, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use pyrit_sparse::ops::{
    augment_with_constraints, csr_add, csr_mul_vector, extend_with_zeros, extract_submatrix, gather,
};
use pyrit_traits::Real;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Node indices and values of the Dirichlet-fixed unknowns.
///
/// Indices refer to the system after binary and floating augmentation, whose first entries are
/// the mesh nodes in their original numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirichletSupport<T> {
    pub indices_on_dirichlet: Vec<usize>,
    /// Ascending indices of the unknowns kept in the reduced system.
    pub indices_not_on_dirichlet: Vec<usize>,
    /// The value of every index in `indices_on_dirichlet`, in the same order.
    pub values_on_dirichlet: Vec<T>,
}

/// Everything needed to map the solution of a reduced system back to the mesh nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportData<T> {
    pub num_lagrange_mul_binary: usize,
    pub num_lagrange_mul_floating: usize,
    /// Present whenever Dirichlet conditions exist.
    pub dirichlet: Option<DirichletSupport<T>>,
}

impl<T> SupportData<T> {
    pub fn num_lagrange_mul(&self) -> usize {
        self.num_lagrange_mul_binary + self.num_lagrange_mul_floating
    }

    /// Whether the support data holds all entries required by the given conditions.
    pub fn is_complete_for(&self, classification: &Classification) -> bool {
        !classification.has(BoundaryConditionKind::Dirichlet) || self.dirichlet.is_some()
    }
}

/// The result of [`shrink`].
#[derive(Debug, Clone)]
pub struct ReducedSystem<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    pub rhs: DVector<T>,
    pub support_data: SupportData<T>,
}

impl<T: Scalar> ReducedSystem<T> {
    /// The indices eliminated by Dirichlet conditions.
    pub fn indices_not_dof(&self) -> &[usize] {
        self.support_data
            .dirichlet
            .as_ref()
            .map(|d| d.indices_on_dirichlet.as_slice())
            .unwrap_or(&[])
    }
}

/// The nodes and values claimed by a single Dirichlet condition.
#[derive(Debug, Clone, PartialEq)]
pub struct DirichletNodes<T> {
    pub bc: BcId,
    pub nodes: Vec<usize>,
    pub values: Vec<T>,
}

fn unexpected_kind<T>(bc: &BoundaryCondition<T>, expected: BoundaryConditionKind) -> PyritError {
    PyritError::UnsupportedBoundaryConditionKind(format!(
        "{} (condition {} was classified as {})",
        bc.kind(),
        bc.id(),
        expected
    ))
}

pub(crate) fn check_index(index: usize, size: usize) -> PyritResult<()> {
    if index < size {
        Ok(())
    } else {
        Err(PyritError::IndexOutOfBounds { index, size })
    }
}

pub(crate) fn check_system<T: Scalar>(matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> PyritResult<()> {
    if matrix.nrows() == matrix.ncols() && matrix.nrows() == rhs.len() {
        Ok(())
    } else {
        Err(PyritError::ShapeMismatch {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
            rhs_len: rhs.len(),
        })
    }
}

/// Appends the constraint rows `constraints` and matching columns to the system.
///
/// The multipliers introduced by the constraints have zero right-hand side.
pub fn augment<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    constraints: &CooMatrix<T>,
) -> (CsrMatrix<T>, DVector<T>) {
    (
        augment_with_constraints(matrix, constraints),
        extend_with_zeros(rhs, constraints.nrows()),
    )
}

/// Adds the Neumann load vector to `rhs`.
pub fn shrink_neumann<T, S>(
    shape_function: &S,
    rhs: &DVector<T>,
    problem: &ShrinkInflateProblem<T>,
    integration_order: usize,
) -> PyritResult<DVector<T>>
where
    T: Real,
    S: ?Sized + NodalShapeFunction<T>,
{
    let q = shape_function
        .neumann_term(problem.regions, problem.boundary_conditions, integration_order)
        .map_err(PyritError::BoundaryTerms)?;
    if q.len() != rhs.len() {
        return Err(PyritError::DimensionMismatch {
            context: "Neumann load vector".to_string(),
            expected: rhs.len(),
            actual: q.len(),
        });
    }
    Ok(rhs + q)
}

/// Adds the Robin matrix and load vector to the system.
pub fn shrink_robin<T, S>(
    shape_function: &S,
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    problem: &ShrinkInflateProblem<T>,
    integration_order: usize,
) -> PyritResult<(CsrMatrix<T>, DVector<T>)>
where
    T: Real,
    S: ?Sized + NodalShapeFunction<T>,
{
    let (s, q) = shape_function
        .robin_terms(problem.regions, problem.boundary_conditions, integration_order)
        .map_err(PyritError::BoundaryTerms)?;
    if s.nrows() != matrix.nrows() || s.ncols() != matrix.ncols() {
        return Err(PyritError::DimensionMismatch {
            context: "Robin matrix".to_string(),
            expected: matrix.nrows(),
            actual: s.nrows(),
        });
    }
    if q.len() != rhs.len() {
        return Err(PyritError::DimensionMismatch {
            context: "Robin load vector".to_string(),
            expected: rhs.len(),
            actual: q.len(),
        });
    }
    Ok((csr_add(matrix, &s), rhs + q))
}

/// The number of Lagrange multipliers introduced by the given binary conditions.
pub fn num_binary_multipliers<T>(boundary_conditions: &BoundaryConditions<T>, ids: &[BcId]) -> PyritResult<usize> {
    let mut count = 0;
    for &id in ids {
        let bc = boundary_conditions.get_bc(id)?;
        let BoundaryCondition::Binary {
            primary_nodes,
            replica_nodes,
            ..
        } = bc
        else {
            return Err(unexpected_kind(bc, BoundaryConditionKind::Binary));
        };
        if primary_nodes.len() != replica_nodes.len() {
            return Err(PyritError::DimensionMismatch {
                context: format!("replica nodes of binary boundary condition {}", id),
                expected: primary_nodes.len(),
                actual: replica_nodes.len(),
            });
        }
        count += primary_nodes.len();
    }
    Ok(count)
}

/// The constraint rows `x[replica] - value * x[primary] = 0` of the given binary conditions.
pub fn binary_constraints<T: Real>(
    boundary_conditions: &BoundaryConditions<T>,
    ids: &[BcId],
    num_cols: usize,
) -> PyritResult<CooMatrix<T>> {
    let num_rows = num_binary_multipliers(boundary_conditions, ids)?;
    let mut constraints = CooMatrix::new(num_rows, num_cols);
    let mut row = 0;
    for &id in ids {
        if let BoundaryCondition::Binary {
            primary_nodes,
            replica_nodes,
            value,
            ..
        } = boundary_conditions.get_bc(id)?
        {
            for (&primary, &replica) in primary_nodes.iter().zip(replica_nodes) {
                check_index(primary, num_cols)?;
                check_index(replica, num_cols)?;
                constraints.push(row, primary, -*value);
                constraints.push(row, replica, T::one());
                row += 1;
            }
        }
    }
    Ok(constraints)
}

/// Appends the binary constraints and returns the number of multipliers added.
pub fn shrink_binary<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    boundary_conditions: &BoundaryConditions<T>,
    ids: &[BcId],
) -> PyritResult<(CsrMatrix<T>, DVector<T>, usize)> {
    let constraints = binary_constraints(boundary_conditions, ids, matrix.ncols())?;
    let num_multipliers = constraints.nrows();
    let (matrix, rhs) = augment(matrix, rhs, &constraints);
    Ok((matrix, rhs, num_multipliers))
}

/// The node sets of the given floating conditions, each sorted in ascending order.
pub fn floating_node_sets<T>(
    ids: &[BcId],
    problem: &ShrinkInflateProblem<T>,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<Vec<Vec<usize>>> {
    ids.iter()
        .map(|&id| nodes_of_bc(id, problem.mesh, problem.regions, regions_of_bc))
        .collect()
}

/// The number of Lagrange multipliers introduced by floating conditions on the given node sets.
///
/// A node set with fewer than two nodes introduces none.
pub fn num_floating_multipliers(node_sets: &[Vec<usize>]) -> usize {
    node_sets.iter().map(|nodes| nodes.len().saturating_sub(1)).sum()
}

/// The constraint rows `x[slave] - x[master] = 0` of floating conditions on the given node sets.
///
/// The last node of every set is its master.
pub fn floating_constraints<T: Real>(node_sets: &[Vec<usize>], num_cols: usize) -> PyritResult<CooMatrix<T>> {
    let mut constraints = CooMatrix::new(num_floating_multipliers(node_sets), num_cols);
    let mut row = 0;
    for (&master, slaves) in node_sets.iter().filter_map(|nodes| nodes.split_last()) {
        check_index(master, num_cols)?;
        for &slave in slaves {
            check_index(slave, num_cols)?;
            constraints.push(row, slave, T::one());
            constraints.push(row, master, -T::one());
            row += 1;
        }
    }
    Ok(constraints)
}

/// Appends the floating constraints and returns the number of multipliers added.
pub fn shrink_floating<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    ids: &[BcId],
    problem: &ShrinkInflateProblem<T>,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<(CsrMatrix<T>, DVector<T>, usize)> {
    let node_sets = floating_node_sets(ids, problem, regions_of_bc)?;
    let constraints = floating_constraints(&node_sets, matrix.ncols())?;
    let num_multipliers = constraints.nrows();
    let (matrix, rhs) = augment(matrix, rhs, &constraints);
    Ok((matrix, rhs, num_multipliers))
}

/// The nodes and values of the given Dirichlet conditions, before resolving overlaps.
pub fn dirichlet_nodes<T: Real>(
    ids: &[BcId],
    problem: &ShrinkInflateProblem<T>,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<Vec<DirichletNodes<T>>> {
    let boundary_conditions = problem.boundary_conditions;
    ids.iter()
        .map(|&id| -> PyritResult<DirichletNodes<T>> {
            let bc = boundary_conditions.get_bc(id)?;
            let nodes = nodes_of_bc(id, problem.mesh, problem.regions, regions_of_bc)?;
            let values = bc
                .dirichlet_values(nodes.len(), boundary_conditions.time())
                .ok_or_else(|| unexpected_kind(bc, BoundaryConditionKind::Dirichlet))??;
            Ok(DirichletNodes { bc: id, nodes, values })
        })
        .collect()
}

/// Removes from every condition the nodes already claimed by an earlier condition.
pub fn resolve_intersections<T>(conditions: Vec<DirichletNodes<T>>) -> Vec<DirichletNodes<T>> {
    let mut claimed = FxHashSet::default();
    conditions
        .into_iter()
        .map(|condition| {
            let (nodes, values): (Vec<_>, Vec<_>) = condition
                .nodes
                .into_iter()
                .zip(condition.values)
                .filter(|(node, _)| !claimed.contains(node))
                .unzip();
            claimed.extend(nodes.iter().copied());
            DirichletNodes {
                bc: condition.bc,
                nodes,
                values,
            }
        })
        .collect()
}

/// Splits `0..size` into the indices fixed by the resolved conditions and the remaining ones.
pub fn dirichlet_support<T: Real>(resolved: &[DirichletNodes<T>], size: usize) -> PyritResult<DirichletSupport<T>> {
    let mut is_fixed = vec![false; size];
    let mut indices_on_dirichlet = Vec::new();
    let mut values_on_dirichlet = Vec::new();
    for condition in resolved {
        if condition.nodes.len() != condition.values.len() {
            return Err(PyritError::DimensionMismatch {
                context: format!("values of Dirichlet boundary condition {}", condition.bc),
                expected: condition.nodes.len(),
                actual: condition.values.len(),
            });
        }
        for (&node, &value) in condition.nodes.iter().zip(&condition.values) {
            check_index(node, size)?;
            is_fixed[node] = true;
            indices_on_dirichlet.push(node);
            values_on_dirichlet.push(value);
        }
    }
    let indices_not_on_dirichlet = (0..size).filter(|&i| !is_fixed[i]).collect();
    Ok(DirichletSupport {
        indices_on_dirichlet,
        indices_not_on_dirichlet,
        values_on_dirichlet,
    })
}

/// Resolves the given Dirichlet conditions on a system of size `size`.
pub fn compute_dirichlet_support<T: Real>(
    ids: &[BcId],
    size: usize,
    problem: &ShrinkInflateProblem<T>,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<DirichletSupport<T>> {
    let resolved = resolve_intersections(dirichlet_nodes(ids, problem, regions_of_bc)?);
    dirichlet_support(&resolved, size)
}

/// Eliminates the fixed unknowns of `support` from the system.
///
/// Returns `A[free, free]` and `b[free] - A[free, fixed] * values`.
pub fn eliminate_dirichlet<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    support: &DirichletSupport<T>,
) -> (CsrMatrix<T>, DVector<T>) {
    let free = &support.indices_not_on_dirichlet;
    let fixed = &support.indices_on_dirichlet;
    let values = DVector::from_column_slice(&support.values_on_dirichlet);

    let coupling = extract_submatrix(matrix, free, fixed);
    let rhs_reduced = gather(rhs, free) - csr_mul_vector(&coupling, &values);
    let matrix_reduced = extract_submatrix(matrix, free, free);
    (matrix_reduced, rhs_reduced)
}

/// Eliminates the nodes fixed by the given Dirichlet conditions.
pub fn shrink_dirichlet<T: Real>(
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    ids: &[BcId],
    problem: &ShrinkInflateProblem<T>,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<(CsrMatrix<T>, DVector<T>, DirichletSupport<T>)> {
    let support = compute_dirichlet_support(ids, matrix.nrows(), problem, regions_of_bc)?;
    let (matrix, rhs) = eliminate_dirichlet(matrix, rhs, &support);
    Ok((matrix, rhs, support))
}

/// Applies all boundary conditions of `problem` to the system `matrix * x = rhs`.
///
/// Steps for kinds without conditions leave the system untouched.
pub fn shrink<T, S>(
    shape_function: &S,
    matrix: &CsrMatrix<T>,
    rhs: &DVector<T>,
    problem: &ShrinkInflateProblem<T>,
    integration_order: usize,
) -> PyritResult<ReducedSystem<T>>
where
    T: Real,
    S: ?Sized + NodalShapeFunction<T>,
{
    check_system(matrix, rhs)?;
    // Node indices of the mesh address the rows of the unaugmented system
    if problem.mesh.num_nodes() != matrix.nrows() {
        return Err(PyritError::DimensionMismatch {
            context: "mesh nodes of the assembled system".to_string(),
            expected: matrix.nrows(),
            actual: problem.mesh.num_nodes(),
        });
    }
    let classification = problem.boundary_conditions.dict_of_boundary_condition();
    let regions_of_bc = problem.boundary_conditions.regions_of_bc(problem.regions);
    let mut matrix = matrix.clone();
    let mut rhs = rhs.clone();

    if classification.has(BoundaryConditionKind::Neumann) {
        rhs = shrink_neumann(shape_function, &rhs, problem, integration_order)?;
        debug!("Applied {} Neumann condition(s)", classification.neumann.len());
    }

    if classification.has(BoundaryConditionKind::Robin) {
        (matrix, rhs) = shrink_robin(shape_function, &matrix, &rhs, problem, integration_order)?;
        debug!("Applied {} Robin condition(s)", classification.robin.len());
    }

    let mut num_lagrange_mul_binary = 0;
    if classification.has(BoundaryConditionKind::Binary) {
        let ids = &classification.binary;
        (matrix, rhs, num_lagrange_mul_binary) = shrink_binary(&matrix, &rhs, problem.boundary_conditions, ids)?;
        debug!(
            "Applied {} binary condition(s) with {} multiplier(s), system size is now {}",
            ids.len(),
            num_lagrange_mul_binary,
            rhs.len()
        );
    }

    let mut num_lagrange_mul_floating = 0;
    if classification.has(BoundaryConditionKind::Floating) {
        let ids = &classification.floating;
        (matrix, rhs, num_lagrange_mul_floating) = shrink_floating(&matrix, &rhs, ids, problem, &regions_of_bc)?;
        debug!(
            "Applied {} floating condition(s) with {} multiplier(s), system size is now {}",
            ids.len(),
            num_lagrange_mul_floating,
            rhs.len()
        );
    }

    let mut dirichlet = None;
    if classification.has(BoundaryConditionKind::Dirichlet) {
        let ids = &classification.dirichlet;
        let support;
        (matrix, rhs, support) = shrink_dirichlet(&matrix, &rhs, ids, problem, &regions_of_bc)?;
        debug!(
            "Applied {} Dirichlet condition(s) fixing {} node(s), system size is now {}",
            ids.len(),
            support.indices_on_dirichlet.len(),
            rhs.len()
        );
        dirichlet = Some(support);
    }

    Ok(ReducedSystem {
        matrix,
        rhs,
        support_data: SupportData {
            num_lagrange_mul_binary,
            num_lagrange_mul_floating,
            dirichlet,
        },
    })
}
