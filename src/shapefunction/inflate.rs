//! Mapping of reduced solutions back to the mesh nodes.
use crate::classify::{BoundaryConditionKind, Classification};
use crate::error::{PyritError, PyritResult};
use crate::shapefunction::shrink::{
    check_index, dirichlet_nodes, dirichlet_support, floating_node_sets, num_binary_multipliers,
    num_floating_multipliers, resolve_intersections, DirichletSupport, SupportData,
};
use crate::shapefunction::ShrinkInflateProblem;
use log::{debug, warn};
use nalgebra::DVector;
use pyrit_traits::Real;

/// Computes the support data of a reduced system with `size_solution` unknowns.
///
/// Produces the same support data as [`shrink`](crate::shapefunction::shrink::shrink) for the
/// same boundary conditions and mesh.
pub fn compute_support_data<T: Real>(
    classification: &Classification,
    size_solution: usize,
    problem: &ShrinkInflateProblem<T>,
) -> PyritResult<SupportData<T>> {
    let regions_of_bc = problem.boundary_conditions.regions_of_bc(problem.regions);

    let num_lagrange_mul_binary = num_binary_multipliers(problem.boundary_conditions, &classification.binary)?;
    let node_sets = floating_node_sets(&classification.floating, problem, &regions_of_bc)?;
    let num_lagrange_mul_floating = num_floating_multipliers(&node_sets);

    let dirichlet = if classification.has(BoundaryConditionKind::Dirichlet) {
        let resolved = resolve_intersections(dirichlet_nodes(&classification.dirichlet, problem, &regions_of_bc)?);
        let num_fixed: usize = resolved.iter().map(|condition| condition.nodes.len()).sum();
        Some(dirichlet_support(&resolved, size_solution + num_fixed)?)
    } else {
        None
    };

    Ok(SupportData {
        num_lagrange_mul_binary,
        num_lagrange_mul_floating,
        dirichlet,
    })
}

/// Scatters the reduced solution to the free indices and the Dirichlet values to the fixed ones.
pub fn inflate_dirichlet<T: Real>(solution: &DVector<T>, support: &DirichletSupport<T>) -> PyritResult<DVector<T>> {
    let DirichletSupport {
        indices_on_dirichlet,
        indices_not_on_dirichlet,
        values_on_dirichlet,
    } = support;
    if values_on_dirichlet.len() != indices_on_dirichlet.len() {
        return Err(PyritError::DimensionMismatch {
            context: "Dirichlet values of the support data".to_string(),
            expected: indices_on_dirichlet.len(),
            actual: values_on_dirichlet.len(),
        });
    }
    if solution.len() != indices_not_on_dirichlet.len() {
        return Err(PyritError::DimensionMismatch {
            context: "reduced solution".to_string(),
            expected: indices_not_on_dirichlet.len(),
            actual: solution.len(),
        });
    }

    let size = indices_on_dirichlet.len() + indices_not_on_dirichlet.len();
    let mut full = DVector::zeros(size);
    for (&index, &value) in indices_not_on_dirichlet.iter().zip(solution.iter()) {
        check_index(index, size)?;
        full[index] = value;
    }
    for (&index, &value) in indices_on_dirichlet.iter().zip(values_on_dirichlet) {
        check_index(index, size)?;
        full[index] = value;
    }
    Ok(full)
}

/// Drops the trailing `num_multipliers` entries of the solution.
pub fn drop_multipliers<T: Real>(solution: DVector<T>, num_multipliers: usize) -> PyritResult<DVector<T>> {
    let len = solution.len();
    if num_multipliers > len {
        return Err(PyritError::DimensionMismatch {
            context: "number of Lagrange multipliers".to_string(),
            expected: len,
            actual: num_multipliers,
        });
    }
    Ok(solution.remove_rows(len - num_multipliers, num_multipliers))
}

/// Maps the solution of a reduced system back to all nodes.
///
/// The reduction is undone in reverse order: Dirichlet values are reinserted, then the floating
/// and finally the binary multipliers are dropped. Missing or incomplete support data is
/// recomputed from `problem`.
pub fn inflate<T: Real>(
    solution: &DVector<T>,
    problem: &ShrinkInflateProblem<T>,
    support_data: Option<&SupportData<T>>,
) -> PyritResult<DVector<T>> {
    let classification = problem.boundary_conditions.dict_of_boundary_condition();

    let recomputed;
    let support_data = match support_data {
        Some(support_data) if support_data.is_complete_for(&classification) => support_data,
        given => {
            if given.is_some() {
                warn!("The given support data is incomplete and will be recomputed");
            } else {
                debug!("No support data given, computing it from the boundary conditions");
            }
            recomputed = compute_support_data(&classification, solution.len(), problem)?;
            &recomputed
        }
    };

    let mut full = match &support_data.dirichlet {
        Some(support) if classification.has(BoundaryConditionKind::Dirichlet) => {
            let full = inflate_dirichlet(solution, support)?;
            debug!(
                "Reinserted {} Dirichlet value(s), solution size is now {}",
                support.indices_on_dirichlet.len(),
                full.len()
            );
            full
        }
        _ => solution.clone(),
    };

    if classification.has(BoundaryConditionKind::Floating) {
        full = drop_multipliers(full, support_data.num_lagrange_mul_floating)?;
        debug!(
            "Dropped {} floating multiplier(s)",
            support_data.num_lagrange_mul_floating
        );
    }

    if classification.has(BoundaryConditionKind::Binary) {
        full = drop_multipliers(full, support_data.num_lagrange_mul_binary)?;
        debug!("Dropped {} binary multiplier(s)", support_data.num_lagrange_mul_binary);
    }

    Ok(full)
}
