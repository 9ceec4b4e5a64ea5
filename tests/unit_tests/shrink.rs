use crate::{csr, dense, node_mesh, segment_mesh};
use matrixcompare::assert_matrix_eq;
use nalgebra::{dmatrix, dvector, DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use pyrit::bdrycond::{BoundaryCondition, BoundaryConditions, DirichletValue, TimeFunction};
use pyrit::region::{Region, Regions};
use pyrit::shapefunction::shrink::{
    binary_constraints, compute_dirichlet_support, dirichlet_support, eliminate_dirichlet, floating_constraints,
    num_floating_multipliers, resolve_intersections, shrink_binary, shrink_floating, shrink_robin, DirichletNodes,
};
use pyrit::shapefunction::{
    DirichletSupport, LinearSimplexShapeFunction, NodalShapeFunction, ShrinkInflateProblem, SupportData,
};
use pyrit::solver::solve_direct;
use pyrit::PyritError;
use util::laplace_1d;

fn tridiagonal() -> DMatrix<f64> {
    dmatrix![2.0, -1.0, 0.0;
             -1.0, 2.0, -1.0;
             0.0, -1.0, 2.0]
}

#[test]
fn shrink_without_conditions_returns_the_system() {
    let mesh = node_mesh(3, &[]);
    let regions = Regions::new();
    let bcs = BoundaryConditions::<f64>::new();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let matrix = csr(&tridiagonal());
    let rhs = dvector![1.0, 2.0, 3.0];

    let reduced = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&matrix, &rhs, &problem, 1)
        .unwrap();

    assert_matrix_eq!(dense(&reduced.matrix), tridiagonal());
    assert_eq!(reduced.rhs, rhs);
    assert_eq!(
        reduced.support_data,
        SupportData {
            num_lagrange_mul_binary: 0,
            num_lagrange_mul_floating: 0,
            dirichlet: None,
        }
    );
    assert!(reduced.indices_not_dof().is_empty());
}

#[test]
fn shrink_rejects_incompatible_shapes() {
    let mesh = node_mesh(3, &[]);
    let regions = Regions::new();
    let bcs = BoundaryConditions::<f64>::new();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);

    let err = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&csr(&tridiagonal()), &dvector![1.0, 2.0], &problem, 1)
        .unwrap_err();
    assert!(matches!(err, PyritError::ShapeMismatch { nrows: 3, ncols: 3, rhs_len: 2 }));
}

#[test]
fn neumann_on_a_node_adds_its_value_to_the_rhs() {
    let mesh = node_mesh(3, &[(1, &[2])]);
    let regions: Regions = [Region::new(1, 0).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::neumann(1, 3.0)].into_iter().collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);

    let reduced = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&csr(&tridiagonal()), &dvector![1.0, 1.0, 1.0], &problem, 1)
        .unwrap();

    assert_matrix_eq!(dense(&reduced.matrix), tridiagonal());
    assert_matrix_eq!(reduced.rhs, dvector![1.0, 1.0, 4.0], comp = abs, tol = 1e-14);
}

#[test]
fn robin_on_a_segment_adds_boundary_mass_and_load() {
    let mesh = segment_mesh(1, &[(1, &[0])]);
    let regions: Regions = [Region::new(1, 1).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::robin(1, 2.0, 1.0, 4.0)].into_iter().collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let shape_function = LinearSimplexShapeFunction::new(&mesh);

    let (matrix, rhs) = shrink_robin(
        &shape_function,
        &CsrMatrix::identity(2),
        &dvector![1.0, 0.0],
        &problem,
        1,
    )
    .unwrap();

    #[rustfmt::skip]
    let expected = dmatrix![1.0 + 2.0 / 3.0, 1.0 / 3.0;
                            1.0 / 3.0, 1.0 + 2.0 / 3.0];
    assert_matrix_eq!(dense(&matrix), expected, comp = abs, tol = 1e-14);
    assert_matrix_eq!(rhs, dvector![3.0, 2.0], comp = abs, tol = 1e-14);
}

#[test]
fn robin_with_vanishing_beta_fails() {
    let mesh = segment_mesh(1, &[(1, &[0])]);
    let regions: Regions = [Region::new(1, 1).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::robin(1, 2.0, 0.0, 4.0)].into_iter().collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);

    let err = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&CsrMatrix::identity(2), &dvector![0.0, 0.0], &problem, 1)
        .unwrap_err();
    assert!(matches!(err, PyritError::BoundaryTerms(_)));
}

#[test]
fn binary_constraints_couple_primary_and_replica() {
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::binary(1, vec![0, 1], vec![2, 3], 2.0)]
        .into_iter()
        .collect();
    let matrix = csr(&(DMatrix::identity(4, 4) * 3.0));
    let rhs = dvector![1.0, 2.0, 3.0, 4.0];

    let constraints = binary_constraints(&bcs, &[1], 4).unwrap();
    #[rustfmt::skip]
    let expected_constraints = dmatrix![-2.0, 0.0, 1.0, 0.0;
                                        0.0, -2.0, 0.0, 1.0];
    assert_matrix_eq!(DMatrix::from(&constraints), expected_constraints);

    let (augmented, augmented_rhs, num_multipliers) = shrink_binary(&matrix, &rhs, &bcs, &[1]).unwrap();
    assert_eq!(num_multipliers, 2);

    #[rustfmt::skip]
    let expected = dmatrix![3.0, 0.0, 0.0, 0.0, -2.0, 0.0;
                            0.0, 3.0, 0.0, 0.0, 0.0, -2.0;
                            0.0, 0.0, 3.0, 0.0, 1.0, 0.0;
                            0.0, 0.0, 0.0, 3.0, 0.0, 1.0;
                            -2.0, 0.0, 1.0, 0.0, 0.0, 0.0;
                            0.0, -2.0, 0.0, 1.0, 0.0, 0.0];
    assert_matrix_eq!(dense(&augmented), expected);
    assert_eq!(augmented_rhs, dvector![1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
}

#[test]
fn binary_with_unequal_node_lists_fails() {
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::binary(4, vec![0, 1], vec![2], 1.0)]
        .into_iter()
        .collect();
    let err = binary_constraints(&bcs, &[4], 3).unwrap_err();
    assert!(matches!(err, PyritError::DimensionMismatch { expected: 2, actual: 1, .. }));
}

#[test]
fn binary_with_node_out_of_bounds_fails() {
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::binary(4, vec![0], vec![3], 1.0)]
        .into_iter()
        .collect();
    let err = binary_constraints(&bcs, &[4], 3).unwrap_err();
    assert!(matches!(err, PyritError::IndexOutOfBounds { index: 3, size: 3 }));
}

#[test]
fn floating_constrains_every_node_to_the_last_one() {
    let mesh = node_mesh(8, &[(1, &[6, 5, 7])]);
    let regions: Regions = [Region::new(1, 0).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::floating(1)].into_iter().collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let regions_of_bc = bcs.regions_of_bc(&regions);
    let matrix = csr(&laplace_1d(8, 1.0));
    let rhs = DVector::from_element(8, 1.0);

    let (augmented, augmented_rhs, num_multipliers) =
        shrink_floating(&matrix, &rhs, &[1], &problem, &regions_of_bc).unwrap();

    assert_eq!(num_multipliers, 2);
    assert_eq!(augmented.nrows(), 10);
    let augmented = dense(&augmented);
    assert_matrix_eq!(augmented.view((0, 0), (8, 8)), laplace_1d(8, 1.0));

    let mut expected_constraints = DMatrix::zeros(2, 8);
    expected_constraints[(0, 5)] = 1.0;
    expected_constraints[(0, 7)] = -1.0;
    expected_constraints[(1, 6)] = 1.0;
    expected_constraints[(1, 7)] = -1.0;
    assert_matrix_eq!(augmented.view((8, 0), (2, 8)), expected_constraints);
    assert_matrix_eq!(augmented.view((0, 8), (8, 2)), expected_constraints.transpose());
    assert_matrix_eq!(augmented.view((8, 8), (2, 2)), DMatrix::<f64>::zeros(2, 2));
    assert_eq!(augmented_rhs.rows(8, 2), DVector::<f64>::zeros(2));
}

#[test]
fn floating_on_a_single_node_adds_no_multiplier() {
    let node_sets = vec![vec![3], vec![]];
    assert_eq!(num_floating_multipliers(&node_sets), 0);
    let constraints = floating_constraints::<f64>(&node_sets, 5).unwrap();
    assert_eq!(constraints.nrows(), 0);
    assert_eq!(constraints.nnz(), 0);
}

#[test]
fn overlapping_dirichlet_nodes_belong_to_the_earlier_condition() {
    let conditions = vec![
        DirichletNodes {
            bc: 1,
            nodes: vec![1, 2, 3],
            values: vec![5.0; 3],
        },
        DirichletNodes {
            bc: 2,
            nodes: vec![3, 4],
            values: vec![9.0; 2],
        },
    ];
    let resolved = resolve_intersections(conditions);
    assert_eq!(resolved[0].nodes, vec![1, 2, 3]);
    assert_eq!(resolved[1].nodes, vec![4]);
    assert_eq!(resolved[1].values, vec![9.0]);

    let support = dirichlet_support(&resolved, 6).unwrap();
    assert_eq!(
        support,
        DirichletSupport {
            indices_on_dirichlet: vec![1, 2, 3, 4],
            indices_not_on_dirichlet: vec![0, 5],
            values_on_dirichlet: vec![5.0, 5.0, 5.0, 9.0],
        }
    );
}

fn overlapping_dirichlet_problem(first: usize, second: usize) -> (Regions, BoundaryConditions<f64>) {
    let regions: Regions = [
        Region::new(1, 1).with_boundary_condition(1),
        Region::new(2, 1).with_boundary_condition(2),
    ]
    .into_iter()
    .collect();
    let values = [(1, 5.0), (2, 9.0)];
    let bcs = [first, second]
        .into_iter()
        .map(|i| BoundaryCondition::dirichlet(values[i].0, values[i].1))
        .collect();
    (regions, bcs)
}

#[test]
fn dirichlet_overlap_on_a_mesh_follows_insertion_order() {
    let mesh = segment_mesh(5, &[(1, &[1, 2]), (2, &[3])]);

    let (regions, bcs) = overlapping_dirichlet_problem(0, 1);
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let classification = bcs.dict_of_boundary_condition();
    let support =
        compute_dirichlet_support(&classification.dirichlet, 6, &problem, &bcs.regions_of_bc(&regions)).unwrap();
    assert_eq!(support.indices_on_dirichlet, vec![1, 2, 3, 4]);
    assert_eq!(support.values_on_dirichlet, vec![5.0, 5.0, 5.0, 9.0]);
    assert_eq!(support.indices_not_on_dirichlet, vec![0, 5]);

    let (regions, bcs) = overlapping_dirichlet_problem(1, 0);
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let classification = bcs.dict_of_boundary_condition();
    let support =
        compute_dirichlet_support(&classification.dirichlet, 6, &problem, &bcs.regions_of_bc(&regions)).unwrap();
    assert_eq!(support.indices_on_dirichlet, vec![3, 4, 1, 2]);
    assert_eq!(support.values_on_dirichlet, vec![9.0, 9.0, 5.0, 5.0]);
    assert_eq!(support.indices_not_on_dirichlet, vec![0, 5]);
}

#[test]
fn dirichlet_elimination_moves_fixed_columns_to_the_rhs() {
    let support = DirichletSupport {
        indices_on_dirichlet: vec![0],
        indices_not_on_dirichlet: vec![1, 2],
        values_on_dirichlet: vec![3.0],
    };
    let (matrix, rhs) = eliminate_dirichlet(&csr(&tridiagonal()), &dvector![1.0, 1.0, 1.0], &support);

    #[rustfmt::skip]
    let expected = dmatrix![2.0, -1.0;
                            -1.0, 2.0];
    assert_matrix_eq!(dense(&matrix), expected);
    assert_matrix_eq!(rhs, dvector![4.0, 1.0], comp = abs, tol = 1e-14);
}

#[test]
fn dirichlet_with_mismatching_per_node_values_fails() {
    use pyrit::bdrycond::DirichletValue;

    let mesh = segment_mesh(2, &[(1, &[0])]);
    let regions: Regions = [Region::new(1, 1).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [BoundaryCondition::Dirichlet {
        id: 1,
        value: DirichletValue::PerNode(vec![1.0, 2.0, 3.0]),
    }]
    .into_iter()
    .collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);

    let err = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&csr(&tridiagonal()), &dvector![0.0, 0.0, 0.0], &problem, 1)
        .unwrap_err();
    assert!(matches!(err, PyritError::DimensionMismatch { expected: 2, actual: 3, .. }));
}

#[test]
fn shrink_applies_binary_floating_and_dirichlet_in_order() {
    // Binary couples nodes 0 and 1, floating ties nodes 3 and 4, Dirichlet fixes nodes 0 and 1
    let mesh = segment_mesh(4, &[(1, &[0]), (2, &[3])]);
    let regions: Regions = [
        Region::new(1, 1).with_boundary_condition(1),
        Region::new(2, 1).with_boundary_condition(2),
    ]
    .into_iter()
    .collect();
    let bcs: BoundaryConditions<f64> = [
        BoundaryCondition::dirichlet(1, 1.0),
        BoundaryCondition::floating(2),
        BoundaryCondition::binary(3, vec![0], vec![1], 1.0),
    ]
    .into_iter()
    .collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let matrix = csr(&(laplace_1d(5, 1.0) + DMatrix::identity(5, 5)));
    let rhs = DVector::from_element(5, 1.0);

    let reduced = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&matrix, &rhs, &problem, 1)
        .unwrap();

    assert_eq!(reduced.support_data.num_lagrange_mul_binary, 1);
    assert_eq!(reduced.support_data.num_lagrange_mul_floating, 1);
    assert_eq!(reduced.support_data.num_lagrange_mul(), 2);
    assert_eq!(
        reduced.support_data.dirichlet,
        Some(DirichletSupport {
            indices_on_dirichlet: vec![0, 1],
            indices_not_on_dirichlet: vec![2, 3, 4, 5, 6],
            values_on_dirichlet: vec![1.0, 1.0],
        })
    );
    assert_eq!(reduced.indices_not_dof(), &[0, 1]);
    assert_eq!(reduced.matrix.nrows(), 5);
    assert_eq!(reduced.matrix.ncols(), 5);
    assert_eq!(reduced.rhs.len(), 5);

    // The last two unknowns are the binary and the floating multiplier
    let reduced_matrix = dense(&reduced.matrix);
    assert_matrix_eq!(reduced_matrix.clone(), reduced_matrix.transpose());
    // Node 2 couples to the fixed node 1 with entry -1. The binary row has -1 and +1 on the two
    // fixed nodes, which cancel.
    assert_matrix_eq!(
        reduced.rhs,
        dvector![2.0, 1.0, 1.0, 0.0, 0.0],
        comp = abs,
        tol = 1e-14
    );
}

#[test]
fn shrink_rejects_a_mesh_that_does_not_match_the_system() {
    // Node 3 of the mesh would address the binary multiplier of the augmented system
    let mesh = node_mesh(4, &[(1, &[3])]);
    let regions: Regions = [Region::new(1, 0).with_boundary_condition(1)].into_iter().collect();
    let bcs: BoundaryConditions<f64> = [
        BoundaryCondition::binary(2, vec![0], vec![1], 1.0),
        BoundaryCondition::dirichlet(1, 42.0),
    ]
    .into_iter()
    .collect();
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);

    let err = LinearSimplexShapeFunction::new(&mesh)
        .shrink(&csr(&tridiagonal()), &dvector![0.0, 0.0, 0.0], &problem, 1)
        .unwrap_err();
    assert!(matches!(err, PyritError::DimensionMismatch { expected: 3, actual: 4, .. }));
}

#[test]
fn time_dependent_dirichlet_is_evaluated_at_the_time_of_the_collection() {
    let mesh = node_mesh(3, &[(1, &[0])]);
    let regions: Regions = [Region::new(1, 0).with_boundary_condition(1)].into_iter().collect();
    let mut bcs: BoundaryConditions<f64> = [BoundaryCondition::Dirichlet {
        id: 1,
        value: DirichletValue::TimeDependent(TimeFunction::new(|t| 2.0 * t)),
    }]
    .into_iter()
    .collect();
    bcs.set_time(1.5);
    let shape_function = LinearSimplexShapeFunction::new(&mesh);
    let matrix = csr(&tridiagonal());
    let rhs = dvector![0.0, 0.0, 0.0];

    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let reduced = shape_function.shrink(&matrix, &rhs, &problem, 1).unwrap();
    let support = reduced.support_data.dirichlet.clone().unwrap();
    assert_eq!(support.indices_on_dirichlet, vec![0]);
    assert_eq!(support.values_on_dirichlet, vec![3.0]);
    assert_matrix_eq!(dense(&reduced.matrix), dmatrix![2.0, -1.0; -1.0, 2.0]);
    // The fixed column moves to the rhs with value 3
    assert_matrix_eq!(reduced.rhs.clone(), dvector![3.0, 0.0], comp = abs, tol = 1e-14);

    let computed = shape_function
        .compute_support_data(&bcs.dict_of_boundary_condition(), reduced.rhs.len(), &problem)
        .unwrap();
    assert_eq!(computed, reduced.support_data);

    let solution = solve_direct(&reduced.matrix, &reduced.rhs).unwrap();
    let full = shape_function.inflate(&solution, &problem, None).unwrap();
    assert_matrix_eq!(full, dvector![3.0, 2.0, 1.0], comp = abs, tol = 1e-12);

    // Recomputed support data picks up a later time
    bcs.set_time(0.5);
    let problem = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let full = shape_function.inflate(&solution, &problem, None).unwrap();
    assert_matrix_eq!(full, dvector![1.0, 2.0, 1.0], comp = abs, tol = 1e-12);
}
