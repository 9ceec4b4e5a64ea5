use super::csr;
use matrixcompare::assert_matrix_eq;
use nalgebra::{dvector, DMatrix, DVector, Point1, U1};
use pyrit::bdrycond::{BoundaryCondition, BoundaryConditions};
use pyrit::excitation::Excitations;
use pyrit::material::Materials;
use pyrit::mesh::procedural::create_interval_mesh;
use pyrit::mesh::TaggedMesh;
use pyrit::problem::Problem;
use pyrit::region::{Region, Regions};
use pyrit::shapefunction::{LinearSimplexShapeFunction, NodalShapeFunction, ShrinkInflateProblem};
use pyrit::solver::{solve_direct, KrylovMethod, Solver, SolverDispatch, SolverOptions};
use util::{laplace_1d, linspace};

fn problem(
    mesh: TaggedMesh<f64, U1>,
    regions: impl IntoIterator<Item = Region>,
    bcs: impl IntoIterator<Item = BoundaryCondition<f64>>,
) -> Problem<f64, U1> {
    Problem::new(
        "end to end",
        mesh,
        regions.into_iter().collect(),
        Materials::new(),
        bcs.into_iter().collect(),
        Excitations::new(),
    )
}

#[test]
fn four_node_system_with_single_dirichlet_node() {
    let vertices: Vec<_> = (0..4).map(|i| Point1::new(i as f64)).collect();
    let mut mesh = TaggedMesh::from_vertices(vertices);
    mesh.tag_nodes(&[0], 1);
    let problem = problem(
        mesh,
        [Region::new(1, 0).with_boundary_condition(1)],
        [BoundaryCondition::dirichlet(1, 3.0)],
    );
    let matrix = csr(&(laplace_1d(4, 1.0) + DMatrix::identity(4, 4)));
    let rhs = DVector::from_element(4, 1.0);

    let reduced = problem.shrink(&matrix, &rhs, 1).unwrap();
    assert_eq!(reduced.matrix.nrows(), 3);
    assert_eq!(reduced.matrix.ncols(), 3);
    assert_eq!(reduced.rhs.len(), 3);

    let v = solve_direct(&reduced.matrix, &reduced.rhs).unwrap();
    let full = problem.inflate(&v, Some(&reduced.support_data)).unwrap();
    assert_eq!(full.len(), 4);
    assert_eq!(full[0], 3.0);
    assert_eq!(full.rows(1, 3), v);
}

#[test]
fn poisson_with_dirichlet_and_neumann_ends() {
    // -u'' = 0 on [0, 1], u(0) = 1 and u'(1) = 2, so u = 1 + 2x
    let num_cells = 4;
    let mut mesh = create_interval_mesh(0.0, 1.0, num_cells);
    mesh.tag_nodes(&[0], 1);
    mesh.tag_nodes(&[num_cells], 2);
    let problem = problem(
        mesh,
        [
            Region::new(1, 0).with_boundary_condition(1),
            Region::new(2, 0).with_boundary_condition(2),
        ],
        [BoundaryCondition::dirichlet(1, 1.0), BoundaryCondition::neumann(2, 2.0)],
    );
    let stiffness = csr(&laplace_1d(num_cells + 1, num_cells as f64));
    let rhs = DVector::zeros(num_cells + 1);

    let (solution, _) = problem
        .solve(&stiffness, &rhs, &SolverDispatch::new(), Solver::Direct, 1)
        .unwrap();
    let expected = linspace(num_cells + 1, 1.0, 3.0);
    assert_matrix_eq!(solution, expected, comp = abs, tol = 1e-12);
}

#[test]
fn poisson_with_robin_end() {
    // -u'' = 0 on [0, 1], u(0) = 0 and u(1) + u'(1) = 2, so u = x
    let num_cells = 5;
    let mut mesh = create_interval_mesh(0.0, 1.0, num_cells);
    mesh.tag_nodes(&[0], 1);
    mesh.tag_nodes(&[num_cells], 2);
    let problem = problem(
        mesh,
        [
            Region::new(1, 0).with_boundary_condition(1),
            Region::new(2, 0).with_boundary_condition(2),
        ],
        [BoundaryCondition::dirichlet(1, 0.0), BoundaryCondition::robin(2, 1.0, 1.0, 2.0)],
    );
    let stiffness = csr(&laplace_1d(num_cells + 1, num_cells as f64));
    let rhs = DVector::zeros(num_cells + 1);

    let dispatch = SolverDispatch::new().with_options(SolverOptions::default().with_tolerance(1e-12));
    let (solution, info) = problem
        .solve(&stiffness, &rhs, &dispatch, Solver::Krylov(KrylovMethod::Cg), 1)
        .unwrap();
    assert_matrix_eq!(solution, linspace(num_cells + 1, 0.0, 1.0), comp = abs, tol = 1e-9);
    assert_eq!(info.solver, "cg");
}

#[test]
fn floating_conductor_between_two_electrodes() {
    // Nodes 2, 3 and 4 form an uncharged conductor between u(0) = 0 and u(1) = 1, which takes
    // the potential of the midpoint
    let num_cells = 6;
    let mut mesh = create_interval_mesh(0.0, 1.0, num_cells);
    mesh.tag_nodes(&[0], 1);
    mesh.tag_nodes(&[num_cells], 2);
    mesh.tag_entities(1, &[2, 3], 3);
    let problem = problem(
        mesh,
        [
            Region::new(1, 0).with_boundary_condition(1),
            Region::new(2, 0).with_boundary_condition(2),
            Region::new(3, 1).with_boundary_condition(3),
        ],
        [
            BoundaryCondition::dirichlet(1, 0.0),
            BoundaryCondition::dirichlet(2, 1.0),
            BoundaryCondition::floating(3),
        ],
    );
    let stiffness = csr(&laplace_1d(num_cells + 1, num_cells as f64));
    let rhs = DVector::zeros(num_cells + 1);
    let expected = dvector![0.0, 0.25, 0.5, 0.5, 0.5, 0.75, 1.0];
    let dispatch = SolverDispatch::new().with_options(SolverOptions::default().with_tolerance(1e-12));

    let reduced = problem.shrink(&stiffness, &rhs, 1).unwrap();
    assert_eq!(reduced.support_data.num_lagrange_mul_floating, 2);
    assert_eq!(reduced.rhs.len(), num_cells + 1 + 2 - 2);

    for solver in [Solver::Direct, Solver::Krylov(KrylovMethod::Gmres)] {
        let (solution, _) = problem
            .solve(&stiffness, &rhs, &dispatch, solver, 1)
            .unwrap();
        assert_matrix_eq!(solution, expected.clone(), comp = abs, tol = 1e-8);
    }
}

#[test]
fn binary_condition_links_replica_to_primary() {
    // With the identity as system matrix, the minimizer of |x - b|^2 / 2 subject to x3 = 2 x1 has
    // x1 = (b1 + 2 b3) / 5
    let vertices: Vec<_> = (0..5).map(|i| Point1::new(i as f64)).collect();
    let mut mesh = TaggedMesh::from_vertices(vertices);
    mesh.tag_nodes(&[0], 1);
    let problem = problem(
        mesh,
        [Region::new(1, 0).with_boundary_condition(1)],
        [
            BoundaryCondition::dirichlet(1, 7.0),
            BoundaryCondition::binary(2, vec![1], vec![3], 2.0),
        ],
    );
    let matrix = csr(&DMatrix::identity(5, 5));
    let rhs = dvector![0.0, 1.0, 5.0, 2.0, 3.0];
    let dispatch = SolverDispatch::new().with_options(SolverOptions::default().with_tolerance(1e-12));

    for solver in [Solver::Direct, Solver::Krylov(KrylovMethod::Gmres)] {
        let (solution, _) = problem
            .solve(&matrix, &rhs, &dispatch, solver, 1)
            .unwrap();
        assert_matrix_eq!(solution, dvector![7.0, 1.0, 5.0, 2.0, 3.0], comp = abs, tol = 1e-8);
    }
}

#[test]
fn inflate_without_support_data_matches_inflate_with_it() {
    let num_cells = 6;
    let mut mesh = create_interval_mesh(0.0, 1.0, num_cells);
    mesh.tag_entities(1, &[0], 1);
    mesh.tag_entities(1, &[4, 5], 2);
    let regions: Regions = [
        Region::new(1, 1).with_boundary_condition(1),
        Region::new(2, 1).with_boundary_condition(2),
    ]
    .into_iter()
    .collect();
    let bcs: BoundaryConditions<f64> = [
        BoundaryCondition::dirichlet(1, -1.0),
        BoundaryCondition::floating(2),
        BoundaryCondition::binary(3, vec![2], vec![3], 0.5),
    ]
    .into_iter()
    .collect();
    let shrink_inflate = ShrinkInflateProblem::new(&mesh, &regions, &bcs);
    let shape_function = LinearSimplexShapeFunction::new(&mesh);
    let matrix = csr(&(laplace_1d(num_cells + 1, 1.0) + DMatrix::identity(num_cells + 1, num_cells + 1)));
    let rhs = linspace(num_cells + 1, 0.0, 1.0);

    let reduced = shape_function.shrink(&matrix, &rhs, &shrink_inflate, 1).unwrap();
    let solution = solve_direct(&reduced.matrix, &reduced.rhs).unwrap();

    let with = shape_function
        .inflate(&solution, &shrink_inflate, Some(&reduced.support_data))
        .unwrap();
    let without = shape_function.inflate(&solution, &shrink_inflate, None).unwrap();
    assert_eq!(with, without);
    assert_eq!(with.len(), num_cells + 1);
    assert_eq!(with[0], -1.0);
    assert_eq!(with[1], -1.0);
    assert!((with[3] - 0.5 * with[2]).abs() < 1e-12);
    assert!((with[4] - with[6]).abs() < 1e-12);
    assert!((with[5] - with[6]).abs() < 1e-12);
}
