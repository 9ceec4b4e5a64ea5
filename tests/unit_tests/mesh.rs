use itertools::Itertools;
use nalgebra::{Point1, U1};
use pyrit::mesh::procedural::{create_interval_mesh, create_rectangular_tri_mesh};
use pyrit::mesh::{MeshTopology, TaggedMesh};

#[test]
fn interval_mesh_has_consecutive_segments() {
    let mesh = create_interval_mesh(0.0, 2.0, 4);

    let x: Vec<f64> = mesh.vertices().iter().map(|p| p.x).collect();
    assert_eq!(x, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    assert_eq!(mesh.num_nodes(), 5);
    assert_eq!(mesh.cell_dim(), 1);

    let segments = mesh.entities(1).unwrap();
    assert_eq!(segments.connectivity(), &[vec![0, 1], vec![1, 2], vec![2, 3], vec![3, 4]]);
    assert!(segments.regions().iter().all(Option::is_none));
}

#[test]
fn interval_mesh_without_cells_is_empty() {
    let mesh = create_interval_mesh(0.0, 1.0, 0);
    assert_eq!(mesh.num_nodes(), 0);
    assert_eq!(mesh.cell_dim(), 0);
}

#[test]
fn rectangular_tri_mesh_has_unique_sorted_edges() {
    let mesh = create_rectangular_tri_mesh(2.0, 1.0, 2, 1);

    assert_eq!(mesh.num_nodes(), 6);
    assert_eq!(mesh.cell_dim(), 2);
    assert_eq!(mesh.entities(2).unwrap().len(), 4);

    // 4 horizontal, 3 vertical and 2 diagonal edges
    let edges = mesh.entities(1).unwrap().connectivity();
    assert_eq!(edges.len(), 9);
    assert!(edges.iter().all(|edge| edge[0] < edge[1]));
    assert!(edges.iter().tuple_windows().all(|(a, b)| a < b));
}

#[test]
fn simplex_measures() {
    let mesh = create_rectangular_tri_mesh(2.0_f64, 1.0, 2, 1);

    for triangle in 0..4 {
        assert!((mesh.simplex_measure(2, triangle) - 0.5).abs() < 1e-14);
    }

    let edges = mesh.entities(1).unwrap().connectivity();
    let bottom = edges.iter().position(|edge| edge == &vec![0, 1]).unwrap();
    let diagonal = edges.iter().position(|edge| edge == &vec![0, 4]).unwrap();
    assert!((mesh.simplex_measure(1, bottom) - 1.0).abs() < 1e-14);
    assert!((mesh.simplex_measure(1, diagonal) - 2.0_f64.sqrt()).abs() < 1e-14);
    assert_eq!(mesh.simplex_measure(0, 3), 1.0);
}

#[test]
fn find_entities_by_coordinates() {
    let mesh = create_rectangular_tri_mesh(2.0, 1.0, 2, 1);

    let bottom = mesh.find_entities(1, |points| points.iter().all(|p| p.y == 0.0));
    let connectivity: Vec<_> = bottom
        .iter()
        .map(|&i| mesh.entity_nodes(1, i).to_vec())
        .collect();
    assert_eq!(connectivity, vec![vec![0, 1], vec![1, 2]]);

    let right_nodes = mesh.find_entities(0, |points| points[0].x == 2.0);
    assert_eq!(right_nodes, vec![2, 5]);
}

#[test]
fn nodes_in_region_resolves_each_dimension() {
    let mut mesh = create_rectangular_tri_mesh(2.0, 1.0, 2, 1);
    mesh.tag_nodes(&[5], 1);
    let bottom = mesh.find_entities(1, |points| points.iter().all(|p| p.y == 0.0));
    mesh.tag_entities(1, &bottom, 2);
    // The two triangles of the left square
    mesh.tag_entities(2, &[0, 1], 3);

    assert_eq!(mesh.nodes_in_region(0, 1), vec![5]);
    assert_eq!(mesh.nodes_in_region(1, 2), vec![0, 1, 2]);
    assert_eq!(mesh.nodes_in_region(2, 3), vec![0, 1, 3, 4]);
    assert_eq!(mesh.nodes_in_region(3, 3), Vec::<usize>::new());
    assert_eq!(mesh.entities_in_region(2, 3), vec![0, 1]);

    assert!(mesh.contains_region(1, 2));
    assert!(!mesh.contains_region(2, 2));
    assert!(!mesh.contains_region(0, 4));
}

#[test]
fn with_entities_replaces_previous_entities() {
    let vertices: Vec<_> = (0..3).map(|i| Point1::new(i as f64)).collect();
    let mut mesh: TaggedMesh<f64, U1> = TaggedMesh::from_vertices(vertices).with_entities(1, vec![vec![0, 1]]);
    mesh.tag_entities(1, &[0], 7);
    let mesh = mesh.with_entities(1, vec![vec![0, 1], vec![1, 2]]);

    assert_eq!(mesh.entities(1).unwrap().len(), 2);
    assert!(!mesh.contains_region(1, 7));
}

#[test]
#[should_panic]
fn with_entities_rejects_out_of_bounds_nodes() {
    let vertices = vec![Point1::new(0.0), Point1::new(1.0)];
    let _ = TaggedMesh::<f64, U1>::from_vertices(vertices).with_entities(1, vec![vec![0, 2]]);
}

#[test]
#[should_panic]
fn tag_entities_requires_stored_dimension() {
    let mut mesh = create_interval_mesh(0.0, 1.0, 2);
    mesh.tag_entities(2, &[0], 1);
}

#[test]
fn tagged_mesh_serde_round_trip() {
    let mut mesh = create_rectangular_tri_mesh(1.0, 1.0, 1, 1);
    mesh.tag_entities(2, &[1], 4);
    let json = serde_json::to_string(&mesh).unwrap();
    let restored: TaggedMesh<f64, nalgebra::U2> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, mesh);
}
