//! Basic procedural mesh generation routines.
use crate::mesh::TaggedMesh;
use nalgebra::{convert, Point1, Point2, U1, U2};
use pyrit_traits::Real;
use std::collections::BTreeSet;

/// Generates a uniform mesh of the interval `[start, end]` with `num_cells` line segments.
///
/// The nodes are numbered from left to right and segment `i` connects nodes `i` and `i + 1`.
pub fn create_interval_mesh<T: Real>(start: T, end: T, num_cells: usize) -> TaggedMesh<T, U1> {
    if num_cells == 0 {
        return TaggedMesh::from_vertices(Vec::new());
    }
    let h = (end - start) / convert(num_cells as f64);
    let vertices = (0..=num_cells)
        .map(|i| Point1::new(start + h * convert(i as f64)))
        .collect();
    let segments = (0..num_cells).map(|i| vec![i, i + 1]).collect();
    TaggedMesh::from_vertices(vertices).with_entities(1, segments)
}

/// Generates a uniform triangle mesh of the rectangle `[0, width] x [0, height]`.
///
/// The rectangle is divided into `cells_x * cells_y` squares, each split into two triangles. Node
/// `(i, j)` is located at index `j * (cells_x + 1) + i`. Besides the triangles, the mesh stores
/// all unique edges (sorted by their node indices) as entities of dimension 1.
pub fn create_rectangular_tri_mesh<T: Real>(width: T, height: T, cells_x: usize, cells_y: usize) -> TaggedMesh<T, U2> {
    if cells_x == 0 || cells_y == 0 {
        return TaggedMesh::from_vertices(Vec::new());
    }
    let hx = width / convert(cells_x as f64);
    let hy = height / convert(cells_y as f64);
    let to_global_vertex_index = |i, j| (cells_x + 1) * j + i;

    let mut vertices = Vec::with_capacity((cells_x + 1) * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            let x = hx * convert(i as f64);
            let y = hy * convert(j as f64);
            vertices.push(Point2::new(x, y));
        }
    }

    let mut triangles = Vec::with_capacity(2 * cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let v00 = to_global_vertex_index(i, j);
            let v10 = to_global_vertex_index(i + 1, j);
            let v01 = to_global_vertex_index(i, j + 1);
            let v11 = to_global_vertex_index(i + 1, j + 1);
            triangles.push(vec![v00, v10, v11]);
            triangles.push(vec![v00, v11, v01]);
        }
    }

    let edges: BTreeSet<[usize; 2]> = triangles
        .iter()
        .flat_map(|tri| [[tri[0], tri[1]], [tri[1], tri[2]], [tri[2], tri[0]]])
        .map(|[a, b]| [a.min(b), a.max(b)])
        .collect();
    let edges = edges.into_iter().map(Vec::from).collect();

    TaggedMesh::from_vertices(vertices)
        .with_entities(1, edges)
        .with_entities(2, triangles)
}
