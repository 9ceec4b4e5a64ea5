//! Mesh topology as seen by the boundary-condition reduction.
//!
//! The reduction only needs to know which nodes belong to a region. Regions are attached to
//! entities of a given dimension: nodes (dimension 0), edges (1), faces (2) or cells (3).
use crate::RegionId;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DefaultAllocator, DimName, OPoint, Scalar};
use pyrit_traits::Real;
use serde::{Deserialize, Serialize};

pub mod procedural;

/// Topological queries on a mesh whose entities are tagged with regions.
pub trait MeshTopology {
    fn num_nodes(&self) -> usize;

    /// The dimension of the highest-dimensional entities stored in the mesh.
    fn cell_dim(&self) -> usize;

    /// The region tag of every node.
    fn node_regions(&self) -> &[Option<RegionId>];

    /// The region tags of all entities of dimension `dim >= 1`.
    ///
    /// Returns `None` if the mesh stores no entities of the given dimension.
    fn entity_regions(&self, dim: usize) -> Option<&[Option<RegionId>]>;

    /// The node indices of the entity with the given index and dimension `dim >= 1`.
    fn entity_nodes(&self, dim: usize, index: usize) -> &[usize];

    /// Indices of the entities of dimension `dim` that are tagged with `region`.
    ///
    /// For `dim == 0` the entity indices are node indices.
    fn entities_in_region(&self, dim: usize, region: RegionId) -> Vec<usize> {
        let tags = if dim == 0 {
            Some(self.node_regions())
        } else {
            self.entity_regions(dim)
        };
        tags.map(|tags| {
            tags.iter()
                .enumerate()
                .filter(|(_, tag)| **tag == Some(region))
                .map(|(index, _)| index)
                .collect()
        })
        .unwrap_or_default()
    }

    /// The sorted, unique indices of all nodes that belong to entities of dimension `dim` tagged
    /// with `region`.
    fn nodes_in_region(&self, dim: usize, region: RegionId) -> Vec<usize> {
        let entities = self.entities_in_region(dim, region);
        if dim == 0 {
            return entities;
        }
        let mut nodes: Vec<usize> = entities
            .into_iter()
            .flat_map(|index| self.entity_nodes(dim, index).iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Whether any entity of dimension `dim` is tagged with `region`.
    fn contains_region(&self, dim: usize, region: RegionId) -> bool {
        let tags = if dim == 0 {
            Some(self.node_regions())
        } else {
            self.entity_regions(dim)
        };
        tags.map_or(false, |tags| tags.contains(&Some(region)))
    }
}

/// Entities of a single dimension together with their region tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedEntities {
    connectivity: Vec<Vec<usize>>,
    regions: Vec<Option<RegionId>>,
}

impl TaggedEntities {
    pub fn connectivity(&self) -> &[Vec<usize>] {
        &self.connectivity
    }

    pub fn regions(&self) -> &[Option<RegionId>] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.connectivity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectivity.is_empty()
    }
}

/// A simplicial mesh with region tags on its nodes and on entities of every dimension.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct TaggedMesh<T: Scalar, D>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    #[serde(bound(
        serialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Serialize",
        deserialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Deserialize<'de>"
    ))]
    vertices: Vec<OPoint<T, D>>,
    node_regions: Vec<Option<RegionId>>,
    /// Entities of dimension `d` are stored at index `d - 1`.
    entities: Vec<TaggedEntities>,
}

impl<T, D> TaggedMesh<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Constructs a mesh consisting only of (untagged) nodes.
    pub fn from_vertices(vertices: Vec<OPoint<T, D>>) -> Self {
        let node_regions = vec![None; vertices.len()];
        Self {
            vertices,
            node_regions,
            entities: Vec::new(),
        }
    }

    /// Stores the entities of dimension `dim`, replacing any previously stored ones.
    ///
    /// All entities start out untagged.
    ///
    /// # Panics
    ///
    /// Panics if `dim` is zero or if any entity refers to a node that does not exist.
    pub fn with_entities(mut self, dim: usize, connectivity: Vec<Vec<usize>>) -> Self {
        assert!(dim > 0, "Entities of dimension 0 are the nodes themselves.");
        let num_nodes = self.vertices.len();
        assert!(
            connectivity.iter().flatten().all(|&node| node < num_nodes),
            "Entity connectivity refers to a node index out of bounds."
        );
        if self.entities.len() < dim {
            self.entities.resize_with(dim, TaggedEntities::default);
        }
        let regions = vec![None; connectivity.len()];
        self.entities[dim - 1] = TaggedEntities { connectivity, regions };
        self
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    /// The entities of dimension `dim >= 1`, if any are stored.
    pub fn entities(&self, dim: usize) -> Option<&TaggedEntities> {
        dim.checked_sub(1).and_then(|i| self.entities.get(i))
    }

    /// Tags the given nodes with `region`.
    ///
    /// # Panics
    ///
    /// Panics if any node index is out of bounds.
    pub fn tag_nodes(&mut self, nodes: &[usize], region: RegionId) {
        for &node in nodes {
            self.node_regions[node] = Some(region);
        }
    }

    /// Tags the given entities of dimension `dim` with `region`. For `dim == 0` this is equivalent
    /// to [`tag_nodes`](Self::tag_nodes).
    ///
    /// # Panics
    ///
    /// Panics if no entities of dimension `dim` are stored or if an index is out of bounds.
    pub fn tag_entities(&mut self, dim: usize, indices: &[usize], region: RegionId) {
        if dim == 0 {
            return self.tag_nodes(indices, region);
        }
        let entities = self
            .entities
            .get_mut(dim - 1)
            .unwrap_or_else(|| panic!("Mesh stores no entities of dimension {}.", dim));
        for &index in indices {
            entities.regions[index] = Some(region);
        }
    }

    /// Finds the entities of dimension `dim` whose vertices satisfy the given predicate.
    pub fn find_entities(&self, dim: usize, mut predicate: impl FnMut(&[OPoint<T, D>]) -> bool) -> Vec<usize> {
        let mut points = Vec::new();
        if dim == 0 {
            return (0..self.vertices.len())
                .filter(|&i| predicate(std::slice::from_ref(&self.vertices[i])))
                .collect();
        }
        let Some(entities) = self.entities(dim) else {
            return Vec::new();
        };
        entities
            .connectivity
            .iter()
            .enumerate()
            .filter_map(|(index, nodes)| {
                points.clear();
                points.extend(nodes.iter().map(|&node| self.vertices[node].clone()));
                predicate(&points).then_some(index)
            })
            .collect()
    }
}

impl<T, D> TaggedMesh<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// The measure (length, area or volume) of a simplex entity of dimension `dim`.
    ///
    /// Computed as `sqrt(det(E^T E)) / k!` where the columns of `E` are the edge vectors
    /// emanating from the first vertex. Nodes have unit measure.
    pub fn simplex_measure(&self, dim: usize, index: usize) -> T {
        if dim == 0 {
            return T::one();
        }
        let nodes = self.entity_nodes(dim, index);
        let k = nodes.len() - 1;
        let origin = &self.vertices[nodes[0]];
        let edges = DMatrix::from_fn(D::dim(), k, |r, c| self.vertices[nodes[c + 1]][r] - origin[r]);
        let gram = edges.transpose() * &edges;
        let factorial: T = nalgebra::convert((1..=k).product::<usize>() as f64);
        gram.determinant().max(T::zero()).sqrt() / factorial
    }
}

impl<T, D> MeshTopology for TaggedMesh<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    fn cell_dim(&self) -> usize {
        self.entities
            .iter()
            .rposition(|entities| !entities.is_empty())
            .map_or(0, |i| i + 1)
    }

    fn node_regions(&self) -> &[Option<RegionId>] {
        &self.node_regions
    }

    fn entity_regions(&self, dim: usize) -> Option<&[Option<RegionId>]> {
        self.entities(dim).map(|entities| entities.regions.as_slice())
    }

    fn entity_nodes(&self, dim: usize, index: usize) -> &[usize] {
        &self.entities[dim - 1].connectivity[index]
    }
}
