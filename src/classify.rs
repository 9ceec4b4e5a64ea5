//! Classification of boundary conditions by kind and resolution of their node sets.
use crate::bdrycond::BoundaryCondition;
use crate::error::{PyritError, PyritResult};
use crate::mesh::MeshTopology;
use crate::region::Regions;
use crate::{BcId, RegionId};
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoundaryConditionKind {
    Dirichlet,
    Neumann,
    Robin,
    Floating,
    Binary,
}

impl BoundaryConditionKind {
    pub const ALL: [Self; 5] = [
        Self::Dirichlet,
        Self::Neumann,
        Self::Robin,
        Self::Floating,
        Self::Binary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dirichlet => "dirichlet",
            Self::Neumann => "neumann",
            Self::Robin => "robin",
            Self::Floating => "floating",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for BoundaryConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BoundaryConditionKind {
    type Err = PyritError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowercase = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lowercase)
            .ok_or_else(|| PyritError::UnsupportedBoundaryConditionKind(s.to_string()))
    }
}

/// The IDs of all boundary conditions, grouped by kind in iteration order.
///
/// Every kind is present; kinds without conditions have an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub dirichlet: Vec<BcId>,
    pub neumann: Vec<BcId>,
    pub robin: Vec<BcId>,
    pub floating: Vec<BcId>,
    pub binary: Vec<BcId>,
}

impl Classification {
    pub fn get(&self, kind: BoundaryConditionKind) -> &[BcId] {
        match kind {
            BoundaryConditionKind::Dirichlet => &self.dirichlet,
            BoundaryConditionKind::Neumann => &self.neumann,
            BoundaryConditionKind::Robin => &self.robin,
            BoundaryConditionKind::Floating => &self.floating,
            BoundaryConditionKind::Binary => &self.binary,
        }
    }

    fn get_mut(&mut self, kind: BoundaryConditionKind) -> &mut Vec<BcId> {
        match kind {
            BoundaryConditionKind::Dirichlet => &mut self.dirichlet,
            BoundaryConditionKind::Neumann => &mut self.neumann,
            BoundaryConditionKind::Robin => &mut self.robin,
            BoundaryConditionKind::Floating => &mut self.floating,
            BoundaryConditionKind::Binary => &mut self.binary,
        }
    }

    /// Whether at least one condition of the given kind exists.
    pub fn has(&self, kind: BoundaryConditionKind) -> bool {
        !self.get(kind).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoundaryConditionKind, &[BcId])> {
        BoundaryConditionKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.get(kind)))
    }
}

/// Groups the IDs of the given boundary conditions by kind.
pub fn classify<'a, T: 'a>(conditions: impl IntoIterator<Item = &'a BoundaryCondition<T>>) -> Classification {
    let mut classification = Classification::default();
    for bc in conditions {
        classification.get_mut(bc.kind()).push(bc.id());
    }
    classification
}

/// Maps every boundary condition ID to the regions that carry it.
pub type RegionsOfBc = FxHashMap<BcId, Vec<RegionId>>;

/// IDs of the regions bound to the given boundary condition.
pub fn regions_of(bc: BcId, regions_of_bc: &RegionsOfBc) -> &[RegionId] {
    regions_of_bc.get(&bc).map(Vec::as_slice).unwrap_or(&[])
}

/// The sorted, unique node indices of all given regions.
///
/// Each region is resolved at its own dimension: nodes tagged directly for dimension 0, and the
/// nodes of the tagged edges, faces or volumes otherwise.
pub fn nodes_of_regions(
    mesh: &dyn MeshTopology,
    regions: &Regions,
    region_ids: &[RegionId],
) -> PyritResult<Vec<usize>> {
    let mut nodes = Vec::new();
    for &id in region_ids {
        let region = regions.get_region(id)?;
        nodes.extend(mesh.nodes_in_region(region.dim, id));
    }
    Ok(nodes.into_iter().sorted_unstable().dedup().collect())
}

/// The nodes affected by the boundary condition `bc`, resolved over all regions carrying it.
pub fn nodes_of_bc(
    bc: BcId,
    mesh: &dyn MeshTopology,
    regions: &Regions,
    regions_of_bc: &RegionsOfBc,
) -> PyritResult<Vec<usize>> {
    nodes_of_regions(mesh, regions, regions_of(bc, regions_of_bc))
}
