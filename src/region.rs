use crate::error::{PyritError, PyritResult};
use crate::{BcId, ExcitationId, MaterialId, RegionId};
use serde::{Deserialize, Serialize};

/// A region of the mesh, living on entities of dimension `dim`.
///
/// A region optionally refers to a material, a boundary condition and an excitation by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub dim: usize,
    pub mat: Option<MaterialId>,
    pub bc: Option<BcId>,
    pub exci: Option<ExcitationId>,
}

impl Region {
    pub fn new(id: RegionId, dim: usize) -> Self {
        Self {
            id,
            dim,
            mat: None,
            bc: None,
            exci: None,
        }
    }

    pub fn with_material(self, mat: MaterialId) -> Self {
        Self { mat: Some(mat), ..self }
    }

    pub fn with_boundary_condition(self, bc: BcId) -> Self {
        Self { bc: Some(bc), ..self }
    }

    pub fn with_excitation(self, exci: ExcitationId) -> Self {
        Self {
            exci: Some(exci),
            ..self
        }
    }
}

/// Ordered collection of regions with lookup by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regions {
    regions: Vec<Region>,
}

impl Regions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region. A region with the same ID is replaced in place.
    pub fn add_region(&mut self, region: Region) {
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(existing) => *existing = region,
            None => self.regions.push(region),
        }
    }

    pub fn get_region(&self, id: RegionId) -> PyritResult<&Region> {
        self.regions
            .iter()
            .find(|r| r.id == id)
            .ok_or(PyritError::RegionNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// IDs of the regions that carry the given boundary condition, in insertion order.
    pub fn regions_with_bc(&self, bc: BcId) -> Vec<RegionId> {
        self.regions
            .iter()
            .filter(|r| r.bc == Some(bc))
            .map(|r| r.id)
            .collect()
    }
}

impl FromIterator<Region> for Regions {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut regions = Regions::new();
        for region in iter {
            regions.add_region(region);
        }
        regions
    }
}

impl<'a> IntoIterator for &'a Regions {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
