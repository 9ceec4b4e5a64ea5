use crate::error::{PyritError, PyritResult};
use crate::MaterialId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A material with named scalar properties, e.g. `"conductivity"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub properties: BTreeMap<String, f64>,
}

impl Material {
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    materials: Vec<Material>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a material. A material with the same ID is replaced in place.
    pub fn add_material(&mut self, material: Material) {
        match self.materials.iter_mut().find(|m| m.id == material.id) {
            Some(existing) => *existing = material,
            None => self.materials.push(material),
        }
    }

    pub fn get_material(&self, id: MaterialId) -> PyritResult<&Material> {
        self.materials
            .iter()
            .find(|m| m.id == id)
            .ok_or(PyritError::MaterialNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl FromIterator<Material> for Materials {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        let mut materials = Materials::new();
        for material in iter {
            materials.add_material(material);
        }
        materials
    }
}
