use crate::error::{PyritError, PyritResult};
use crate::ExcitationId;
use serde::{Deserialize, Serialize};

/// A source term that is constant over its region, e.g. a charge or current density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excitation {
    pub id: ExcitationId,
    pub value: f64,
}

impl Excitation {
    pub fn new(id: ExcitationId, value: f64) -> Self {
        Self { id, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Excitations {
    excitations: Vec<Excitation>,
}

impl Excitations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an excitation. An excitation with the same ID is replaced in place.
    pub fn add_excitation(&mut self, excitation: Excitation) {
        match self.excitations.iter_mut().find(|e| e.id == excitation.id) {
            Some(existing) => *existing = excitation,
            None => self.excitations.push(excitation),
        }
    }

    pub fn get_exci(&self, id: ExcitationId) -> PyritResult<&Excitation> {
        self.excitations
            .iter()
            .find(|e| e.id == id)
            .ok_or(PyritError::ExcitationNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Excitation> {
        self.excitations.iter()
    }

    pub fn len(&self) -> usize {
        self.excitations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excitations.is_empty()
    }
}

impl FromIterator<Excitation> for Excitations {
    fn from_iter<I: IntoIterator<Item = Excitation>>(iter: I) -> Self {
        let mut excitations = Excitations::new();
        for excitation in iter {
            excitations.add_excitation(excitation);
        }
        excitations
    }
}
