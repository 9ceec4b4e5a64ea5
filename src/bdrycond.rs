//! Boundary conditions and their collection.
use crate::classify::{classify, BoundaryConditionKind, Classification, RegionsOfBc};
use crate::error::{PyritError, PyritResult};
use crate::region::Regions;
use crate::BcId;
use pyrit_traits::Real;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A scalar function of time.
#[derive(Clone)]
pub struct TimeFunction<T>(Arc<dyn Fn(f64) -> T + Send + Sync>);

impl<T> TimeFunction<T> {
    pub fn new(f: impl Fn(f64) -> T + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn evaluate(&self, time: f64) -> T {
        (self.0)(time)
    }
}

impl<T> fmt::Debug for TimeFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TimeFunction(..)")
    }
}

/// The prescribed value of a Dirichlet boundary condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DirichletValue<T> {
    /// The same value on every node.
    Constant(T),
    /// One value per node, in ascending node order.
    PerNode(Vec<T>),
    /// The same value on every node, depending on time.
    #[serde(skip_deserializing, serialize_with = "serialize_time_function")]
    TimeDependent(TimeFunction<T>),
}

fn serialize_time_function<T, S: Serializer>(_: &TimeFunction<T>, _: S) -> Result<S::Ok, S::Error> {
    Err(S::Error::custom("time-dependent Dirichlet values cannot be serialized"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BoundaryCondition<T> {
    /// Prescribes the solution on the nodes of its regions.
    Dirichlet { id: BcId, value: DirichletValue<T> },
    /// Prescribes the flux `g` through its regions.
    Neumann { id: BcId, value: T },
    /// Prescribes `alpha * u + beta * du/dn = value` on its regions.
    Robin { id: BcId, alpha: T, beta: T, value: T },
    /// Constrains all nodes of its regions to share an unknown common value.
    Floating { id: BcId },
    /// Constrains `x[replica] = value * x[primary]` for each pair of nodes.
    Binary {
        id: BcId,
        primary_nodes: Vec<usize>,
        replica_nodes: Vec<usize>,
        value: T,
    },
}

impl<T> BoundaryCondition<T> {
    pub fn id(&self) -> BcId {
        match self {
            Self::Dirichlet { id, .. }
            | Self::Neumann { id, .. }
            | Self::Robin { id, .. }
            | Self::Floating { id }
            | Self::Binary { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> BoundaryConditionKind {
        match self {
            Self::Dirichlet { .. } => BoundaryConditionKind::Dirichlet,
            Self::Neumann { .. } => BoundaryConditionKind::Neumann,
            Self::Robin { .. } => BoundaryConditionKind::Robin,
            Self::Floating { .. } => BoundaryConditionKind::Floating,
            Self::Binary { .. } => BoundaryConditionKind::Binary,
        }
    }
}

impl<T: Real> BoundaryCondition<T> {
    pub fn dirichlet(id: BcId, value: T) -> Self {
        Self::Dirichlet {
            id,
            value: DirichletValue::Constant(value),
        }
    }

    pub fn neumann(id: BcId, value: T) -> Self {
        Self::Neumann { id, value }
    }

    pub fn robin(id: BcId, alpha: T, beta: T, value: T) -> Self {
        Self::Robin { id, alpha, beta, value }
    }

    pub fn floating(id: BcId) -> Self {
        Self::Floating { id }
    }

    pub fn binary(id: BcId, primary_nodes: Vec<usize>, replica_nodes: Vec<usize>, value: T) -> Self {
        Self::Binary {
            id,
            primary_nodes,
            replica_nodes,
            value,
        }
    }

    /// The Dirichlet values on `num_nodes` nodes at the given time.
    ///
    /// Returns `None` if this is not a Dirichlet condition.
    pub fn dirichlet_values(&self, num_nodes: usize, time: f64) -> Option<PyritResult<Vec<T>>> {
        let Self::Dirichlet { id, value } = self else {
            return None;
        };
        let values = match value {
            DirichletValue::Constant(value) => Ok(vec![*value; num_nodes]),
            DirichletValue::TimeDependent(f) => Ok(vec![f.evaluate(time); num_nodes]),
            DirichletValue::PerNode(values) if values.len() == num_nodes => Ok(values.clone()),
            DirichletValue::PerNode(values) => Err(PyritError::DimensionMismatch {
                context: format!("values of Dirichlet boundary condition {}", id),
                expected: num_nodes,
                actual: values.len(),
            }),
        };
        Some(values)
    }
}

/// Ordered collection of boundary conditions.
///
/// Iteration order is insertion order, which decides overlapping Dirichlet conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConditions<T> {
    conditions: Vec<BoundaryCondition<T>>,
    time: f64,
}

impl<T> Default for BoundaryConditions<T> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            time: 0.0,
        }
    }
}

impl<T> BoundaryConditions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a boundary condition. A condition with the same ID is replaced in place.
    pub fn add_bc(&mut self, bc: BoundaryCondition<T>) {
        match self.conditions.iter_mut().find(|c| c.id() == bc.id()) {
            Some(existing) => *existing = bc,
            None => self.conditions.push(bc),
        }
    }

    pub fn get_bc(&self, id: BcId) -> PyritResult<&BoundaryCondition<T>> {
        self.conditions
            .iter()
            .find(|bc| bc.id() == id)
            .ok_or(PyritError::BoundaryConditionNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryCondition<T>> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The time at which time-dependent values are evaluated.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// The IDs of all conditions, grouped by kind.
    pub fn dict_of_boundary_condition(&self) -> Classification {
        classify(&self.conditions)
    }

    /// Maps the ID of every condition to the regions that carry it.
    pub fn regions_of_bc(&self, regions: &Regions) -> RegionsOfBc {
        self.conditions
            .iter()
            .map(|bc| (bc.id(), regions.regions_with_bc(bc.id())))
            .collect()
    }
}

impl<T> FromIterator<BoundaryCondition<T>> for BoundaryConditions<T> {
    fn from_iter<I: IntoIterator<Item = BoundaryCondition<T>>>(iter: I) -> Self {
        let mut conditions = BoundaryConditions::new();
        for bc in iter {
            conditions.add_bc(bc);
        }
        conditions
    }
}

/// Untyped description of a boundary condition, e.g. read from a JSON configuration file.
///
/// ```json
/// { "id": 1, "kind": "dirichlet", "value": [0.0, 1.0] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditionRecord {
    pub id: BcId,
    pub kind: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub primary_nodes: Vec<usize>,
    #[serde(default)]
    pub replica_nodes: Vec<usize>,
}

impl BoundaryConditionRecord {
    fn scalar(&self, name: &str, value: Option<&serde_json::Value>) -> PyritResult<f64> {
        value
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| PyritError::UnsupportedValueType {
                bc: self.id,
                found: format!("{} = {}", name, describe_json(value)),
            })
    }
}

fn describe_json(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => "nothing".to_string(),
        Some(serde_json::Value::Bool(_)) => "boolean".to_string(),
        Some(serde_json::Value::Number(_)) => "number".to_string(),
        Some(serde_json::Value::String(s)) => format!("string \"{}\"", s),
        Some(serde_json::Value::Array(_)) => "array with non-numeric entries".to_string(),
        Some(serde_json::Value::Object(_)) => "object".to_string(),
    }
}

impl TryFrom<BoundaryConditionRecord> for BoundaryCondition<f64> {
    type Error = PyritError;

    fn try_from(record: BoundaryConditionRecord) -> Result<Self, Self::Error> {
        let id = record.id;
        let kind: BoundaryConditionKind = record.kind.parse()?;
        let value = record.value.as_ref();
        let bc = match kind {
            BoundaryConditionKind::Dirichlet => {
                let value = match value {
                    Some(serde_json::Value::Number(n)) => n.as_f64().map(DirichletValue::Constant),
                    Some(serde_json::Value::Array(entries)) => entries
                        .iter()
                        .map(serde_json::Value::as_f64)
                        .collect::<Option<Vec<_>>>()
                        .map(DirichletValue::PerNode),
                    _ => None,
                };
                let value = value.ok_or_else(|| PyritError::UnsupportedValueType {
                    bc: id,
                    found: describe_json(record.value.as_ref()),
                })?;
                BoundaryCondition::Dirichlet { id, value }
            }
            BoundaryConditionKind::Neumann => BoundaryCondition::neumann(id, record.scalar("value", value)?),
            BoundaryConditionKind::Robin => {
                let alpha = record.scalar("alpha", record.alpha.map(serde_json::Value::from).as_ref())?;
                let beta = record.scalar("beta", record.beta.map(serde_json::Value::from).as_ref())?;
                BoundaryCondition::robin(id, alpha, beta, record.scalar("value", value)?)
            }
            BoundaryConditionKind::Floating => BoundaryCondition::floating(id),
            BoundaryConditionKind::Binary => {
                let factor = match value {
                    None => 1.0,
                    Some(_) => record.scalar("value", value)?,
                };
                BoundaryCondition::binary(id, record.primary_nodes, record.replica_nodes, factor)
            }
        };
        Ok(bc)
    }
}

impl BoundaryConditions<f64> {
    pub fn from_records(records: impl IntoIterator<Item = BoundaryConditionRecord>) -> PyritResult<Self> {
        records.into_iter().map(BoundaryCondition::try_from).collect()
    }

    /// Reads boundary conditions from a JSON array of [`BoundaryConditionRecord`]s.
    pub fn from_json(json: &str) -> PyritResult<Self> {
        let records: Vec<BoundaryConditionRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }
}
