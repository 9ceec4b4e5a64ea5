//! Strategies for generating random boundary-condition scenarios.
use crate::bdrycond::{BoundaryCondition, BoundaryConditions};
use crate::excitation::Excitations;
use crate::material::Materials;
use crate::mesh::procedural::create_interval_mesh;
use crate::problem::Problem;
use crate::region::{Region, Regions};
use crate::BcId;
use ::proptest::prelude::*;
use nalgebra::U1;

/// ID of the binary condition of an [`IntervalScenario`], which is not bound to any region.
pub const BINARY_BC_ID: BcId = 1000;

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioCondition {
    Dirichlet(f64),
    Floating,
}

/// Boundary conditions on a uniform mesh of the unit interval.
///
/// Condition `i` is bound to the region with ID `i + 1`, which consists of the segments whose entry
/// in `segment_conditions` is `Some(i)`. Segments of different regions may share a node.
#[derive(Debug, Clone)]
pub struct IntervalScenario {
    pub num_cells: usize,
    pub conditions: Vec<ScenarioCondition>,
    pub segment_conditions: Vec<Option<usize>>,
    pub binary_pairs: Vec<(usize, usize)>,
    pub binary_value: f64,
}

impl IntervalScenario {
    pub fn num_nodes(&self) -> usize {
        self.num_cells + 1
    }

    pub fn to_problem(&self) -> Problem<f64, U1> {
        let mut mesh = create_interval_mesh(0.0, 1.0, self.num_cells);
        for (segment, condition) in self.segment_conditions.iter().enumerate() {
            if let Some(i) = condition {
                mesh.tag_entities(1, &[segment], i + 1);
            }
        }

        let regions: Regions = (0..self.conditions.len())
            .map(|i| Region::new(i + 1, 1).with_boundary_condition(i + 1))
            .collect();

        let mut boundary_conditions: BoundaryConditions<f64> = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, condition)| match condition {
                ScenarioCondition::Dirichlet(value) => BoundaryCondition::dirichlet(i + 1, *value),
                ScenarioCondition::Floating => BoundaryCondition::floating(i + 1),
            })
            .collect();
        if !self.binary_pairs.is_empty() {
            let (primary, replica) = self.binary_pairs.iter().copied().unzip();
            boundary_conditions.add_bc(BoundaryCondition::binary(BINARY_BC_ID, primary, replica, self.binary_value));
        }

        Problem::new(
            "interval scenario",
            mesh,
            regions,
            Materials::new(),
            boundary_conditions,
            Excitations::new(),
        )
    }
}

fn scenario_condition(allow_floating: bool) -> BoxedStrategy<ScenarioCondition> {
    let dirichlet = (-5.0..5.0).prop_map(ScenarioCondition::Dirichlet);
    if allow_floating {
        prop_oneof![dirichlet, Just(ScenarioCondition::Floating)].boxed()
    } else {
        dirichlet.boxed()
    }
}

/// Generates scenarios with up to `max_cells` segments and up to three region-bound conditions.
///
/// Floating conditions and binary node pairs are only generated when allowed.
pub fn interval_scenario(
    max_cells: usize,
    allow_floating: bool,
    allow_binary: bool,
) -> impl Strategy<Value = IntervalScenario> {
    (1..=max_cells, prop::collection::vec(scenario_condition(allow_floating), 0..=3))
        .prop_flat_map(move |(num_cells, conditions)| {
            let num_conditions = conditions.len();
            let segment_condition = if num_conditions == 0 {
                Just(None).boxed()
            } else {
                prop::option::of(0..num_conditions).boxed()
            };
            let binary_pairs = if allow_binary {
                prop::collection::vec((0..=num_cells, 0..=num_cells), 0..=2).boxed()
            } else {
                Just(Vec::new()).boxed()
            };
            (
                Just(num_cells),
                Just(conditions),
                prop::collection::vec(segment_condition, num_cells),
                binary_pairs,
                -2.0..2.0,
            )
        })
        .prop_map(
            |(num_cells, conditions, segment_conditions, binary_pairs, binary_value)| IntervalScenario {
                num_cells,
                conditions,
                segment_conditions,
                binary_pairs,
                binary_value,
            },
        )
}
