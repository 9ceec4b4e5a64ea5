//! A complete problem description: mesh, regions, materials, boundary conditions and excitations.
use crate::bdrycond::BoundaryConditions;
use crate::error::{PyritError, PyritResult};
use crate::excitation::Excitations;
use crate::material::Materials;
use crate::mesh::{MeshTopology, TaggedMesh};
use crate::region::Regions;
use crate::shapefunction::{
    LinearSimplexShapeFunction, NodalShapeFunction, ReducedSystem, ShrinkInflateProblem, SupportData,
};
use crate::solver::{SolveInfo, Solver, SolverDispatch};
use crate::{BcId, ExcitationId, MaterialId, RegionId};
use log::{debug, info, warn};
use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DefaultAllocator, DimName, Scalar};
use nalgebra_sparse::CsrMatrix;
use pyrit_traits::Real;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Names of the attributes of a [`Problem`] that can be excluded when saving.
pub const ATTRIBUTES: [&str; 6] = [
    "description",
    "mesh",
    "regions",
    "materials",
    "boundary_conditions",
    "excitations",
];

/// An inconsistency between regions and the objects they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyIssue {
    MissingMaterial { region: RegionId, material: MaterialId },
    MissingBoundaryCondition { region: RegionId, bc: BcId },
    MissingExcitation { region: RegionId, excitation: ExcitationId },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMaterial { region, material } => {
                write!(f, "region {} refers to material {}, which does not exist", region, material)
            }
            Self::MissingBoundaryCondition { region, bc } => {
                write!(f, "region {} refers to boundary condition {}, which does not exist", region, bc)
            }
            Self::MissingExcitation { region, excitation } => {
                write!(f, "region {} refers to excitation {}, which does not exist", region, excitation)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Problem<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub description: String,
    pub mesh: TaggedMesh<T, D>,
    pub regions: Regions,
    pub materials: Materials,
    pub boundary_conditions: BoundaryConditions<T>,
    pub excitations: Excitations,
}

impl<T, D> Problem<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(
        description: impl Into<String>,
        mesh: TaggedMesh<T, D>,
        regions: Regions,
        materials: Materials,
        boundary_conditions: BoundaryConditions<T>,
        excitations: Excitations,
    ) -> Self {
        Self {
            description: description.into(),
            mesh,
            regions,
            materials,
            boundary_conditions,
            excitations,
        }
    }

    pub fn shrink_inflate_problem(&self) -> ShrinkInflateProblem<'_, T> {
        ShrinkInflateProblem::new(&self.mesh, &self.regions, &self.boundary_conditions)
    }

    pub fn shape_function(&self) -> LinearSimplexShapeFunction<'_, T, D> {
        LinearSimplexShapeFunction::new(&self.mesh)
    }

    /// Reports regions that refer to materials, boundary conditions or excitations that do not
    /// exist. The findings are logged as warnings and returned.
    pub fn consistency_check(&self) -> Vec<ConsistencyIssue> {
        info!("Checking consistency of problem '{}'", self.description);
        let mut issues = Vec::new();
        for region in &self.regions {
            if let Some(material) = region.mat {
                if self.materials.get_material(material).is_err() {
                    issues.push(ConsistencyIssue::MissingMaterial {
                        region: region.id,
                        material,
                    });
                }
            }
            if let Some(bc) = region.bc {
                if self.boundary_conditions.get_bc(bc).is_err() {
                    issues.push(ConsistencyIssue::MissingBoundaryCondition { region: region.id, bc });
                }
            }
            if let Some(excitation) = region.exci {
                if self.excitations.get_exci(excitation).is_err() {
                    issues.push(ConsistencyIssue::MissingExcitation {
                        region: region.id,
                        excitation,
                    });
                }
            }
        }
        for issue in &issues {
            warn!("Consistency check: {}", issue);
        }
        info!("Consistency check finished with {} finding(s)", issues.len());
        issues
    }

    /// Returns the IDs of regions that tag no mesh entity of their dimension.
    pub fn check_regions_in_mesh(&self) -> Vec<RegionId> {
        let missing: Vec<RegionId> = self
            .regions
            .iter()
            .filter(|region| !self.mesh.contains_region(region.dim, region.id))
            .map(|region| region.id)
            .collect();
        for id in &missing {
            warn!("Region {} does not appear in the mesh", id);
        }
        missing
    }

    /// Applies the boundary conditions to the assembled system.
    pub fn shrink(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        integration_order: usize,
    ) -> PyritResult<ReducedSystem<T>> {
        self.shape_function()
            .shrink(matrix, rhs, &self.shrink_inflate_problem(), integration_order)
    }

    /// Maps the solution of a reduced system back to the mesh nodes.
    pub fn inflate(&self, solution: &DVector<T>, support_data: Option<&SupportData<T>>) -> PyritResult<DVector<T>> {
        self.shape_function()
            .inflate(solution, &self.shrink_inflate_problem(), support_data)
    }

    /// Shrinks, solves and inflates the assembled system.
    pub fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        dispatch: &SolverDispatch<T>,
        solver: Solver,
        integration_order: usize,
    ) -> PyritResult<(DVector<T>, SolveInfo<T>)> {
        let reduced = self.shrink(matrix, rhs, integration_order)?;
        debug!(
            "Reduced system of size {} to {}",
            rhs.len(),
            reduced.rhs.len()
        );
        let (solution, info) = dispatch.solve(&reduced.matrix, &reduced.rhs, solver)?;
        let solution = self.inflate(&solution, Some(&reduced.support_data))?;
        Ok((solution, info))
    }

    /// Writes the problem to a single binary file and returns its path.
    ///
    /// The extension of `path` is replaced by `bin` and missing parent directories are created.
    /// Attributes named in `ignore_attributes` (see [`ATTRIBUTES`]) are not saved.
    pub fn save(&self, path: impl AsRef<Path>, ignore_attributes: &[&str]) -> PyritResult<PathBuf>
    where
        ProblemSnapshot<T, D>: Serialize,
    {
        let path = path.as_ref().with_extension("bin");
        for name in ignore_attributes {
            if !ATTRIBUTES.iter().any(|attribute| attribute == name) {
                warn!("Cannot ignore unknown attribute '{}' when saving", name);
            }
        }
        let keep = |name: &str| !ignore_attributes.iter().any(|ignored| *ignored == name);
        let snapshot = ProblemSnapshot {
            description: keep("description").then(|| self.description.clone()),
            mesh: keep("mesh").then(|| self.mesh.clone()),
            regions: keep("regions").then(|| self.regions.clone()),
            materials: keep("materials").then(|| self.materials.clone()),
            boundary_conditions: keep("boundary_conditions").then(|| self.boundary_conditions.clone()),
            excitations: keep("excitations").then(|| self.excitations.clone()),
        };
        let bytes = bincode::serialize(&snapshot)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, bytes)?;
        info!("Saved problem '{}' to {}", self.description, path.display());
        Ok(path)
    }

    /// Reads a problem written by [`save`](Self::save).
    ///
    /// The extension of `path` is replaced by `bin`.
    pub fn load(path: impl AsRef<Path>) -> PyritResult<ProblemSnapshot<T, D>>
    where
        ProblemSnapshot<T, D>: DeserializeOwned,
    {
        let path = path.as_ref().with_extension("bin");
        let bytes = fs::read(&path)?;
        let snapshot: ProblemSnapshot<T, D> = bincode::deserialize(&bytes)?;
        info!("Loaded problem from {}", path.display());
        Ok(snapshot)
    }
}

/// The saved state of a [`Problem`]. Attributes excluded when saving are `None`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct ProblemSnapshot<T: Scalar, D>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub description: Option<String>,
    #[serde(bound(
        serialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Serialize",
        deserialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Deserialize<'de>"
    ))]
    pub mesh: Option<TaggedMesh<T, D>>,
    pub regions: Option<Regions>,
    pub materials: Option<Materials>,
    pub boundary_conditions: Option<BoundaryConditions<T>>,
    pub excitations: Option<Excitations>,
}

fn required<A>(attribute: Option<A>, name: &str) -> PyritResult<A> {
    attribute.ok_or_else(|| PyritError::MissingAttribute(name.to_string()))
}

impl<T, D> ProblemSnapshot<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Restores the problem. Fails if any attribute was excluded when saving.
    pub fn into_problem(self) -> PyritResult<Problem<T, D>> {
        Ok(Problem {
            description: required(self.description, "description")?,
            mesh: required(self.mesh, "mesh")?,
            regions: required(self.regions, "regions")?,
            materials: required(self.materials, "materials")?,
            boundary_conditions: required(self.boundary_conditions, "boundary_conditions")?,
            excitations: required(self.excitations, "excitations")?,
        })
    }
}
