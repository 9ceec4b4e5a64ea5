//! Error types of the shrink/inflate pipeline and its collaborators.
use crate::{BcId, ExcitationId, MaterialId, RegionId};
use thiserror::Error;

pub type PyritResult<T> = std::result::Result<T, PyritError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PyritError {
    #[error("boundary condition kind '{0}' is not supported")]
    UnsupportedBoundaryConditionKind(String),

    #[error("value of Dirichlet boundary condition {bc} has unsupported type: {found}")]
    UnsupportedValueType { bc: BcId, found: String },

    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch { context: String, expected: usize, actual: usize },

    #[error("index {index} is out of bounds for a system of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("system shapes do not match: matrix is {nrows}x{ncols}, right-hand side has length {rhs_len}")]
    ShapeMismatch { nrows: usize, ncols: usize, rhs_len: usize },

    #[error("region with ID {0} not found")]
    RegionNotFound(RegionId),

    #[error("boundary condition with ID {0} not found")]
    BoundaryConditionNotFound(BcId),

    #[error("material with ID {0} not found")]
    MaterialNotFound(MaterialId),

    #[error("excitation with ID {0} not found")]
    ExcitationNotFound(ExcitationId),

    #[error("invalid boundary condition record: {0}")]
    InvalidRecord(#[from] serde_json::Error),

    #[error("failed to compute boundary terms: {0}")]
    BoundaryTerms(eyre::Report),

    #[error("solver '{0}' not known")]
    SolverUnknown(String),

    #[error("solver '{0}' is not available")]
    SolverUnavailable(String),

    #[error("system matrix is singular")]
    SingularMatrix,

    #[error("iterative solver '{solver}' failed: {message}")]
    IterativeSolve { solver: String, message: String },

    #[error("custom solver failed: {0}")]
    CustomSolver(eyre::Report),

    #[error("attribute '{0}' was not saved and cannot be restored")]
    MissingAttribute(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}
