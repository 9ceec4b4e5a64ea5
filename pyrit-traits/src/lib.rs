use nalgebra::RealField;

pub use nalgebra;

/// Scalar type of assembled systems and their boundary data.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
