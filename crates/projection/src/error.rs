//! Error types for projection parsing and transforms.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// The proj4 string could not be tokenized or a value is not numeric.
    #[error("invalid proj4 string: {0}")]
    InvalidDefinition(String),

    /// The projection or aspect is not implemented.
    #[error("unsupported projection: {0}")]
    Unsupported(String),

    /// The coordinate cannot be projected (e.g. the opposite pole).
    #[error("coordinate outside projection domain: {0}")]
    OutOfDomain(String),

    /// The inverse latitude iteration did not converge.
    #[error("inverse projection did not converge for ({x}, {y})")]
    NoConvergence { x: f64, y: f64 },
}
