//! Coordinate reference system transformations for radar grids.
//!
//! Implements the polar stereographic projection from scratch without
//! external dependencies, plus the mapping between projected coordinates and
//! the row/column lattice of a radar frame.

pub mod error;
pub mod polar;
pub mod proj4;
pub mod transform;

pub use error::{ProjectionError, ProjectionResult};
pub use polar::PolarStereographic;
pub use proj4::Proj4Params;
pub use transform::RadarTransform;
