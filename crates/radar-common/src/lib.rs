//! Common types and utilities shared across the radar precipitation crates.

pub mod error;
pub mod grid;
pub mod time;
pub mod units;

pub use error::{ExportError, RadarError, RadarResult};
pub use grid::{GeoPoint, GridIndex, GridMetadata, NativePoint};
pub use time::{parse_iso8601, parse_valid_time, TimeParseError};
pub use units::raw_to_mm_per_hour;
