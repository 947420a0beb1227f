//! Coordinate representations and grid metadata for radar frames.
//!
//! The same physical location can be expressed three ways:
//! - [`GeoPoint`]: WGS84 longitude/latitude in degrees
//! - [`NativePoint`]: the radar's projected coordinates, with the row offset
//!   already applied so that `y` grows downwards with the row index
//! - [`GridIndex`]: integer row/column into a frame

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};

/// Geographic coordinate in degrees, longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Native grid coordinate (one unit per grid cell).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativePoint {
    pub x: f64,
    pub y: f64,
}

impl NativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Row/column index into a frame.
///
/// Signed so that points left of or above the grid survive rounding and can be
/// rejected by the bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub row: i64,
    pub col: i64,
}

impl GridIndex {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }
}

/// Immutable grid description read once when a container is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMetadata {
    /// Vertical shift between projected y and the row origin (native units)
    pub row_offset: f64,
    /// Number of columns (x direction)
    pub num_columns: usize,
    /// Number of rows (y direction)
    pub num_rows: usize,
    /// proj4 parameter string of the native projection
    pub projection: String,
}

impl GridMetadata {
    /// Build metadata from the loosely-typed values stored in a container.
    ///
    /// Counts arrive as floating point in some products, so they are accepted
    /// as `f64` and must be non-negative whole numbers.
    pub fn from_raw(
        row_offset: f64,
        num_columns: f64,
        num_rows: f64,
        projection: impl Into<String>,
    ) -> RadarResult<Self> {
        if !row_offset.is_finite() || row_offset < 0.0 {
            return Err(RadarError::corrupt(
                "geographic",
                format!("geo_row_offset must be a non-negative number, got {}", row_offset),
            ));
        }

        let num_columns = whole_count("geo_number_columns", num_columns)?;
        let num_rows = whole_count("geo_number_rows", num_rows)?;

        Ok(Self {
            row_offset,
            num_columns,
            num_rows,
            projection: projection.into(),
        })
    }

    /// Check a grid index against the dimensions.
    ///
    /// Returns the unsigned `(row, col)` pair when it is inside
    /// `[0, num_rows) x [0, num_columns)`.
    pub fn check_index(&self, index: GridIndex) -> RadarResult<(usize, usize)> {
        let in_rows = index.row >= 0 && (index.row as u64) < self.num_rows as u64;
        let in_cols = index.col >= 0 && (index.col as u64) < self.num_columns as u64;

        if !(in_rows && in_cols) {
            return Err(RadarError::OutOfBounds {
                row: index.row,
                col: index.col,
                rows: self.num_rows,
                cols: self.num_columns,
            });
        }

        Ok((index.row as usize, index.col as usize))
    }

    /// Total number of cells in one frame.
    pub fn len(&self) -> usize {
        self.num_rows * self.num_columns
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0 || self.num_columns == 0
    }
}

fn whole_count(name: &str, value: f64) -> RadarResult<usize> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(RadarError::corrupt(
            "geographic",
            format!("{} must be a non-negative integer, got {}", name, value),
        ));
    }
    Ok(value as usize)
}
