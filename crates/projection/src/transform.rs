//! Mapping between geographic, native and grid coordinates of a radar frame.
//!
//! The archive's projected y axis points north while rows count downwards from
//! the top edge, which sits `row_offset` units below the pole. The native
//! coordinate used for indexing is therefore:
//!
//! ```text
//! x' = x
//! y' = -row_offset - y
//! ```
//!
//! With one native unit per cell, native and grid coordinates share origin and
//! scale: `col = round(x')`, `row = round(y')`.

use radar_common::{GeoPoint, GridIndex, GridMetadata, NativePoint};

use crate::error::ProjectionResult;
use crate::polar::PolarStereographic;

/// Coordinate transform for one opened container.
///
/// Built once at open time and reused for every query.
#[derive(Debug, Clone)]
pub struct RadarTransform {
    projection: PolarStereographic,
    row_offset: f64,
}

impl RadarTransform {
    pub fn new(projection: PolarStereographic, row_offset: f64) -> Self {
        Self {
            projection,
            row_offset,
        }
    }

    /// Build the transform from container metadata.
    pub fn from_metadata(metadata: &GridMetadata) -> ProjectionResult<Self> {
        let projection = PolarStereographic::from_proj4_str(&metadata.projection)?;
        Ok(Self::new(projection, metadata.row_offset))
    }

    pub fn projection(&self) -> &PolarStereographic {
        &self.projection
    }

    pub fn row_offset(&self) -> f64 {
        self.row_offset
    }

    /// WGS84 (lng, lat) to native coordinates.
    pub fn geo_to_native(&self, lng: f64, lat: f64) -> ProjectionResult<NativePoint> {
        let (x, y) = self.projection.forward(lng, lat)?;
        Ok(NativePoint::new(x, -self.row_offset - y))
    }

    /// Native coordinates to WGS84 (lng, lat).
    pub fn native_to_geo(&self, x: f64, y: f64) -> ProjectionResult<GeoPoint> {
        let y_projected = -y - self.row_offset;
        let (lng, lat) = self.projection.inverse(x, y_projected)?;
        Ok(GeoPoint::new(lng, lat))
    }

    /// Native coordinates to the nearest grid cell.
    ///
    /// Ties round to even (2.5 -> 2, 3.5 -> 4). Non-finite input yields an
    /// index that no grid contains.
    pub fn native_to_grid(&self, x: f64, y: f64) -> GridIndex {
        GridIndex::new(round_coord(y), round_coord(x))
    }

    /// Grid cell to native coordinates.
    pub fn grid_to_native(&self, row: i64, col: i64) -> NativePoint {
        NativePoint::new(col as f64, row as f64)
    }

    /// WGS84 (lng, lat) straight to the nearest grid cell.
    pub fn geo_to_grid(&self, lng: f64, lat: f64) -> ProjectionResult<GridIndex> {
        let native = self.geo_to_native(lng, lat)?;
        Ok(self.native_to_grid(native.x, native.y))
    }
}

fn round_coord(v: f64) -> i64 {
    if v.is_finite() {
        v.round_ties_even() as i64
    } else {
        i64::MIN
    }
}
