//! Point queries: raw values and precipitation rates by grid cell or by
//! geographic coordinate.

use radar_common::{raw_to_mm_per_hour, GridIndex, RadarError, RadarResult};
use tracing::trace;

use crate::container::RadarContainer;
use crate::store::FrameStore;

impl<C: RadarContainer> FrameStore<C> {
    /// Raw value of the cell nearest to a WGS84 point.
    ///
    /// Points the projection cannot represent are reported as `OutOfBounds`.
    pub fn value_at_geo(&mut self, layer: &str, lng: f64, lat: f64) -> RadarResult<f32> {
        let index = self.geo_index(lng, lat)?;
        trace!(layer = %layer, lng, lat, row = index.row, col = index.col, "Geo lookup");
        self.value_at(layer, index)
    }

    /// Raw value of a grid cell.
    pub fn value_at_grid(&mut self, layer: &str, row: i64, col: i64) -> RadarResult<f32> {
        self.value_at(layer, GridIndex::new(row, col))
    }

    /// Rain rate in mm/h at a WGS84 point.
    pub fn rate_at_geo(&mut self, layer: &str, lng: f64, lat: f64) -> RadarResult<f64> {
        self.value_at_geo(layer, lng, lat)
            .map(|raw| raw_to_mm_per_hour(raw as f64))
    }

    /// Rain rate in mm/h at a grid cell.
    pub fn rate_at_grid(&mut self, layer: &str, row: i64, col: i64) -> RadarResult<f64> {
        self.value_at_grid(layer, row, col)
            .map(|raw| raw_to_mm_per_hour(raw as f64))
    }

    fn geo_index(&self, lng: f64, lat: f64) -> RadarResult<GridIndex> {
        self.transform().geo_to_grid(lng, lat).map_err(|_| {
            RadarError::OutOfBounds {
                row: i64::MIN,
                col: i64::MIN,
                rows: self.metadata().num_rows,
                cols: self.metadata().num_columns,
            }
        })
    }

    fn value_at(&mut self, layer: &str, index: GridIndex) -> RadarResult<f32> {
        // Bounds first, so a bad index never triggers a layer read.
        let (row, col) = self.metadata().check_index(index)?;
        let array = self.get_layer(layer)?;
        array.get(row, col).ok_or(RadarError::OutOfBounds {
            row: index.row,
            col: index.col,
            rows: array.rows(),
            cols: array.cols(),
        })
    }
}
