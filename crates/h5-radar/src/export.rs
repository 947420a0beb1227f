use std::path::Path;

use radar_common::RadarResult;
use raster_export::{export_native_frame, ExportSummary};
use tracing::instrument;

use crate::container::RadarContainer;
use crate::store::FrameStore;

impl<C: RadarContainer> FrameStore<C> {
    /// Write one layer as a WGS84 GeoTIFF of raw values.
    ///
    /// Zero cells are tagged no-data. Any existing file at `output` is
    /// replaced.
    #[instrument(skip(self), fields(path = %self.path().display()))]
    pub fn export(&mut self, layer: &str, output: &Path) -> RadarResult<ExportSummary> {
        let array = self.get_layer(layer)?;
        let row_offset = self.metadata().row_offset;

        let summary = export_native_frame(
            array.as_slice(),
            array.rows(),
            array.cols(),
            row_offset,
            output,
        )?;

        Ok(summary)
    }
}
