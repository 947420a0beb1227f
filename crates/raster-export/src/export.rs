//! Export of a native radar frame to a WGS84 GeoTIFF.
//!
//! The frame is first written as a GeoTIFF on the polar stereographic plane
//! in metres, next to the output file, then read back and warped. The
//! intermediate file is removed on every exit path.

use std::path::{Path, PathBuf};

use projection::PolarStereographic;
use radar_common::ExportError;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::geotiff::{read_geotiff, write_geotiff, GeoRaster, GeoTransform, RasterCrs};
use crate::warp::warp_to_wgs84;

/// Native projection of the composites expressed in metres.
///
/// Used instead of the container's own definition, which is in kilometres.
pub const NATIVE_METRE_PROJ4: &str =
    "+proj=stere +lat_0=90 +lon_0=0 +lat_ts=60 +a=6378140 +b=6356750 +x_0=0 +y_0=0 +units=m";

/// Native grid cell size in metres.
pub const CELL_SIZE_M: f64 = 1000.0;

/// Raw value marking "no precipitation / no data".
pub const NATIVE_NODATA: f32 = 0.0;

/// Shape of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    /// GDAL-order geotransform of the output
    pub geotransform: [f64; 6],
}

/// Build the intermediate raster for a native frame.
///
/// Pixel (0, 0) sits at native `(0, -row_offset * 1000)` metres with
/// 1000 m cells, north up. Value 0 is flagged as no-data.
pub fn native_raster(
    data: &[f32],
    rows: usize,
    cols: usize,
    row_offset: f64,
) -> Result<GeoRaster, ExportError> {
    let proj = PolarStereographic::from_proj4_str(NATIVE_METRE_PROJ4)
        .map_err(|e| ExportError::Projection(e.to_string()))?;

    let transform = GeoTransform::new(0.0, CELL_SIZE_M, -row_offset * CELL_SIZE_M, -CELL_SIZE_M);

    GeoRaster::new(
        cols,
        rows,
        data.to_vec(),
        transform,
        RasterCrs::PolarStereographic(proj),
        Some(NATIVE_NODATA),
    )
}

/// Write a native frame to `output` as a WGS84 GeoTIFF of raw values.
pub fn export_native_frame(
    data: &[f32],
    rows: usize,
    cols: usize,
    row_offset: f64,
    output: &Path,
) -> Result<ExportSummary, ExportError> {
    let native = native_raster(data, rows, cols, row_offset)?;

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropped (and deleted) on every return below
    let intermediate = tempfile::Builder::new()
        .prefix(".native_")
        .suffix(".tif")
        .tempfile_in(dir)?;
    debug!(path = %intermediate.path().display(), "Writing intermediate native raster");

    write_geotiff(intermediate.path(), &native)?;
    let reread = read_geotiff(intermediate.path())?;
    let warped = warp_to_wgs84(&reread)?;
    write_geotiff(output, &warped)?;

    close_intermediate(intermediate)?;

    info!(
        output = %output.display(),
        width = warped.width,
        height = warped.height,
        "Exported frame to GeoTIFF"
    );

    Ok(ExportSummary {
        path: output.to_path_buf(),
        width: warped.width,
        height: warped.height,
        geotransform: warped.transform.to_gdal(),
    })
}

fn close_intermediate(file: NamedTempFile) -> Result<(), ExportError> {
    file.close()?;
    Ok(())
}
