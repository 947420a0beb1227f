//! Reprojection of polar stereographic rasters to a regular WGS84 grid.

use radar_common::ExportError;
use tracing::debug;

use crate::geotiff::{GeoRaster, GeoTransform, RasterCrs};

/// Output value for pixels with no source data.
pub const OUTPUT_NODATA: f32 = 0.0;

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    fn expand(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }
}

/// Geographic bounds of a projected raster, found by sampling every pixel
/// corner along its four edges.
pub fn geographic_bounds(src: &GeoRaster) -> Result<GeoBounds, ExportError> {
    let proj = match &src.crs {
        RasterCrs::PolarStereographic(proj) => proj,
        RasterCrs::Wgs84 => {
            return Err(ExportError::InvalidRaster(
                "raster is already geographic".to_string(),
            ))
        }
    };

    let mut bounds = GeoBounds {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    let (w, h) = (src.width as f64, src.height as f64);
    let mut edge = Vec::with_capacity(2 * (src.width + src.height + 2));
    for i in 0..=src.width {
        edge.push((i as f64, 0.0));
        edge.push((i as f64, h));
    }
    for j in 0..=src.height {
        edge.push((0.0, j as f64));
        edge.push((w, j as f64));
    }

    for (col, row) in edge {
        let (x, y) = src.transform.pixel_to_model(col, row);
        let (lon, lat) = proj
            .inverse(x, y)
            .map_err(|e| ExportError::Projection(e.to_string()))?;
        bounds.expand(lon, lat);
    }

    Ok(bounds)
}

/// Reproject a polar stereographic raster to WGS84 with nearest-neighbour
/// sampling.
///
/// Output pixels are square in degrees and the output diagonal spans as many
/// pixels as the source diagonal. Source no-data and pixels outside the
/// source footprint become [`OUTPUT_NODATA`]; the output carries that
/// no-data value.
pub fn warp_to_wgs84(src: &GeoRaster) -> Result<GeoRaster, ExportError> {
    let proj = match &src.crs {
        RasterCrs::PolarStereographic(proj) => proj,
        RasterCrs::Wgs84 => {
            return Err(ExportError::InvalidRaster(
                "raster is already geographic".to_string(),
            ))
        }
    };

    let bounds = geographic_bounds(src)?;

    let src_diagonal = (src.width as f64).hypot(src.height as f64);
    let resolution = bounds.width().hypot(bounds.height()) / src_diagonal;
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(ExportError::InvalidRaster(format!(
            "degenerate geographic extent {:?}",
            bounds
        )));
    }

    let out_width = ((bounds.width() / resolution).round() as usize).max(1);
    let out_height = ((bounds.height() / resolution).round() as usize).max(1);
    let transform = GeoTransform::new(bounds.min_lon, resolution, bounds.max_lat, -resolution);

    debug!(
        src_width = src.width,
        src_height = src.height,
        out_width,
        out_height,
        resolution,
        "Warping raster to WGS84"
    );

    let mut output = vec![OUTPUT_NODATA; out_width * out_height];

    for out_row in 0..out_height {
        for out_col in 0..out_width {
            // Sample at the pixel centre
            let (lon, lat) = transform.pixel_to_model(out_col as f64 + 0.5, out_row as f64 + 0.5);

            let (x, y) = match proj.forward(lon, lat) {
                Ok(xy) => xy,
                Err(_) => continue,
            };
            let (col, row) = src.transform.model_to_pixel(x, y);
            if !(col >= 0.0 && row >= 0.0) {
                continue;
            }

            let Some(value) = src.get(row.floor() as usize, col.floor() as usize) else {
                continue;
            };
            if !src.is_nodata(value) && !value.is_nan() {
                output[out_row * out_width + out_col] = value;
            }
        }
    }

    GeoRaster::new(
        out_width,
        out_height,
        output,
        transform,
        RasterCrs::Wgs84,
        Some(OUTPUT_NODATA),
    )
}
