//! GeoTIFF export of radar frames.
//!
//! A frame on the native polar stereographic grid is written to an
//! intermediate GeoTIFF in metres, then warped onto a regular WGS84 grid
//! with nearest-neighbour sampling. Zero is the no-data value throughout.

pub mod export;
pub mod geotiff;
pub mod warp;

pub use export::{export_native_frame, native_raster, ExportSummary, NATIVE_METRE_PROJ4};
pub use geotiff::{read_geotiff, write_geotiff, GeoRaster, GeoTransform, RasterCrs};
pub use warp::{geographic_bounds, warp_to_wgs84, GeoBounds, OUTPUT_NODATA};
