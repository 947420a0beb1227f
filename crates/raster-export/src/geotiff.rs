//! Single-band Float32 GeoTIFF writer and reader.
//!
//! Georeferencing uses the GeoTIFF 1.0 tags:
//! - ModelPixelScale (33550) and ModelTiepoint (33922) for the affine transform
//! - GeoKeyDirectory (34735), GeoDoubleParams (34736), GeoAsciiParams (34737)
//!   for the coordinate reference system
//! - GDAL_NODATA (42113) for the no-data value
//!
//! Two CRS kinds are supported: WGS84 geographic (EPSG:4326) and a
//! user-defined polar stereographic projection. The proj4 definition of the
//! latter is kept in the PCS citation so it reads back exactly.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use projection::PolarStereographic;
use radar_common::ExportError;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GEO_DOUBLE_PARAMS: u16 = 34736;
const TAG_GEO_ASCII_PARAMS: u16 = 34737;
const TAG_GDAL_NODATA: u16 = 42113;

/// Tag for a GeoTIFF tag id, as the decoder stores it (named variant when
/// the id is known).
fn geo_tag(id: u16) -> Tag {
    Tag::from_u16_exhaustive(id)
}

// GeoKey ids
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_CITATION: u16 = 2049;
const GEOG_GEODETIC_DATUM: u16 = 2050;
const GEOG_ANGULAR_UNITS: u16 = 2054;
const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
const GEOG_SEMI_MINOR_AXIS: u16 = 2058;
const PROJECTED_CS_TYPE: u16 = 3072;
const PCS_CITATION: u16 = 3073;
const PROJECTION: u16 = 3074;
const PROJ_COORD_TRANS: u16 = 3075;
const PROJ_LINEAR_UNITS: u16 = 3076;
const PROJ_NAT_ORIGIN_LAT: u16 = 3081;
const PROJ_FALSE_EASTING: u16 = 3082;
const PROJ_FALSE_NORTHING: u16 = 3083;
const PROJ_STRAIGHT_VERT_POLE_LONG: u16 = 3095;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const GCS_WGS_84: u16 = 4326;
const USER_DEFINED: u16 = 32767;
const ANGULAR_DEGREE: u16 = 9102;
const LINEAR_METER: u16 = 9001;
const CT_POLAR_STEREOGRAPHIC: u16 = 15;

/// Affine transform in GDAL order:
/// `x = origin_x + col * pixel_width`, `y = origin_y + row * pixel_height`.
///
/// Rotation terms are not supported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// Model coordinates of a (fractional) pixel position.
    pub fn pixel_to_model(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Fractional pixel position of model coordinates.
    pub fn model_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Six-element GDAL geotransform.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    fn validate(&self) -> Result<(), ExportError> {
        let finite = [
            self.origin_x,
            self.pixel_width,
            self.origin_y,
            self.pixel_height,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite || self.pixel_width <= 0.0 || self.pixel_height >= 0.0 {
            return Err(ExportError::InvalidRaster(format!(
                "unsupported geotransform {:?}",
                self.to_gdal()
            )));
        }
        Ok(())
    }
}

/// Coordinate reference system of a raster.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterCrs {
    /// WGS84 longitude/latitude in degrees (EPSG:4326)
    Wgs84,
    /// Polar stereographic plane in metres
    PolarStereographic(PolarStereographic),
}

/// A single-band Float32 raster with georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    pub width: usize,
    pub height: usize,
    /// Row-major values, top row first
    pub data: Vec<f32>,
    pub transform: GeoTransform,
    pub crs: RasterCrs,
    pub nodata: Option<f32>,
}

impl GeoRaster {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f32>,
        transform: GeoTransform,
        crs: RasterCrs,
        nodata: Option<f32>,
    ) -> Result<Self, ExportError> {
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidRaster(format!(
                "empty raster {}x{}",
                width, height
            )));
        }
        if width.checked_mul(height) != Some(data.len()) {
            return Err(ExportError::InvalidRaster(format!(
                "{} values do not fill a {}x{} raster",
                data.len(),
                width,
                height
            )));
        }
        transform.validate()?;

        Ok(Self {
            width,
            height,
            data,
            transform,
            crs,
            nodata,
        })
    }

    /// Value at (row, col), `None` outside the raster.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    pub fn is_nodata(&self, value: f32) -> bool {
        match self.nodata {
            Some(nodata) if nodata.is_nan() => value.is_nan(),
            Some(nodata) => value == nodata,
            None => false,
        }
    }
}

fn tiff_err(e: tiff::TiffError) -> ExportError {
    ExportError::Tiff(e.to_string())
}

/// GeoKey directory under construction.
#[derive(Default)]
struct GeoKeys {
    keys: Vec<[u16; 4]>,
    doubles: Vec<f64>,
    ascii: String,
}

impl GeoKeys {
    fn short(&mut self, id: u16, value: u16) {
        self.keys.push([id, 0, 1, value]);
    }

    fn double(&mut self, id: u16, value: f64) {
        self.keys
            .push([id, TAG_GEO_DOUBLE_PARAMS, 1, self.doubles.len() as u16]);
        self.doubles.push(value);
    }

    fn ascii(&mut self, id: u16, value: &str) {
        let offset = self.ascii.len() as u16;
        self.ascii.push_str(value);
        self.ascii.push('|');
        self.keys
            .push([id, TAG_GEO_ASCII_PARAMS, (value.len() + 1) as u16, offset]);
    }

    fn directory(&self) -> Vec<u16> {
        let mut keys = self.keys.clone();
        keys.sort_by_key(|k| k[0]);

        let mut directory = vec![1, 1, 0, keys.len() as u16];
        for key in keys {
            directory.extend_from_slice(&key);
        }
        directory
    }

    fn for_crs(crs: &RasterCrs) -> Self {
        let mut keys = GeoKeys::default();
        keys.short(GT_RASTER_TYPE, RASTER_PIXEL_IS_AREA);

        match crs {
            RasterCrs::Wgs84 => {
                keys.short(GT_MODEL_TYPE, MODEL_TYPE_GEOGRAPHIC);
                keys.short(GEOGRAPHIC_TYPE, GCS_WGS_84);
                keys.ascii(GEOG_CITATION, "WGS 84");
                keys.short(GEOG_ANGULAR_UNITS, ANGULAR_DEGREE);
            }
            RasterCrs::PolarStereographic(proj) => {
                keys.short(GT_MODEL_TYPE, MODEL_TYPE_PROJECTED);
                keys.short(GEOGRAPHIC_TYPE, USER_DEFINED);
                keys.short(GEOG_GEODETIC_DATUM, USER_DEFINED);
                keys.short(GEOG_ANGULAR_UNITS, ANGULAR_DEGREE);
                keys.double(GEOG_SEMI_MAJOR_AXIS, proj.semi_major_axis());
                keys.double(GEOG_SEMI_MINOR_AXIS, proj.semi_minor_axis());
                keys.short(PROJECTED_CS_TYPE, USER_DEFINED);
                keys.ascii(PCS_CITATION, &proj.to_proj4());
                keys.short(PROJECTION, USER_DEFINED);
                keys.short(PROJ_COORD_TRANS, CT_POLAR_STEREOGRAPHIC);
                keys.short(PROJ_LINEAR_UNITS, LINEAR_METER);
                keys.double(PROJ_NAT_ORIGIN_LAT, proj.latitude_of_true_scale());
                keys.double(PROJ_STRAIGHT_VERT_POLE_LONG, proj.central_meridian());
                keys.double(PROJ_FALSE_EASTING, proj.false_easting());
                keys.double(PROJ_FALSE_NORTHING, proj.false_northing());
            }
        }

        keys
    }
}

/// Write a raster as a GeoTIFF, replacing any existing file.
pub fn write_geotiff(path: &Path, raster: &GeoRaster) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(tiff_err)?;

    let mut image = encoder
        .new_image::<colortype::Gray32Float>(raster.width as u32, raster.height as u32)
        .map_err(tiff_err)?;

    let t = &raster.transform;
    let pixel_scale = [t.pixel_width, -t.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let keys = GeoKeys::for_crs(&raster.crs);

    {
        let dir = image.encoder();
        dir.write_tag(geo_tag(TAG_MODEL_PIXEL_SCALE), &pixel_scale[..])
            .map_err(tiff_err)?;
        dir.write_tag(geo_tag(TAG_MODEL_TIEPOINT), &tiepoint[..])
            .map_err(tiff_err)?;
        dir.write_tag(geo_tag(TAG_GEO_KEY_DIRECTORY), &keys.directory()[..])
            .map_err(tiff_err)?;
        if !keys.doubles.is_empty() {
            dir.write_tag(geo_tag(TAG_GEO_DOUBLE_PARAMS), &keys.doubles[..])
                .map_err(tiff_err)?;
        }
        if !keys.ascii.is_empty() {
            dir.write_tag(geo_tag(TAG_GEO_ASCII_PARAMS), keys.ascii.as_str())
                .map_err(tiff_err)?;
        }
        if let Some(nodata) = raster.nodata {
            dir.write_tag(geo_tag(TAG_GDAL_NODATA), nodata.to_string().as_str())
                .map_err(tiff_err)?;
        }
    }

    image.write_data(&raster.data).map_err(tiff_err)?;
    Ok(())
}

/// Read a GeoTIFF written by [`write_geotiff`] (or any single-band GeoTIFF
/// in one of the supported CRS kinds).
pub fn read_geotiff(path: &Path) -> Result<GeoRaster, ExportError> {
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file).map_err(tiff_err)?;

    let (width, height) = decoder.dimensions().map_err(tiff_err)?;

    let pixel_scale = decoder
        .get_tag_f64_vec(geo_tag(TAG_MODEL_PIXEL_SCALE))
        .map_err(|e| ExportError::InvalidRaster(format!("ModelPixelScale: {}", e)))?;
    let tiepoint = decoder
        .get_tag_f64_vec(geo_tag(TAG_MODEL_TIEPOINT))
        .map_err(|e| ExportError::InvalidRaster(format!("ModelTiepoint: {}", e)))?;
    if pixel_scale.len() < 2 || tiepoint.len() < 6 {
        return Err(ExportError::InvalidRaster(
            "truncated georeferencing tags".to_string(),
        ));
    }

    // ModelTiepoint: [I, J, K, X, Y, Z]
    let transform = GeoTransform::new(
        tiepoint[3] - tiepoint[0] * pixel_scale[0],
        pixel_scale[0],
        tiepoint[4] + tiepoint[1] * pixel_scale[1],
        -pixel_scale[1],
    );

    let crs = read_crs(&mut decoder)?;

    let nodata = decoder
        .get_tag_ascii_string(geo_tag(TAG_GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_end_matches('\0').trim().parse::<f32>().ok());

    let data: Vec<f32> = match decoder.read_image().map_err(tiff_err)? {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(ExportError::InvalidRaster(
                "unsupported sample type".to_string(),
            ))
        }
    };

    GeoRaster::new(
        width as usize,
        height as usize,
        data,
        transform,
        crs,
        nodata,
    )
}

fn read_crs<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<RasterCrs, ExportError> {
    let directory = decoder
        .get_tag_u32_vec(geo_tag(TAG_GEO_KEY_DIRECTORY))
        .map_err(|e| ExportError::InvalidRaster(format!("GeoKeyDirectory: {}", e)))?;
    let ascii = decoder
        .get_tag_ascii_string(geo_tag(TAG_GEO_ASCII_PARAMS))
        .unwrap_or_default();

    if directory.len() < 4 {
        return Err(ExportError::InvalidRaster(
            "truncated GeoKeyDirectory".to_string(),
        ));
    }

    let mut model_type = None;
    let mut geographic_type = None;
    let mut pcs_citation = None;

    for key in directory[4..].chunks_exact(4) {
        let (id, location, count, value) = (key[0], key[1], key[2] as usize, key[3] as usize);
        match (id as u16, location as u16) {
            (GT_MODEL_TYPE, 0) => model_type = Some(value as u16),
            (GEOGRAPHIC_TYPE, 0) => geographic_type = Some(value as u16),
            (PCS_CITATION, TAG_GEO_ASCII_PARAMS) => {
                pcs_citation = ascii
                    .get(value..value + count)
                    .map(|s| s.trim_end_matches('|').to_string());
            }
            _ => {}
        }
    }

    match model_type {
        Some(MODEL_TYPE_GEOGRAPHIC) if geographic_type == Some(GCS_WGS_84) => Ok(RasterCrs::Wgs84),
        Some(MODEL_TYPE_PROJECTED) => {
            let citation = pcs_citation.ok_or_else(|| {
                ExportError::InvalidRaster("projected CRS without a proj4 citation".to_string())
            })?;
            let proj = PolarStereographic::from_proj4_str(&citation)
                .map_err(|e| ExportError::Projection(e.to_string()))?;
            Ok(RasterCrs::PolarStereographic(proj))
        }
        other => Err(ExportError::InvalidRaster(format!(
            "unsupported model type {:?} / geographic type {:?}",
            other, geographic_type
        ))),
    }
}
