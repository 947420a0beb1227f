//! Polar stereographic projection (ellipsoidal, polar aspect).
//!
//! The radar composites are laid out on a north polar stereographic plane
//! with true scale at 60°N. Coordinates come out in the same linear unit as
//! the semi-major axis, so the archive's definition (`+a=6378.14`) yields
//! kilometres while the export definition (`+a=6378140`) yields metres.
//!
//! Parameters understood from proj4:
//! - `lat_0`: must be +90 (north) or -90 (south)
//! - `lon_0`: central meridian (straight vertical longitude)
//! - `lat_ts`: latitude of true scale; when absent or at the pole `k_0` applies
//! - `a`, `b` / `rf` / `R` / `ellps`: the ellipsoid
//! - `x_0`, `y_0`: false easting and northing
//!
//! Reference: Snyder, Map Projections - A Working Manual (1987), pp. 160-163.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::{ProjectionError, ProjectionResult};
use crate::proj4::Proj4Params;

const MAX_ITERATIONS: usize = 30;
const CONVERGENCE: f64 = 1e-12;

/// Polar stereographic projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarStereographic {
    /// Semi-major axis (output linear unit)
    a: f64,
    /// Semi-minor axis
    b: f64,
    /// First eccentricity
    e: f64,
    /// +1 for the north polar aspect, -1 for the south
    pole_sign: f64,
    /// Central meridian in radians
    lon0: f64,
    /// Latitude of true scale in degrees (signed, as given)
    lat_ts_deg: f64,
    /// Scale factor at the pole (used when lat_ts is the pole)
    k0: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
    /// Radius scale: rho = scale * t(phi)
    scale: f64,
}

impl PolarStereographic {
    /// Create a projection from explicit parameters.
    ///
    /// `lat_ts_deg` of `None` (or equal to the pole) means the scale is set by `k0`.
    pub fn new(
        a: f64,
        b: f64,
        north: bool,
        lon0_deg: f64,
        lat_ts_deg: Option<f64>,
        k0: f64,
        x0: f64,
        y0: f64,
    ) -> ProjectionResult<Self> {
        if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0 && b <= a) {
            return Err(ProjectionError::InvalidDefinition(format!(
                "invalid ellipsoid axes a={} b={}",
                a, b
            )));
        }
        if !(k0.is_finite() && k0 > 0.0) {
            return Err(ProjectionError::InvalidDefinition(format!(
                "invalid scale factor k_0={}",
                k0
            )));
        }

        let pole_sign = if north { 1.0 } else { -1.0 };
        let e = (1.0 - (b * b) / (a * a)).sqrt();
        let lat_ts_deg = lat_ts_deg.unwrap_or(90.0 * pole_sign);

        if lat_ts_deg.abs() > 90.0 || lat_ts_deg * pole_sign <= 0.0 {
            return Err(ProjectionError::InvalidDefinition(format!(
                "lat_ts={} must lie in the projection's hemisphere",
                lat_ts_deg
            )));
        }

        let phi_c = (lat_ts_deg * pole_sign).to_radians();
        let scale = if (FRAC_PI_2 - phi_c).abs() < 1e-10 {
            // True scale at the pole
            let denom = ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt();
            2.0 * a * k0 / denom
        } else {
            a * m(phi_c, e) / t(phi_c, e)
        };

        Ok(Self {
            a,
            b,
            e,
            pole_sign,
            lon0: lon0_deg.to_radians(),
            lat_ts_deg,
            k0,
            x0,
            y0,
            scale,
        })
    }

    /// Build the projection from a proj4 definition.
    pub fn from_proj4(params: &Proj4Params) -> ProjectionResult<Self> {
        match params.projection_name() {
            Some("stere") | Some("ups") => {}
            Some(other) => return Err(ProjectionError::Unsupported(other.to_string())),
            None => {
                return Err(ProjectionError::InvalidDefinition(
                    "missing +proj".to_string(),
                ))
            }
        }

        let lat0 = params.get_f64("lat_0")?.unwrap_or(90.0);
        let north = if (lat0 - 90.0).abs() < 1e-9 {
            true
        } else if (lat0 + 90.0).abs() < 1e-9 {
            false
        } else {
            return Err(ProjectionError::Unsupported(format!(
                "oblique stereographic (lat_0={})",
                lat0
            )));
        };

        let (a, b) = ellipsoid_axes(params)?;

        Self::new(
            a,
            b,
            north,
            params.get_f64("lon_0")?.unwrap_or(0.0),
            params.get_f64("lat_ts")?,
            params.get_f64("k_0")?.or(params.get_f64("k")?).unwrap_or(1.0),
            params.get_f64("x_0")?.unwrap_or(0.0),
            params.get_f64("y_0")?.unwrap_or(0.0),
        )
    }

    /// Parse a proj4 string directly.
    pub fn from_proj4_str(definition: &str) -> ProjectionResult<Self> {
        Self::from_proj4(&Proj4Params::parse(definition)?)
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    pub fn semi_minor_axis(&self) -> f64 {
        self.b
    }

    pub fn is_north(&self) -> bool {
        self.pole_sign > 0.0
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Latitude of true scale in degrees.
    pub fn latitude_of_true_scale(&self) -> f64 {
        self.lat_ts_deg
    }

    pub fn false_easting(&self) -> f64 {
        self.x0
    }

    pub fn false_northing(&self) -> f64 {
        self.y0
    }

    /// Render the definition back to a proj4 string.
    pub fn to_proj4(&self) -> String {
        let mut s = format!(
            "+proj=stere +lat_0={} +lon_0={} +lat_ts={} +a={} +b={} +x_0={} +y_0={}",
            90.0 * self.pole_sign,
            self.central_meridian(),
            self.lat_ts_deg,
            self.a,
            self.b,
            self.x0,
            self.y0
        );
        if (self.k0 - 1.0).abs() > f64::EPSILON {
            s.push_str(&format!(" +k_0={}", self.k0));
        }
        s
    }

    /// Project geographic coordinates (degrees) to projected (x, y).
    pub fn forward(&self, lng: f64, lat: f64) -> ProjectionResult<(f64, f64)> {
        if !(lng.is_finite() && lat.is_finite()) || lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain(format!("({}, {})", lng, lat)));
        }

        let s = self.pole_sign;
        let phi = (lat * s).to_radians();
        if (phi + FRAC_PI_2).abs() < 1e-12 {
            return Err(ProjectionError::OutOfDomain(format!(
                "latitude {} is the opposite pole",
                lat
            )));
        }

        let dlon = s * (lng.to_radians() - self.lon0);
        let rho = self.scale * t(phi, self.e);

        let x = s * rho * dlon.sin();
        let y = -s * rho * dlon.cos();

        Ok((x + self.x0, y + self.y0))
    }

    /// Unproject (x, y) to geographic coordinates (degrees).
    ///
    /// Longitude is normalized to [-180, 180].
    pub fn inverse(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProjectionError::OutOfDomain(format!("({}, {})", x, y)));
        }

        let s = self.pole_sign;
        let xs = s * (x - self.x0);
        let ys = s * (y - self.y0);

        let rho = xs.hypot(ys);
        let ts = rho / self.scale;

        let phi = self.phi_from_t(ts).ok_or(ProjectionError::NoConvergence { x, y })?;
        let dlon = if rho == 0.0 { 0.0 } else { xs.atan2(-ys) };

        let lat = s * phi.to_degrees();
        let lng = normalize_lon((self.lon0 + s * dlon).to_degrees());

        Ok((lng, lat))
    }

    /// Solve t = tan(pi/4 - phi/2) / ((1 - e sin phi) / (1 + e sin phi))^(e/2) for phi.
    fn phi_from_t(&self, ts: f64) -> Option<f64> {
        let half_e = self.e / 2.0;
        let mut phi = FRAC_PI_2 - 2.0 * ts.atan();

        for _ in 0..MAX_ITERATIONS {
            let es = self.e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            if (next - phi).abs() < CONVERGENCE {
                return Some(next);
            }
            phi = next;
        }

        None
    }
}

/// Isometric-latitude term t(phi).
fn t(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

/// Parallel radius term m(phi).
fn m(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

fn normalize_lon(mut lon: f64) -> f64 {
    while lon > 180.0 {
        lon -= 360.0;
    }
    while lon < -180.0 {
        lon += 360.0;
    }
    lon
}

/// Resolve the ellipsoid from `a`/`b`, `a`/`rf`, `R` or a named `ellps`.
fn ellipsoid_axes(params: &Proj4Params) -> ProjectionResult<(f64, f64)> {
    if let Some(r) = params.get_f64("R")? {
        return Ok((r, r));
    }

    let (named_a, named_rf) = match params.get("ellps") {
        Some("WGS84") => (Some(6378137.0), Some(298.257223563)),
        Some("GRS80") => (Some(6378137.0), Some(298.257222101)),
        Some("sphere") => (Some(6370997.0), None),
        Some(other) => {
            return Err(ProjectionError::Unsupported(format!("ellps={}", other)));
        }
        None => (None, None),
    };

    let a = params
        .get_f64("a")?
        .or(named_a)
        .ok_or_else(|| ProjectionError::InvalidDefinition("missing +a".to_string()))?;

    let b = match (params.get_f64("b")?, params.get_f64("rf")?.or(named_rf)) {
        (Some(b), _) => b,
        (None, Some(rf)) if rf != 0.0 => a * (1.0 - 1.0 / rf),
        _ => a,
    };

    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIVE: &str =
        "+proj=stere +lat_0=90 +lon_0=0 +lat_ts=60 +a=6378.14 +b=6356.75 +x_0=0 y_0=0";

    fn archive() -> PolarStereographic {
        PolarStereographic::from_proj4_str(ARCHIVE).unwrap()
    }

    #[test]
    fn test_forward_de_bilt() {
        // De Bilt, reference values from the archive's published grid definition
        let (x, y) = archive().forward(5.18, 52.10).unwrap();
        assert!((x - 369.6874652136761).abs() < 1e-6, "x = {}", x);
        assert!((y - -4077.9517605732153).abs() < 1e-6, "y = {}", y);
    }

    #[test]
    fn test_inverse_grid_corners() {
        let proj = archive();

        // Top-left corner of the 700x765 composite
        let (lng, lat) = proj.inverse(0.0, -3649.98).unwrap();
        assert!(lng.abs() < 1e-9, "lng = {}", lng);
        assert!((lat - 55.97377023185658).abs() < 1e-6, "lat = {}", lat);

        // Bottom-right corner
        let (lng, lat) = proj.inverse(700.0, -3649.98 - 765.0).unwrap();
        assert!((lng - 9.009315794761358).abs() < 1e-6, "lng = {}", lng);
        assert!((lat - 48.89549853745292).abs() < 1e-6, "lat = {}", lat);
    }

    #[test]
    fn test_roundtrip_over_coverage() {
        let proj = archive();
        for lng in [0.0, 2.5, 5.0, 7.5, 10.0] {
            for lat in [49.0, 51.0, 53.0, 55.0] {
                let (x, y) = proj.forward(lng, lat).unwrap();
                let (lng2, lat2) = proj.inverse(x, y).unwrap();
                assert!((lng - lng2).abs() < 1e-9, "lng {} vs {}", lng, lng2);
                assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
            }
        }
    }

    #[test]
    fn test_pole_maps_to_origin() {
        let proj = archive();
        let (x, y) = proj.forward(0.0, 90.0).unwrap();
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);

        let (_, lat) = proj.inverse(0.0, 0.0).unwrap();
        assert!((lat - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_metre_definition_scales() {
        let km = archive();
        let m = PolarStereographic::from_proj4_str(
            "+proj=stere +lat_0=90 +lon_0=0 +lat_ts=60 +a=6378140 +b=6356750 +x_0=0 y_0=0 +units=m",
        )
        .unwrap();

        let (xk, yk) = km.forward(4.9, 52.37).unwrap();
        let (xm, ym) = m.forward(4.9, 52.37).unwrap();
        assert!((xm - xk * 1000.0).abs() < 1e-3, "{} vs {}", xm, xk * 1000.0);
        assert!((ym - yk * 1000.0).abs() < 1e-3, "{} vs {}", ym, yk * 1000.0);
    }

    #[test]
    fn test_south_polar_aspect_roundtrip() {
        let proj = PolarStereographic::from_proj4_str(
            "+proj=stere +lat_0=-90 +lat_ts=-71 +lon_0=0 +ellps=WGS84",
        )
        .unwrap();
        assert!(!proj.is_north());

        let (x, y) = proj.forward(45.0, -75.0).unwrap();
        // East of the central meridian, y grows towards lon 0 in the south aspect
        assert!(x > 0.0 && y > 0.0, "({}, {})", x, y);

        let (lng, lat) = proj.inverse(x, y).unwrap();
        assert!((lng - 45.0).abs() < 1e-9);
        assert!((lat + 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_pole_rejected() {
        assert!(matches!(
            archive().forward(0.0, -90.0),
            Err(ProjectionError::OutOfDomain(_))
        ));
        assert!(archive().forward(f64::NAN, 52.0).is_err());
    }

    #[test]
    fn test_unsupported_definitions() {
        assert!(matches!(
            PolarStereographic::from_proj4_str("+proj=merc +a=6378137"),
            Err(ProjectionError::Unsupported(_))
        ));
        assert!(matches!(
            PolarStereographic::from_proj4_str("+proj=stere +lat_0=52 +a=6378137"),
            Err(ProjectionError::Unsupported(_))
        ));
        assert!(PolarStereographic::from_proj4_str("+proj=stere +lat_0=90").is_err());
    }

    #[test]
    fn test_to_proj4_reparses() {
        let proj = archive();
        let again = PolarStereographic::from_proj4_str(&proj.to_proj4()).unwrap();
        assert_eq!(proj, again);
    }
}
