//! GeoTIFF export of container layers.

use std::collections::HashSet;

use h5_radar::{FrameStore, RadarError};
use raster_export::{read_geotiff, RasterCrs};
use test_utils::fixtures::{knmi, places, time};
use test_utils::{create_dry_frame, create_shower_frame, require_test_file, RadarFixture};

/// Full-size frame that is dry except for a 21x21 block of 250 around De Bilt.
fn block_fixture() -> RadarFixture {
    let (_, _, row, col) = places::DE_BILT;
    let mut frame = create_dry_frame(knmi::ROWS, knmi::COLUMNS);
    for r in (row - 10)..=(row + 10) {
        for c in (col - 10)..=(col + 10) {
            frame[r as usize * knmi::COLUMNS + c as usize] = 250;
        }
    }

    RadarFixture::builder()
        .layer("image1", time::STEP_0, frame)
        .build()
        .unwrap()
}

fn sample(raster: &raster_export::GeoRaster, lng: f64, lat: f64) -> f32 {
    let (col, row) = raster.transform.model_to_pixel(lng, lat);
    raster
        .get(row.floor() as usize, col.floor() as usize)
        .unwrap_or_else(|| panic!("({}, {}) is outside the output", lng, lat))
}

#[test]
fn test_export_preserves_values_and_nodata() {
    let fixture = block_fixture();
    let output = fixture.dir().join("image1.tif");
    let mut store = FrameStore::open(fixture.path()).unwrap();

    let summary = store.export("image1", &output).unwrap();
    assert_eq!(summary.path, output);

    let raster = read_geotiff(&output).unwrap();
    assert_eq!(raster.crs, RasterCrs::Wgs84);
    assert_eq!(raster.nodata, Some(0.0));
    assert_eq!((raster.width, raster.height), (summary.width, summary.height));

    // Wet cell keeps its raw value
    let (lng, lat, ..) = places::DE_BILT;
    assert_eq!(sample(&raster, lng, lat), 250.0);

    // Dry cell inside the coverage is no-data
    let (lng, lat, ..) = places::AMSTERDAM;
    assert_eq!(sample(&raster, lng, lat), 0.0);

    // Output covers the native grid corners
    let t = raster.transform;
    assert!(t.origin_x.abs() < 1e-6);
    assert!((t.origin_y - 55.97377023185658).abs() < 1e-6);
}

#[test]
fn test_export_keeps_shower_values() {
    let (_, _, row, col) = places::DE_BILT;
    let frame = create_shower_frame(
        knmi::ROWS,
        knmi::COLUMNS,
        (row as usize, col as usize),
        15.0,
        400,
    );
    let fixture = RadarFixture::builder()
        .layer("image1", time::STEP_0, frame.clone())
        .build()
        .unwrap();
    let output = fixture.dir().join("shower.tif");

    let mut store = FrameStore::open(fixture.path()).unwrap();
    store.export("image1", &output).unwrap();
    let raster = read_geotiff(&output).unwrap();

    // Nearest neighbour only copies values that exist in the frame
    let values: HashSet<u16> = frame.iter().copied().collect();
    let max = raster.data.iter().copied().fold(0.0f32, f32::max);
    assert!(max <= 400.0 && max >= 340.0, "peak after warp: {}", max);
    for value in raster.data.iter().filter(|v| **v != 0.0) {
        assert!(values.contains(&(*value as u16)), "invented value {}", value);
    }
}

#[test]
fn test_export_replaces_existing_output() {
    let fixture = block_fixture();
    let output = fixture.dir().join("image1.tif");
    std::fs::write(&output, b"stale").unwrap();

    let mut store = FrameStore::open(fixture.path()).unwrap();
    store.export("image1", &output).unwrap();

    assert!(read_geotiff(&output).is_ok());
}

#[test]
fn test_export_unknown_layer() {
    let fixture = block_fixture();
    let output = fixture.dir().join("missing.tif");
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert!(matches!(
        store.export("image9", &output),
        Err(RadarError::CorruptData { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_export_into_missing_directory() {
    let fixture = block_fixture();
    let output = fixture.dir().join("no_such_dir").join("image1.tif");
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert!(matches!(
        store.export("image1", &output),
        Err(RadarError::Export(_))
    ));
}

#[test]
fn test_real_nowcast_file() {
    let path = require_test_file!("RAD_NL25_RAC_FM_sample.h5");
    let mut store = FrameStore::open(&path).unwrap();

    assert_eq!(store.metadata().num_columns, knmi::COLUMNS);
    assert_eq!(store.metadata().num_rows, knmi::ROWS);

    let layers = store.list_layers_sorted().unwrap();
    assert!(!layers.is_empty());

    let (lng, lat, ..) = places::DE_BILT;
    let rate = store.rate_at_geo(&layers[0].name, lng, lat).unwrap();
    assert!(rate >= 0.0);
}
