//! Frame store tests against HDF5 containers in the archive layout.

use chrono::{TimeZone, Utc};
use h5_radar::{FrameStore, RadarError};
use test_utils::fixtures::{knmi, places, time};
use test_utils::{
    create_dry_frame, create_test_frame, test_frame_value, RadarFixture, RadarFixtureBuilder,
    StringEncoding,
};

fn small_fixture() -> RadarFixture {
    RadarFixtureBuilder::with_dimensions(6, 8)
        .layer("image1", time::STEP_0, create_test_frame(6, 8))
        .layer("image2", time::STEP_1, create_test_frame(6, 8))
        .layer("image3", time::STEP_2, create_dry_frame(6, 8))
        .build()
        .unwrap()
}

// ============================================================================
// Opening
// ============================================================================

#[test]
fn test_open_reads_metadata() {
    let fixture = small_fixture();
    let store = FrameStore::open(fixture.path()).unwrap();

    let metadata = store.metadata();
    assert_eq!(metadata.num_rows, 6);
    assert_eq!(metadata.num_columns, 8);
    assert!((metadata.row_offset - knmi::ROW_OFFSET).abs() < 1e-3);
    assert_eq!(metadata.projection, knmi::PROJ4);
    assert_eq!(store.cached_layer_count(), 0);
    assert_eq!(store.path(), fixture.path());
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = FrameStore::open(dir.path().join("absent.h5"));
    assert!(matches!(result, Err(RadarError::NotFound { .. })));
}

#[test]
fn test_open_non_hdf5_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_a_container.h5");
    std::fs::write(&path, b"plain text").unwrap();

    assert!(matches!(
        FrameStore::open(&path),
        Err(RadarError::NotFound { .. })
    ));
}

#[test]
fn test_open_missing_geographic_attribute() {
    for attr in ["geo_row_offset", "geo_number_columns", "geo_number_rows"] {
        let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
            .without_geographic_attr(attr)
            .build()
            .unwrap();

        match FrameStore::open(fixture.path()) {
            Err(RadarError::CorruptData { entry, reason }) => {
                assert_eq!(entry, "geographic");
                assert!(reason.contains(attr), "{}", reason);
            }
            other => panic!("{}: expected CorruptData, got {:?}", attr, other.map(|_| ())),
        }
    }
}

#[test]
fn test_open_missing_projection() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .without_proj4()
        .build()
        .unwrap();

    assert!(matches!(
        FrameStore::open(fixture.path()),
        Err(RadarError::CorruptData { .. })
    ));
}

#[test]
fn test_open_unsupported_projection() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .proj4("+proj=merc +lon_0=0 +a=6378137")
        .build()
        .unwrap();

    match FrameStore::open(fixture.path()) {
        Err(RadarError::CorruptData { entry, .. }) => {
            assert_eq!(entry, "geographic/map_projection")
        }
        other => panic!("expected CorruptData, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_open_fractional_dimensions() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .raw_dimensions(2.0, 2.5)
        .build()
        .unwrap();

    assert!(matches!(
        FrameStore::open(fixture.path()),
        Err(RadarError::CorruptData { .. })
    ));
}

// ============================================================================
// Layer listing
// ============================================================================

#[test]
fn test_list_layers_five_minutes_apart() {
    let fixture = small_fixture();
    let store = FrameStore::open(fixture.path()).unwrap();

    let layers = store.list_layers_sorted().unwrap();
    let names: Vec<_> = layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["image1", "image2", "image3"]);

    assert_eq!(
        layers[0].valid_datetime,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
    for pair in layers.windows(2) {
        assert_eq!(
            (pair[1].valid_datetime - pair[0].valid_datetime).num_minutes(),
            5
        );
    }

    // Listing reads no layer data
    assert_eq!(store.cached_layer_count(), 0);
}

#[test]
fn test_list_layers_varlen_strings() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .string_encoding(StringEncoding::VarLen)
        .layer("image1", time::STEP_1, create_dry_frame(2, 2))
        .build()
        .unwrap();
    let store = FrameStore::open(fixture.path()).unwrap();

    let layers = store.list_layers().unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(
        layers[0].valid_datetime,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap()
    );
}

#[test]
fn test_list_layers_empty_container() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2).build().unwrap();
    let store = FrameStore::open(fixture.path()).unwrap();
    assert!(store.list_layers().unwrap().is_empty());
}

#[test]
fn test_list_layers_missing_time_names_layer() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .layer("image1", time::STEP_0, create_dry_frame(2, 2))
        .layer_without_time("image2", create_dry_frame(2, 2))
        .build()
        .unwrap();
    let store = FrameStore::open(fixture.path()).unwrap();

    match store.list_layers() {
        Err(RadarError::CorruptData { entry, .. }) => assert_eq!(entry, "image2"),
        other => panic!("expected CorruptData, got {:?}", other),
    }
}

#[test]
fn test_list_layers_bad_time_format() {
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .layer("image1", "2024-01-01T00:00:00Z", create_dry_frame(2, 2))
        .build()
        .unwrap();
    let store = FrameStore::open(fixture.path()).unwrap();

    assert!(matches!(
        store.list_layers(),
        Err(RadarError::CorruptData { .. })
    ));
}

// ============================================================================
// Layer loading
// ============================================================================

#[test]
fn test_get_layer_is_cached() {
    let fixture = small_fixture();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    let first = store.get_layer("image1").unwrap();
    let second = store.get_layer("image1").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(store.cached_layer_count(), 1);

    assert_eq!((first.rows(), first.cols()), (6, 8));
    assert_eq!(first.get(2, 5), Some(test_frame_value(2, 5) as f32));
}

#[test]
fn test_get_unknown_layer() {
    let fixture = small_fixture();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert!(matches!(
        store.get_layer("image42"),
        Err(RadarError::CorruptData { .. })
    ));
    assert_eq!(store.cached_layer_count(), 0);
}

#[test]
fn test_get_layer_shape_mismatch() {
    let fixture = RadarFixtureBuilder::with_dimensions(4, 4)
        .layer_with_shape("image1", Some(time::STEP_0), (4, 3), create_dry_frame(4, 3))
        .build()
        .unwrap();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert!(matches!(
        store.get_layer("image1"),
        Err(RadarError::CorruptData { .. })
    ));
}

// ============================================================================
// Value access
// ============================================================================

#[test]
fn test_value_at_grid_bounds() {
    let fixture = small_fixture();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    for (row, col) in [(-1, 0), (6, 0), (0, -1), (0, 8)] {
        assert!(
            matches!(
                store.value_at_grid("image1", row, col),
                Err(RadarError::OutOfBounds { .. })
            ),
            "({}, {}) should be out of bounds",
            row,
            col
        );
    }

    assert_eq!(
        store.value_at_grid("image1", 5, 7).unwrap(),
        test_frame_value(5, 7) as f32
    );
}

#[test]
fn test_rate_conversion() {
    let mut frame = create_dry_frame(2, 2);
    frame[1] = 100;
    let fixture = RadarFixtureBuilder::with_dimensions(2, 2)
        .layer("image1", time::STEP_0, frame)
        .build()
        .unwrap();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert_eq!(store.rate_at_grid("image1", 0, 1).unwrap(), 12.0);
    assert_eq!(store.rate_at_grid("image1", 0, 0).unwrap(), 0.0);
}

#[test]
fn test_value_at_geo_full_grid() {
    let (lng, lat, row, col) = places::DE_BILT;
    let mut frame = create_dry_frame(knmi::ROWS, knmi::COLUMNS);
    frame[row as usize * knmi::COLUMNS + col as usize] = 250;

    let fixture = RadarFixture::builder()
        .layer("image1", time::STEP_0, frame)
        .build()
        .unwrap();
    let mut store = FrameStore::open(fixture.path()).unwrap();

    assert_eq!(store.value_at_geo("image1", lng, lat).unwrap(), 250.0);
    assert_eq!(store.rate_at_geo("image1", lng, lat).unwrap(), 30.0);

    let (lng, lat, ..) = places::AMSTERDAM;
    assert_eq!(store.value_at_geo("image1", lng, lat).unwrap(), 0.0);

    let (lng, lat) = places::MADRID;
    assert!(matches!(
        store.value_at_geo("image1", lng, lat),
        Err(RadarError::OutOfBounds { .. })
    ));
}
