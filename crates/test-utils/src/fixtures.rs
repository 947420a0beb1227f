//! Common test fixtures for radar precipitation tests.
//!
//! Values describe the 1 km Dutch radar composite grid as published with the
//! archive's nowcast products.

/// The archive's national composite grid.
pub mod knmi {
    /// Rows below the pole at which row 0 starts (km)
    pub const ROW_OFFSET: f64 = 3649.98;

    /// Columns in a full frame
    pub const COLUMNS: usize = 700;

    /// Rows in a full frame
    pub const ROWS: usize = 765;

    /// Native projection as stored in `/geographic/map_projection`
    pub const PROJ4: &str =
        "+proj=stere +lat_0=90 +lon_0=0 +lat_ts=60 +a=6378.14 +b=6356.75 +x_0=0 y_0=0";

    /// Corner coordinates (lng, lat) of the frame, clockwise from top-left
    pub const CORNERS: [(f64, f64); 4] = [
        (0.0, 55.97377023185658),
        (10.856471421919444, 55.38914122760795),
        (9.009315794761358, 48.89549853745292),
        (0.0, 49.36225760196808),
    ];
}

/// Well-known locations inside the composite, with their grid cells.
pub mod places {
    /// (lng, lat, row, col)
    pub const DE_BILT: (f64, f64, i64, i64) = (5.18, 52.10, 428, 370);

    /// (lng, lat, row, col)
    pub const AMSTERDAM: (f64, f64, i64, i64) = (4.90, 52.37, 399, 347);

    /// Far outside the composite
    pub const MADRID: (f64, f64) = (-3.70, 40.42);
}

/// Valid-time attribute strings in the archive's layout.
pub mod time {
    pub const STEP_0: &str = "01-JAN-2024;00:00:00.000000";
    pub const STEP_1: &str = "01-JAN-2024;00:05:00.000000";
    pub const STEP_2: &str = "01-JAN-2024;00:10:00.000000";
}
