//! Test data generators for radar frames.
//!
//! Frames are row-major `u16` arrays, the storage type of the archive's
//! `image_data` datasets.

/// Value of cell (row, col) in [`create_test_frame`].
///
/// `(row % 256) * 256 + col % 256`, unique for frames up to 256x256.
pub fn test_frame_value(row: usize, col: usize) -> u16 {
    ((row % 256) * 256 + (col % 256)) as u16
}

/// Creates a frame with predictable values.
///
/// # Example
///
/// ```
/// use test_utils::{create_test_frame, test_frame_value};
///
/// let frame = create_test_frame(4, 10);
/// assert_eq!(frame.len(), 40);
/// assert_eq!(frame[0], 0);
/// assert_eq!(frame[1], 1);   // row 0, col 1
/// assert_eq!(frame[10], 256); // row 1, col 0
/// assert_eq!(frame[13], test_frame_value(1, 3));
/// ```
pub fn create_test_frame(rows: usize, cols: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            data.push(test_frame_value(row, col));
        }
    }
    data
}

/// Creates a frame without any precipitation (all zeros).
pub fn create_dry_frame(rows: usize, cols: usize) -> Vec<u16> {
    vec![0; rows * cols]
}

/// Creates a frame with a single circular shower.
///
/// Cells within `radius` of the centre get `peak` at the centre, falling off
/// linearly to 1 at the edge; everything else is 0 (dry / no data).
pub fn create_shower_frame(
    rows: usize,
    cols: usize,
    center: (usize, usize),
    radius: f64,
    peak: u16,
) -> Vec<u16> {
    let mut data = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let dr = row as f64 - center.0 as f64;
            let dc = col as f64 - center.1 as f64;
            let dist = (dr * dr + dc * dc).sqrt();
            if dist <= radius {
                let falloff = 1.0 - dist / radius.max(f64::EPSILON);
                let value = 1.0 + falloff * (peak.saturating_sub(1)) as f64;
                data.push(value.round() as u16);
            } else {
                data.push(0);
            }
        }
    }
    data
}
