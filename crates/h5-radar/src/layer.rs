//! Layer listing entries and decoded layer arrays.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One time-stamped layer in a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerDescriptor {
    /// Entry name, unique within the container (e.g. "image1")
    pub name: String,
    /// Valid time of the scan or forecast step
    pub valid_datetime: DateTime<Utc>,
}

/// Raw cell values of one layer, row-major `[row][column]`.
///
/// Never mutated after it is read.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerArray {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl LayerArray {
    /// Wrap row-major data. Returns `None` when `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        if rows.checked_mul(cols)? != data.len() {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at (row, col), `None` outside the array.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(LayerArray::new(2, 3, vec![0.0; 6]).is_some());
        assert!(LayerArray::new(2, 3, vec![0.0; 5]).is_none());
        assert!(LayerArray::new(usize::MAX, 2, vec![]).is_none());
    }

    #[test]
    fn test_get_is_row_major() {
        let layer = LayerArray::new(2, 3, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]).unwrap();
        assert_eq!(layer.get(0, 2), Some(2.0));
        assert_eq!(layer.get(1, 0), Some(10.0));
        assert_eq!(layer.get(2, 0), None);
        assert_eq!(layer.get(0, 3), None);
    }
}
