//! Error types for radar frame access and export.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for radar container operations.
///
/// Callers are expected to match on the kind and decide whether to skip,
/// abort or log. No operation returns a sentinel value in place of an error:
/// `0` already means "no data" in the raw frames.
#[derive(Debug, Error)]
pub enum RadarError {
    /// The path does not reference an existing, readable container.
    #[error("container not found at {}: {reason}", path.display())]
    NotFound { path: PathBuf, reason: String },

    /// An expected attribute, dataset or layer is missing or unparsable.
    #[error("corrupt data in '{entry}': {reason}")]
    CorruptData { entry: String, reason: String },

    /// A grid index falls outside the container's dimensions.
    #[error("grid index (row {row}, col {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    /// Raster creation, reprojection or output I/O failed.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

impl RadarError {
    pub fn not_found(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RadarError::NotFound {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(entry: impl Into<String>, reason: impl ToString) -> Self {
        RadarError::CorruptData {
            entry: entry.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while writing or reprojecting a raster.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("projection error: {0}")]
    Projection(String),

    /// Dimensions, geotransform or georeferencing tags are unusable.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_message() {
        let err = RadarError::OutOfBounds {
            row: -1,
            col: 3,
            rows: 765,
            cols: 700,
        };
        assert_eq!(
            err.to_string(),
            "grid index (row -1, col 3) is outside the 765x700 grid"
        );
    }

    #[test]
    fn test_export_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: RadarError = ExportError::from(io).into();
        assert!(matches!(err, RadarError::Export(ExportError::Io(_))));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_corrupt_names_entry() {
        let err = RadarError::corrupt("image3", "missing attribute image_datetime_valid");
        assert!(err.to_string().contains("image3"));
    }
}
