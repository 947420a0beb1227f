//! Raw access to radar containers.
//!
//! [`RadarContainer`] is the seam between the frame store and the file
//! format. [`H5Container`] reads the HDF5 layout written by the archive:
//!
//! ```text
//! /geographic                  geo_row_offset, geo_number_columns, geo_number_rows
//! /geographic/map_projection   projection_proj4_params
//! /imageN                      image_datetime_valid
//! /imageN/image_data           2-D raw values
//! ```

use std::path::{Path, PathBuf};
use std::sync::Once;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};
use radar_common::{GridMetadata, RadarError, RadarResult};
use tracing::debug;

use crate::layer::LayerArray;

const GEOGRAPHIC: &str = "geographic";
const MAP_PROJECTION: &str = "geographic/map_projection";
const VALID_TIME_ATTR: &str = "image_datetime_valid";
const IMAGE_DATA: &str = "image_data";

/// Read operations the frame store needs from a container.
pub trait RadarContainer {
    /// Grid description from the geographic group.
    fn read_metadata(&self) -> RadarResult<GridMetadata>;

    /// Names of all top-level entries, layers and others.
    fn entry_names(&self) -> RadarResult<Vec<String>>;

    /// Raw valid-time string of a layer entry.
    fn read_valid_time(&self, entry: &str) -> RadarResult<String>;

    /// Full 2-D array of a layer entry.
    fn read_layer(&self, entry: &str) -> RadarResult<LayerArray>;
}

/// Options applied when opening a container.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Suppress the HDF5 library's diagnostic stack printed to stderr on
    /// handled errors (e.g. probing for an attribute that is absent).
    pub silence_hdf5_errors: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            silence_hdf5_errors: true,
        }
    }
}

/// Turn off HDF5's automatic error printing for the rest of the process.
///
/// Only the first call has an effect.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        hdf5::silence_errors(true);
    });
}

/// An open HDF5 radar container.
pub struct H5Container {
    file: hdf5::File,
    path: PathBuf,
}

impl std::fmt::Debug for H5Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("H5Container")
            .field("path", &self.path)
            .finish()
    }
}

impl H5Container {
    /// Open a container read-only.
    ///
    /// Fails with `NotFound` when the path does not exist or is not a
    /// readable HDF5 file.
    pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> RadarResult<Self> {
        let path = path.as_ref();

        if options.silence_hdf5_errors {
            silence_hdf5_errors();
        }

        if !path.is_file() {
            return Err(RadarError::not_found(path, "no such file"));
        }

        let file = hdf5::File::open(path).map_err(|e| RadarError::not_found(path, e))?;
        debug!(path = %path.display(), "Opened HDF5 container");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn group(&self, name: &str) -> RadarResult<hdf5::Group> {
        if !self.file.link_exists(name) {
            return Err(RadarError::corrupt(name, "group is missing"));
        }
        self.file
            .group(name)
            .map_err(|e| RadarError::corrupt(name, e))
    }
}

impl RadarContainer for H5Container {
    fn read_metadata(&self) -> RadarResult<GridMetadata> {
        let geographic = self.group(GEOGRAPHIC)?;
        let row_offset = read_f64_attr(&geographic, GEOGRAPHIC, "geo_row_offset")?;
        let num_columns = read_f64_attr(&geographic, GEOGRAPHIC, "geo_number_columns")?;
        let num_rows = read_f64_attr(&geographic, GEOGRAPHIC, "geo_number_rows")?;

        let map_projection = self.group(MAP_PROJECTION)?;
        let projection =
            read_string_attr(&map_projection, MAP_PROJECTION, "projection_proj4_params")?;

        GridMetadata::from_raw(row_offset, num_columns, num_rows, projection)
    }

    fn entry_names(&self) -> RadarResult<Vec<String>> {
        self.file
            .member_names()
            .map_err(|e| RadarError::corrupt("/", e))
    }

    fn read_valid_time(&self, entry: &str) -> RadarResult<String> {
        let group = self.group(entry)?;
        read_string_attr(&group, entry, VALID_TIME_ATTR)
    }

    fn read_layer(&self, entry: &str) -> RadarResult<LayerArray> {
        let group = self.group(entry)?;
        let data_path = format!("{}/{}", entry, IMAGE_DATA);

        if !group.link_exists(IMAGE_DATA) {
            return Err(RadarError::corrupt(data_path, "dataset is missing"));
        }
        let dataset = group
            .dataset(IMAGE_DATA)
            .map_err(|e| RadarError::corrupt(&data_path, e))?;

        let shape = dataset.shape();
        let (rows, cols) = match shape.as_slice() {
            [rows, cols] => (*rows, *cols),
            other => {
                return Err(RadarError::corrupt(
                    data_path,
                    format!("expected a 2-D dataset, got shape {:?}", other),
                ))
            }
        };

        let data: Vec<f32> = dataset
            .read_raw::<f32>()
            .map_err(|e| RadarError::corrupt(&data_path, e))?;

        debug!(entry = %entry, rows, cols, "Read layer data");

        LayerArray::new(rows, cols, data).ok_or_else(|| {
            RadarError::corrupt(data_path, "element count does not match the dataset shape")
        })
    }
}

/// Check if a group has an attribute with the given name.
fn has_attr(group: &hdf5::Group, name: &str) -> bool {
    group
        .attr_names()
        .map(|names| names.iter().any(|n| n == name))
        .unwrap_or(false)
}

/// Read a numeric attribute stored as a scalar or one-element array.
fn read_f64_attr(group: &hdf5::Group, entry: &str, name: &str) -> RadarResult<f64> {
    if !has_attr(group, name) {
        return Err(RadarError::corrupt(
            entry,
            format!("attribute '{}' is missing", name),
        ));
    }

    let values = group
        .attr(name)
        .and_then(|attr| attr.read_raw::<f64>())
        .map_err(|e| RadarError::corrupt(entry, format!("attribute '{}': {}", name, e)))?;

    values.first().copied().ok_or_else(|| {
        RadarError::corrupt(entry, format!("attribute '{}' is empty", name))
    })
}

/// Read a string attribute in any of the HDF5 string encodings.
///
/// NUL padding and surrounding whitespace are trimmed.
fn read_string_attr(group: &hdf5::Group, entry: &str, name: &str) -> RadarResult<String> {
    if !has_attr(group, name) {
        return Err(RadarError::corrupt(
            entry,
            format!("attribute '{}' is missing", name),
        ));
    }

    let err = |e: hdf5::Error| RadarError::corrupt(entry, format!("attribute '{}': {}", name, e));

    let attr = group.attr(name).map_err(err)?;
    let descriptor = attr.dtype().and_then(|t| t.to_descriptor()).map_err(err)?;

    let value = match descriptor {
        TypeDescriptor::FixedAscii(_) => first(attr.read_raw::<FixedAscii<1024>>().map_err(err)?)
            .map(|s| s.as_str().to_string()),
        TypeDescriptor::FixedUnicode(_) => {
            first(attr.read_raw::<FixedUnicode<1024>>().map_err(err)?)
                .map(|s| s.as_str().to_string())
        }
        TypeDescriptor::VarLenAscii => first(attr.read_raw::<VarLenAscii>().map_err(err)?)
            .map(|s| s.as_str().to_string()),
        TypeDescriptor::VarLenUnicode => first(attr.read_raw::<VarLenUnicode>().map_err(err)?)
            .map(|s| s.as_str().to_string()),
        other => {
            return Err(RadarError::corrupt(
                entry,
                format!("attribute '{}' is not a string (found {:?})", name, other),
            ))
        }
    };

    value
        .map(|s| s.trim_end_matches('\0').trim().to_string())
        .ok_or_else(|| RadarError::corrupt(entry, format!("attribute '{}' is empty", name)))
}

fn first<T>(values: Vec<T>) -> Option<T> {
    values.into_iter().next()
}
