//! The frame store: one opened container, its grid description and a cache
//! of loaded layers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use projection::RadarTransform;
use radar_common::{parse_valid_time, GridMetadata, RadarError, RadarResult};
use tracing::{debug, info};

use crate::container::{H5Container, OpenOptions, RadarContainer};
use crate::layer::{LayerArray, LayerDescriptor};

/// Substring that marks a top-level entry as a layer.
const LAYER_MARKER: &str = "image";

/// An opened radar container.
///
/// Metadata and the coordinate transform are read once at open time. Layer
/// arrays are read on first request and kept until the store is dropped.
/// Not safe for concurrent use; wrap it in a lock to share it.
#[derive(Debug)]
pub struct FrameStore<C = H5Container> {
    container: C,
    path: PathBuf,
    metadata: GridMetadata,
    transform: RadarTransform,
    cache: HashMap<String, Arc<LayerArray>>,
}

impl FrameStore<H5Container> {
    /// Open an HDF5 container with default options.
    pub fn open(path: impl AsRef<Path>) -> RadarResult<Self> {
        Self::open_with(path, &OpenOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> RadarResult<Self> {
        let path = path.as_ref();
        let container = H5Container::open(path, options)?;
        Self::from_container(container, path)
    }
}

impl<C: RadarContainer> FrameStore<C> {
    /// Wrap an already opened container.
    ///
    /// Reads and validates the grid description and builds the transform.
    /// No layer data is read.
    pub fn from_container(container: C, path: impl Into<PathBuf>) -> RadarResult<Self> {
        let path = path.into();
        let metadata = container.read_metadata()?;
        let transform = RadarTransform::from_metadata(&metadata)
            .map_err(|e| RadarError::corrupt("geographic/map_projection", e))?;

        info!(
            path = %path.display(),
            rows = metadata.num_rows,
            cols = metadata.num_columns,
            row_offset = metadata.row_offset,
            "Opened radar container"
        );

        Ok(Self {
            container,
            path,
            metadata,
            transform,
            cache: HashMap::new(),
        })
    }

    pub fn metadata(&self) -> &GridMetadata {
        &self.metadata
    }

    pub fn transform(&self) -> &RadarTransform {
        &self.transform
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All layers in container order.
    ///
    /// Entries whose name contains "image" are layers; any other entry is
    /// ignored. A layer whose valid time is missing or unparsable fails the
    /// whole listing.
    pub fn list_layers(&self) -> RadarResult<Vec<LayerDescriptor>> {
        let mut layers = Vec::new();

        for name in self.container.entry_names()? {
            if !name.contains(LAYER_MARKER) {
                debug!(entry = %name, "Skipping non-layer entry");
                continue;
            }

            let raw = self.container.read_valid_time(&name)?;
            let valid_datetime =
                parse_valid_time(&raw).map_err(|e| RadarError::corrupt(name.as_str(), e))?;

            layers.push(LayerDescriptor {
                name,
                valid_datetime,
            });
        }

        debug!(count = layers.len(), "Listed layers");
        Ok(layers)
    }

    /// Layers ordered by valid time, ties by name.
    pub fn list_layers_sorted(&self) -> RadarResult<Vec<LayerDescriptor>> {
        let mut layers = self.list_layers()?;
        layers.sort_by(|a, b| {
            a.valid_datetime
                .cmp(&b.valid_datetime)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(layers)
    }

    /// Array of a layer, read from the container on first access.
    ///
    /// Repeated calls return the same cached array.
    pub fn get_layer(&mut self, name: &str) -> RadarResult<Arc<LayerArray>> {
        if let Some(layer) = self.cache.get(name) {
            return Ok(Arc::clone(layer));
        }

        if !name.contains(LAYER_MARKER) {
            return Err(RadarError::corrupt(name, "entry is not a layer"));
        }

        let layer = self.container.read_layer(name)?;
        if layer.rows() != self.metadata.num_rows || layer.cols() != self.metadata.num_columns {
            return Err(RadarError::corrupt(
                name,
                format!(
                    "layer shape {}x{} does not match grid {}x{}",
                    layer.rows(),
                    layer.cols(),
                    self.metadata.num_rows,
                    self.metadata.num_columns
                ),
            ));
        }

        debug!(layer = %name, "Cached layer");
        let layer = Arc::new(layer);
        self.cache.insert(name.to_string(), Arc::clone(&layer));
        Ok(layer)
    }

    pub fn cached_layer_count(&self) -> usize {
        self.cache.len()
    }

    /// Release the container and all cached layers.
    ///
    /// Arrays handed out by [`get_layer`](Self::get_layer) stay valid.
    pub fn close(self) {
        debug!(path = %self.path.display(), "Closed radar container");
    }
}
