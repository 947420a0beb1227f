//! Radar frame access for HDF5 nowcast containers.
//!
//! A container holds one grid description and a handful of time-stamped
//! layers (radar scans or forecast steps). [`FrameStore`] opens the
//! container, validates the grid description eagerly, and loads each layer's
//! 2-D array the first time it is requested.
//!
//! # Example
//!
//! ```ignore
//! use h5_radar::FrameStore;
//!
//! let mut store = FrameStore::open("RAD_NL25_RAC_FM_202401010000.h5")?;
//! for layer in store.list_layers_sorted()? {
//!     let rate = store.rate_at_geo(&layer.name, 5.18, 52.10)?;
//!     println!("{} {:.2} mm/h", layer.valid_datetime, rate);
//! }
//! store.export("image1", "image1.tif".as_ref())?;
//! ```
//!
//! # Caveat
//!
//! A raw value of 0 means both "no precipitation" and "no measurement". The
//! archive does not distinguish the two and neither does this crate.

mod accessor;
pub mod container;
mod export;
pub mod layer;
pub mod store;

pub use container::{H5Container, OpenOptions, RadarContainer};
pub use layer::{LayerArray, LayerDescriptor};
pub use store::FrameStore;

pub use radar_common::{GeoPoint, GridIndex, GridMetadata, NativePoint, RadarError, RadarResult};
pub use raster_export::ExportSummary;
