//! Local container commands.

use std::path::Path;

use anyhow::{Context, Result};
use h5_radar::FrameStore;
use tracing::info;

fn open(path: &Path) -> Result<FrameStore> {
    FrameStore::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

/// Print every layer with its valid time, oldest first.
pub fn layers(path: &Path) -> Result<()> {
    let store = open(path)?;
    let metadata = store.metadata();
    println!(
        "# {} ({} rows x {} cols, row offset {})",
        path.display(),
        metadata.num_rows,
        metadata.num_columns,
        metadata.row_offset
    );

    for layer in store.list_layers_sorted()? {
        println!("{}\t{}", layer.name, layer.valid_datetime.to_rfc3339());
    }
    Ok(())
}

/// Print the value at a WGS84 point.
pub fn value(path: &Path, layer: &str, lng: f64, lat: f64, raw: bool) -> Result<()> {
    let mut store = open(path)?;
    if raw {
        println!("{}", store.value_at_geo(layer, lng, lat)?);
    } else {
        println!("{:.2} mm/h", store.rate_at_geo(layer, lng, lat)?);
    }
    Ok(())
}

/// Print the value of a grid cell.
pub fn cell(path: &Path, layer: &str, row: i64, col: i64, raw: bool) -> Result<()> {
    let mut store = open(path)?;
    if raw {
        println!("{}", store.value_at_grid(layer, row, col)?);
    } else {
        println!("{:.2} mm/h", store.rate_at_grid(layer, row, col)?);
    }
    Ok(())
}

/// Export one layer as a WGS84 GeoTIFF.
pub fn export(path: &Path, layer: &str, output: &Path) -> Result<()> {
    let mut store = open(path)?;
    let summary = store
        .export(layer, output)
        .with_context(|| format!("Failed to export layer {}", layer))?;

    info!(
        output = %summary.path.display(),
        width = summary.width,
        height = summary.height,
        "Export finished"
    );
    Ok(())
}
