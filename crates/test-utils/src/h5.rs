//! HDF5 radar containers in the archive's layout.
//!
//! ```text
//! /geographic                      geo_row_offset, geo_number_columns, geo_number_rows
//! /geographic/map_projection       projection_proj4_params
//! /image1 .. /imageN               image_datetime_valid
//! /imageN/image_data               u16 [rows x cols]
//! /overview                        (not a layer)
//! ```
//!
//! Fixtures live in a temporary directory that is removed when the
//! [`RadarFixture`] is dropped.

use std::path::{Path, PathBuf};

use hdf5::types::{FixedAscii, VarLenUnicode};
use tempfile::TempDir;

use crate::fixtures::knmi;

/// How string attributes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// Fixed-length, NUL padded ASCII (what the archive writes)
    Fixed,
    /// Variable-length UTF-8
    VarLen,
}

#[derive(Debug, Clone)]
struct FixtureLayer {
    name: String,
    valid_time: Option<String>,
    shape: (usize, usize),
    data: Vec<u16>,
}

/// Builder for [`RadarFixture`].
#[derive(Debug, Clone)]
pub struct RadarFixtureBuilder {
    file_name: String,
    row_offset: f32,
    columns: f64,
    rows: f64,
    proj4: Option<String>,
    omit_geographic: Vec<String>,
    encoding: StringEncoding,
    layers: Vec<FixtureLayer>,
}

impl RadarFixtureBuilder {
    /// Full-size national composite grid, no layers yet.
    pub fn knmi() -> Self {
        Self::with_dimensions(knmi::ROWS, knmi::COLUMNS)
    }

    /// The archive projection and row offset with a custom grid size.
    pub fn with_dimensions(rows: usize, columns: usize) -> Self {
        Self {
            file_name: "RAD_NL25_RAC_FM_202401010000.h5".to_string(),
            row_offset: knmi::ROW_OFFSET as f32,
            columns: columns as f64,
            rows: rows as f64,
            proj4: Some(knmi::PROJ4.to_string()),
            omit_geographic: Vec::new(),
            encoding: StringEncoding::Fixed,
            layers: Vec::new(),
        }
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    pub fn row_offset(mut self, offset: f32) -> Self {
        self.row_offset = offset;
        self
    }

    /// Store raw dimension values, e.g. to write a fractional column count.
    pub fn raw_dimensions(mut self, rows: f64, columns: f64) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn proj4(mut self, definition: &str) -> Self {
        self.proj4 = Some(definition.to_string());
        self
    }

    /// Leave out the projection attribute entirely.
    pub fn without_proj4(mut self) -> Self {
        self.proj4 = None;
        self
    }

    /// Leave out one of the `/geographic` attributes.
    pub fn without_geographic_attr(mut self, name: &str) -> Self {
        self.omit_geographic.push(name.to_string());
        self
    }

    pub fn string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Add a layer whose data matches the grid dimensions.
    pub fn layer(self, name: &str, valid_time: &str, data: Vec<u16>) -> Self {
        let shape = (self.rows as usize, self.columns as usize);
        self.layer_with_shape(name, Some(valid_time), shape, data)
    }

    /// Add a layer without the valid-time attribute.
    pub fn layer_without_time(self, name: &str, data: Vec<u16>) -> Self {
        let shape = (self.rows as usize, self.columns as usize);
        self.layer_with_shape(name, None, shape, data)
    }

    /// Add a layer with an explicit (possibly mismatched) shape.
    pub fn layer_with_shape(
        mut self,
        name: &str,
        valid_time: Option<&str>,
        shape: (usize, usize),
        data: Vec<u16>,
    ) -> Self {
        assert_eq!(
            shape.0 * shape.1,
            data.len(),
            "fixture layer '{}' data does not match its shape",
            name
        );
        self.layers.push(FixtureLayer {
            name: name.to_string(),
            valid_time: valid_time.map(str::to_string),
            shape,
            data,
        });
        self
    }

    /// Write the container.
    pub fn build(self) -> hdf5::Result<RadarFixture> {
        let dir = tempfile::Builder::new()
            .prefix("radar_fixture_")
            .tempdir()
            .map_err(|e| hdf5::Error::from(e.to_string()))?;
        let path = dir.path().join(&self.file_name);

        self.write(&path)?;

        Ok(RadarFixture { dir, path })
    }

    fn write(&self, path: &Path) -> hdf5::Result<()> {
        let file = hdf5::File::create(path)?;

        let geographic = file.create_group("geographic")?;
        if !self.omitted("geo_row_offset") {
            geographic
                .new_attr::<f32>()
                .shape(1)
                .create("geo_row_offset")?
                .write_raw(&[self.row_offset])?;
        }
        if !self.omitted("geo_number_columns") {
            geographic
                .new_attr::<f64>()
                .shape(1)
                .create("geo_number_columns")?
                .write_raw(&[self.columns])?;
        }
        if !self.omitted("geo_number_rows") {
            geographic
                .new_attr::<f64>()
                .shape(1)
                .create("geo_number_rows")?
                .write_raw(&[self.rows])?;
        }

        let map_projection = geographic.create_group("map_projection")?;
        if let Some(proj4) = &self.proj4 {
            self.write_string_attr(&map_projection, "projection_proj4_params", proj4)?;
        }

        let overview = file.create_group("overview")?;
        self.write_string_attr(&overview, "product_group_name", "RAD_NL25_RAC_FM")?;

        for layer in &self.layers {
            let group = file.create_group(&layer.name)?;
            if let Some(valid_time) = &layer.valid_time {
                self.write_string_attr(&group, "image_datetime_valid", valid_time)?;
            }
            group
                .new_dataset::<u16>()
                .shape(layer.shape)
                .create("image_data")?
                .write_raw(layer.data.as_slice())?;
        }

        Ok(())
    }

    fn omitted(&self, name: &str) -> bool {
        self.omit_geographic.iter().any(|n| n == name)
    }

    fn write_string_attr(&self, group: &hdf5::Group, name: &str, value: &str) -> hdf5::Result<()> {
        match self.encoding {
            StringEncoding::Fixed => {
                let fixed = FixedAscii::<256>::from_ascii(value.as_bytes())
                    .map_err(|e| hdf5::Error::from(e.to_string()))?;
                group
                    .new_attr::<FixedAscii<256>>()
                    .shape(())
                    .create(name)?
                    .write_scalar(&fixed)?;
            }
            StringEncoding::VarLen => {
                let varlen: VarLenUnicode = value
                    .parse()
                    .map_err(|e: hdf5::types::StringError| hdf5::Error::from(e.to_string()))?;
                group
                    .new_attr::<VarLenUnicode>()
                    .shape(())
                    .create(name)?
                    .write_scalar(&varlen)?;
            }
        }
        Ok(())
    }
}

/// A radar container written to a temporary directory.
#[derive(Debug)]
pub struct RadarFixture {
    dir: TempDir,
    path: PathBuf,
}

impl RadarFixture {
    pub fn builder() -> RadarFixtureBuilder {
        RadarFixtureBuilder::knmi()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the container; removed with the fixture.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
