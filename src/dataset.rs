//! The dataset handle
//!
//! A [`Dataset`] holds exactly one open [`DataReader`] between [`Dataset::open`]
//! and [`Dataset::close`]. Metadata is snapshotted at open time; element data is
//! read on demand and every [`MaterializedArray`] handed out is an independent
//! copy, so it stays valid after the handle is closed.
//!
//! The reader is not required to be `Send` or `Sync`, which keeps a handle on
//! the thread that opened it. Independent handles to the same file may coexist.

use crate::array::MaterializedArray;
use crate::data_source::DataReader;
use crate::errors::{Missing, NcReaderError, Result};
use crate::metadata::{Dimension, FileInfo, Variable};
use crate::netcdf_io::NetCdfReader;
use crate::slice::{self, ResolvedSlice, Selector, SliceSpec};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub struct Dataset {
    path: String,
    format: String,
    file_size_bytes: Option<u64>,
    reader: Option<Box<dyn DataReader>>,
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
    attributes: BTreeMap<String, JsonValue>,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("dimensions", &self.dimensions.len())
            .field("variables", &self.variables.len())
            .finish()
    }
}

impl Dataset {
    /// Opens a NetCDF file.
    ///
    /// # Errors
    ///
    /// `NotFound` when `path` does not exist, `FormatError` when it cannot be
    /// parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = NetCdfReader::open(path)?;
        let mut dataset = Self::from_reader(path.display().to_string(), reader)?;
        dataset.file_size_bytes = std::fs::metadata(path).ok().map(|m| m.len());
        info!(path = %dataset.path, "opened dataset");
        Ok(dataset)
    }

    /// Wraps an already open reader, taking ownership of it.
    pub fn from_reader(name: impl Into<String>, reader: impl DataReader + 'static) -> Result<Self> {
        let dimensions = reader.dimensions()?;
        let variables = reader.variables()?;
        let attributes = reader.global_attributes()?;
        let dataset = Self {
            path: name.into(),
            format: reader.format_name().to_string(),
            file_size_bytes: None,
            reader: Some(Box::new(reader)),
            dimensions,
            variables,
            attributes,
        };
        debug!(
            path = %dataset.path,
            dimensions = dataset.dimensions.len(),
            variables = dataset.variables.len(),
            "loaded metadata"
        );
        Ok(dataset)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Releases the underlying container. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            info!(path = %self.path, "closed dataset");
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Result<&Dimension> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| NcReaderError::NotFound {
                kind: Missing::Dimension,
                name: name.to_string(),
            })
    }

    /// Variables in container order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Result<&Variable> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| NcReaderError::variable_not_found(name))
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Global attributes
    pub fn attributes(&self) -> &BTreeMap<String, JsonValue> {
        &self.attributes
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            path: self.path.clone(),
            file_size_bytes: self.file_size_bytes,
            format: self.format.clone(),
            num_dimensions: self.dimensions.len(),
            num_variables: self.variables.len(),
            num_global_attributes: self.attributes.len(),
        }
    }

    fn reader(&self) -> Result<&dyn DataReader> {
        self.reader
            .as_deref()
            .ok_or_else(|| NcReaderError::DatasetClosed {
                path: self.path.clone(),
            })
    }

    /// Applies `spec` to a variable and materializes the result.
    ///
    /// The specification is validated in full before any data is read, and
    /// only the block bounding the selection is read.
    pub fn slice(&self, var_name: &str, spec: &SliceSpec) -> Result<MaterializedArray> {
        let variable = self.variable(var_name)?;
        let resolved = ResolvedSlice::resolve(variable, spec)?;
        let reader = self.reader()?;
        let values = if resolved.block_len() == 0 {
            Vec::new()
        } else {
            reader.read_values(variable, &resolved.block())?
        };
        slice::materialize_resolved(variable, values, &resolved)
    }

    /// Reads a whole variable.
    pub fn read(&self, var_name: &str) -> Result<MaterializedArray> {
        self.slice(var_name, &SliceSpec::new())
    }

    /// Selects rows along `dimension`, or along the variable's first
    /// dimension when none is given.
    pub fn read_rows(
        &self,
        var_name: &str,
        dimension: Option<&str>,
        rows: Selector,
    ) -> Result<MaterializedArray> {
        let variable = self.variable(var_name)?;
        let dim = match dimension {
            Some(dim) => dim.to_string(),
            None => variable.dimensions.first().cloned().ok_or_else(|| {
                NcReaderError::UnsupportedRank {
                    var: var_name.to_string(),
                    rank: 0,
                    operation: "select rows of",
                }
            })?,
        };
        self.slice(var_name, &SliceSpec::new().with(dim, rows))
    }
}

/// Opens `path`, runs `f` on the dataset and closes it on every exit path.
pub fn with_dataset<T>(path: impl AsRef<Path>, f: impl FnOnce(&Dataset) -> Result<T>) -> Result<T> {
    let mut dataset = Dataset::open(path)?;
    let result = f(&dataset);
    dataset.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::MemoryReader;
    use crate::errors::ErrorKind;
    use std::cell::RefCell;
    use std::ops::Range;
    use std::rc::Rc;

    /// Forwards to a [`MemoryReader`] and records every block requested
    struct RecordingReader {
        inner: MemoryReader,
        requests: Rc<RefCell<Vec<Vec<Range<usize>>>>>,
    }

    impl DataReader for RecordingReader {
        fn format_name(&self) -> &str {
            self.inner.format_name()
        }

        fn dimensions(&self) -> Result<Vec<Dimension>> {
            self.inner.dimensions()
        }

        fn variables(&self) -> Result<Vec<Variable>> {
            self.inner.variables()
        }

        fn global_attributes(&self) -> Result<BTreeMap<String, JsonValue>> {
            self.inner.global_attributes()
        }

        fn read_values(&self, variable: &Variable, block: &[Range<usize>]) -> Result<Vec<f64>> {
            self.requests.borrow_mut().push(block.to_vec());
            self.inner.read_values(variable, block)
        }
    }

    fn dataset() -> Result<Dataset> {
        let reader = MemoryReader::new()
            .with_dimension("time", 3)
            .with_dimension("lat", 2)
            .with_attribute("title", "Test Dataset")
            .with_variable("temperature", &["time", "lat"], (0..6).map(f64::from).collect())?;
        Dataset::from_reader("memory", reader)
    }

    #[test]
    fn exposes_metadata() -> Result<()> {
        let ds = dataset()?;
        assert_eq!(ds.dimensions().len(), 2);
        assert_eq!(ds.dimension("lat")?.len, 2);
        assert_eq!(ds.variable_names(), vec!["temperature"]);
        assert_eq!(ds.info().num_global_attributes, 1);
        assert_eq!(
            ds.variable("salinity").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        Ok(())
    }

    #[test]
    fn arrays_outlive_close() -> Result<()> {
        let mut ds = dataset()?;
        let array = ds.read("temperature")?;
        ds.close();
        ds.close();
        assert!(!ds.is_open());
        assert_eq!(array.get(&[2, 1]), Some(5.0));
        assert_eq!(
            ds.read("temperature").unwrap_err().kind(),
            ErrorKind::DatasetClosed
        );
        // metadata is a snapshot and remains readable
        assert_eq!(ds.variables().len(), 1);
        Ok(())
    }

    #[test]
    fn validation_happens_before_reading() -> Result<()> {
        let mut ds = dataset()?;
        ds.close();
        let err = ds
            .slice("temperature", &SliceSpec::new().with("depth", Selector::Full))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownDimension);
        Ok(())
    }

    #[test]
    fn read_rows_defaults_to_first_dimension() -> Result<()> {
        let ds = dataset()?;
        let rows = ds.read_rows("temperature", None, Selector::Range { start: 1, end: 3 })?;
        assert_eq!(rows.shape(), &[2, 2]);
        assert_eq!(rows.get(&[0, 0]), Some(2.0));

        let column = ds.read_rows("temperature", Some("lat"), Selector::Index(1))?;
        assert_eq!(column.dims(), &["time"]);
        assert_eq!(column.iter_valid().collect::<Vec<_>>(), vec![1.0, 3.0, 5.0]);

        let err = ds
            .read_rows("temperature", Some("depth"), Selector::Index(0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownDimension);
        Ok(())
    }

    #[test]
    fn slices_read_only_their_bounding_block() -> Result<()> {
        let requests = Rc::new(RefCell::new(Vec::new()));
        let inner = MemoryReader::new()
            .with_dimension("time", 10)
            .with_dimension("lat", 4)
            .with_dimension("lon", 5)
            .with_variable("t", &["time", "lat", "lon"], (0..200).map(f64::from).collect())?;
        let ds = Dataset::from_reader(
            "memory",
            RecordingReader {
                inner,
                requests: Rc::clone(&requests),
            },
        )?;

        let spec = SliceSpec::new()
            .with("time", Selector::Index(6))
            .with("lon", Selector::Indices(vec![3, 1]));
        let array = ds.slice("t", &spec)?;
        assert_eq!(requests.borrow().as_slice(), &[vec![6..7, 0..4, 1..4]]);
        assert_eq!(array.shape(), &[4, 2]);
        // [6, 2, 3] = 6*20 + 2*5 + 3
        assert_eq!(array.get(&[2, 0]), Some(133.0));
        assert_eq!(array.get(&[2, 1]), Some(131.0));

        let empty = ds.slice("t", &SliceSpec::new().with("lat", Selector::Indices(vec![])))?;
        assert!(empty.is_empty());
        assert_eq!(requests.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn open_missing_path_is_not_found() {
        let err = Dataset::open("/definitely/not/here.nc").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
