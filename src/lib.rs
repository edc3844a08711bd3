//! ncreader: dimension-aware access to NetCDF variables
//!
//! Open a NetCDF file, select parts of its variables by dimension name, and
//! hand the selection to statistics, tabular export or plot preparation.
//! Missing values (`_FillValue`, `missing_value`, the valid range, NaN) are
//! carried as a mask on every materialized array and never leak into results
//! as numbers.
//!
//! ## Module Organization
//!
//! - [`dataset`]: the [`Dataset`] handle and scoped [`with_dataset`] use
//! - [`slice`]: [`SliceSpec`] and its resolution against a variable
//! - [`array`]: [`MaterializedArray`], the masked result of a slice
//! - [`masking`]: missing-value detection and unpacking
//! - [`statistics`]: [`Summary`] over non-missing values, computed in parallel
//! - [`export`]: rank 1 and rank 2 arrays as CSV tables
//! - [`plot`] and [`render`]: plot preparation and PNG output
//! - [`metadata`], [`data_source`], [`netcdf_io`]: file description and I/O
//! - [`parallel`]: thread pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ncreader::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     with_dataset("data.nc", |ds| {
//!         let spec = SliceSpec::new().with("time", Selector::Index(0));
//!         let array = ds.slice("temperature", &spec)?;
//!
//!         let summary = statistics(&array)?;
//!         println!("{} valid values, mean {}", summary.count, summary.mean);
//!
//!         export(&array)?.write_csv_file(Path::new("temperature.csv"), &ExportOptions::default())
//!     })
//! }
//! ```

pub mod array;
pub mod cli;
pub mod data_source;
pub mod dataset;
pub mod errors;
pub mod export;
pub mod masking;
pub mod metadata;
pub mod netcdf_io;
pub mod parallel;
pub mod plot;
pub mod render;
pub mod slice;
pub mod statistics;

pub use array::MaterializedArray;
pub use dataset::{with_dataset, Dataset};
pub use errors::{ErrorKind, NcReaderError, Result};
pub use export::{export, ExportOptions, Table};
pub use plot::{prepare_for_plot, PlotSpec};
pub use slice::{Selector, SliceSpec};
pub use statistics::{statistics, Summary};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::array::MaterializedArray;
    pub use crate::data_source::{DataReader, MemoryReader};
    pub use crate::dataset::{with_dataset, Dataset};
    pub use crate::errors::{ErrorKind, NcReaderError, Result};
    pub use crate::export::{export, ExportOptions, Table};
    pub use crate::metadata::{Dimension, Variable};
    pub use crate::netcdf_io::NetCDFWriter;
    pub use crate::parallel::ParallelConfig;
    pub use crate::plot::{prepare_for_plot, PlotSpec};
    pub use crate::render::{BitmapRenderer, PlotOptions, PlotRenderer};
    pub use crate::slice::{Selector, SliceSpec};
    pub use crate::statistics::{statistics, Summary};
}
