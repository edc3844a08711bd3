//! Command-line interface options for the ncreader binary, defined with `clap`.

use crate::errors::{NcReaderError, Result};
use crate::export::{ExportOptions, DEFAULT_MISSING_MARKER};
use crate::render::PlotOptions;
use crate::slice::{Selector, SliceSpec};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Inspect, slice, summarize, export and plot NetCDF variables
#[derive(Parser, Debug)]
#[command(name = "ncreader", version, about = "Read and analyze NetCDF files")]
pub struct Args {
    /// Path to the NetCDF file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Print file information (default when no other action is given)
    #[arg(long)]
    pub info: bool,

    /// List all variables with their dimensions
    #[arg(long)]
    pub list_vars: bool,

    /// Describe a variable (dimensions, shape, data type and attributes)
    #[arg(long, value_name = "VAR")]
    pub describe: Option<String>,

    /// Compute statistics (count/min/max/mean/std) of a variable, ignoring missing values
    #[arg(long, value_name = "VAR")]
    pub summary: Option<String>,

    /// Print the summary as JSON
    #[arg(long, requires = "summary")]
    pub json: bool,

    /// Read a variable and preview its values
    #[arg(long, value_name = "VAR")]
    pub read: Option<String>,

    /// Read rows of a variable, formatted as <var>:<index> or <var>:<start>:<end>
    #[arg(long, value_name = "SPEC", value_parser = parse_row_arg)]
    pub read_row: Option<RowSpec>,

    /// Dimension used by --read-row (default: the variable's first dimension)
    #[arg(long, value_name = "DIM", requires = "read_row")]
    pub dimension: Option<String>,

    /// Select along a dimension: <dim>:<index>, <dim>:<start>:<end> or <dim>:<i>,<j>,...
    /// Repeatable; applies to --read, --summary, --plot and --export
    #[arg(long, value_name = "SLICE", value_parser = parse_slice_arg)]
    pub slice: Vec<(String, Selector)>,

    /// Plot a variable (line for 1-D, heatmap for 2-D, middle slice above that)
    #[arg(long, value_name = "VAR")]
    pub plot: Option<String>,

    /// Export a 1-D or 2-D (possibly sliced) variable to CSV
    #[arg(long, value_name = "VAR")]
    pub export: Option<String>,

    /// Output path for --plot or --export (default: <var>.png / <var>.csv).
    /// Names a single file, so it cannot be combined with both actions
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save the data read by --read to a new NetCDF file
    #[arg(long, requires = "read")]
    pub output_netcdf: Option<PathBuf>,

    /// Token for missing values in previews and CSV output
    #[arg(long, default_value = DEFAULT_MISSING_MARKER)]
    pub missing_marker: String,

    /// Single-character CSV field delimiter
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Columns shown by previews
    #[arg(long, default_value_t = 10)]
    pub max_cols: usize,

    /// Rows shown by previews
    #[arg(long, default_value_t = 20)]
    pub max_rows: usize,

    /// Plot width in pixels
    #[arg(long, default_value_t = 1000)]
    pub plot_width: u32,

    /// Plot height in pixels
    #[arg(long, default_value_t = 600)]
    pub plot_height: u32,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for statistics. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,
}

/// Rows requested by `--read-row`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    pub variable: String,
    pub rows: Selector,
}

impl Args {
    /// Whether any action flag was given
    pub fn has_action(&self) -> bool {
        self.info
            || self.list_vars
            || self.describe.is_some()
            || self.summary.is_some()
            || self.read.is_some()
            || self.read_row.is_some()
            || self.plot.is_some()
            || self.export.is_some()
    }

    /// Rejects `--output` together with both `--plot` and `--export`, where
    /// the CSV would overwrite the image.
    pub fn check_outputs(&self) -> std::result::Result<(), clap::Error> {
        if self.output.is_some() && self.plot.is_some() && self.export.is_some() {
            return Err(Self::command().error(
                ClapErrorKind::ArgumentConflict,
                "--output names one file; give it to only one of --plot and --export",
            ));
        }
        Ok(())
    }

    /// Later `--slice` flags for the same dimension win
    pub fn slice_spec(&self) -> SliceSpec {
        self.slice.iter().cloned().collect()
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            missing_marker: self.missing_marker.clone(),
            delimiter: self.delimiter,
        }
    }

    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            width: self.plot_width,
            height: self.plot_height,
        }
    }
}

fn parse_index(text: &str, what: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| NcReaderError::InvalidSlice {
            message: format!("invalid {what} '{text}'"),
        })
}

/// Parses the part after `<name>:`, i.e. `i`, `start:end` or `i,j,k`.
pub fn parse_axis_selector(text: &str) -> Result<Selector> {
    let parts: Vec<&str> = text.split(':').collect();
    match parts.as_slice() {
        [single] if single.contains(',') => single
            .split(',')
            .map(|i| parse_index(i, "index"))
            .collect::<Result<Vec<_>>>()
            .map(Selector::Indices),
        [single] => parse_index(single, "index").map(Selector::Index),
        [start, end] => Ok(Selector::Range {
            start: parse_index(start, "start index")?,
            end: parse_index(end, "end index")?,
        }),
        _ => Err(NcReaderError::InvalidSlice {
            message: format!("expected <index>, <start>:<end> or <i>,<j>,... but got '{text}'"),
        }),
    }
}

fn split_name(s: &str) -> Result<(&str, Option<&str>)> {
    let (name, rest) = match s.split_once(':') {
        Some((name, rest)) => (name, Some(rest)),
        None => (s, None),
    };
    if name.is_empty() {
        return Err(NcReaderError::InvalidSlice {
            message: format!("missing name in '{s}'"),
        });
    }
    Ok((name, rest))
}

/// `<dim>` alone selects the full axis
fn parse_slice_arg(s: &str) -> std::result::Result<(String, Selector), String> {
    let (dim, rest) = split_name(s).map_err(|e| e.to_string())?;
    let selector = match rest {
        Some(rest) => parse_axis_selector(rest).map_err(|e| e.to_string())?,
        None => Selector::Full,
    };
    Ok((dim.to_string(), selector))
}

fn parse_row_arg(s: &str) -> std::result::Result<RowSpec, String> {
    let (variable, rest) = split_name(s).map_err(|e| e.to_string())?;
    let rest = rest.ok_or_else(|| {
        "Invalid format: Expected '<variable>:<index>' or '<variable>:<start>:<end>'".to_string()
    })?;
    let rows = match parse_axis_selector(rest).map_err(|e| e.to_string())? {
        Selector::Indices(_) => {
            return Err("row lists are not supported, use --slice instead".to_string())
        }
        rows => rows,
    };
    Ok(RowSpec {
        variable: variable.to_string(),
        rows,
    })
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_forms() {
        assert_eq!(parse_axis_selector("3").unwrap(), Selector::Index(3));
        assert_eq!(
            parse_axis_selector("2:8").unwrap(),
            Selector::Range { start: 2, end: 8 }
        );
        assert_eq!(
            parse_axis_selector("0,2,4").unwrap(),
            Selector::Indices(vec![0, 2, 4])
        );
        assert!(matches!(
            parse_axis_selector("1:2:3"),
            Err(NcReaderError::InvalidSlice { .. })
        ));
        assert!(parse_axis_selector("x").is_err());
    }

    #[test]
    fn slice_flags_build_a_spec() {
        let args = Args::try_parse_from([
            "ncreader",
            "-f",
            "data.nc",
            "--read",
            "temperature",
            "--slice",
            "time:0",
            "--slice",
            "lat:10:20",
            "--slice",
            "time:5",
            "--slice",
            "lon",
        ])
        .unwrap();
        let spec = args.slice_spec();
        assert_eq!(spec.get("time"), Some(&Selector::Index(5)));
        assert_eq!(spec.get("lat"), Some(&Selector::Range { start: 10, end: 20 }));
        assert_eq!(spec.get("lon"), Some(&Selector::Full));
        assert!(args.has_action());
    }

    #[test]
    fn read_row_and_defaults() {
        let args = Args::try_parse_from([
            "ncreader",
            "-f",
            "data.nc",
            "--read-row",
            "temperature:0:5",
            "--dimension",
            "lat",
        ])
        .unwrap();
        assert_eq!(
            args.read_row,
            Some(RowSpec {
                variable: "temperature".to_string(),
                rows: Selector::Range { start: 0, end: 5 },
            })
        );
        assert_eq!(args.export_options(), ExportOptions::default());
        assert_eq!(args.plot_options(), PlotOptions::default());
        assert_eq!((args.max_cols, args.max_rows), (10, 20));

        assert!(
            Args::try_parse_from(["ncreader", "-f", "a.nc", "--read-row", "temperature"]).is_err()
        );
        assert!(Args::try_parse_from(["ncreader", "-f", "a.nc", "--delimiter", ";;"]).is_err());
    }

    #[test]
    fn output_is_not_shared_by_plot_and_export() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["ncreader", "-f", "data.nc"];
            argv.extend_from_slice(extra);
            Args::try_parse_from(argv).unwrap()
        };

        let both = parse(&["--plot", "t", "--export", "t", "-o", "out.png"]);
        let err = both.check_outputs().unwrap_err();
        assert_eq!(err.kind(), ClapErrorKind::ArgumentConflict);

        assert!(parse(&["--plot", "t", "--export", "t"]).check_outputs().is_ok());
        assert!(parse(&["--plot", "t", "-o", "out.png"]).check_outputs().is_ok());
        assert!(parse(&["--export", "t", "-o", "out.csv"]).check_outputs().is_ok());
    }

    #[test]
    fn no_action_by_default() {
        let args = Args::try_parse_from(["ncreader", "-f", "data.nc"]).unwrap();
        assert!(!args.has_action());
        assert!(args.slice_spec().is_empty());
    }
}
