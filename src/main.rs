//! Entry point for the ncreader binary.
//! Handles CLI parsing and logging setup, then dispatches the requested
//! actions against one dataset handle that is closed on every exit path.

use clap::Parser;
use ncreader::cli::Args;
use ncreader::dataset::{with_dataset, Dataset};
use ncreader::errors::Result;
use ncreader::export::export;
use ncreader::metadata::{describe_variable, list_variables, print_file_info};
use ncreader::netcdf_io::NetCDFWriter;
use ncreader::parallel::{get_parallel_info, ParallelConfig};
use ncreader::plot::prepare_for_plot;
use ncreader::render::{BitmapRenderer, PlotRenderer};
use ncreader::statistics::statistics;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = args.check_outputs() {
        err.exit();
    }

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    ParallelConfig::new(args.threads).setup_global_pool()?;
    get_parallel_info().log();

    with_dataset(&args.file, |dataset| dispatch(args, dataset))
}

fn output_path(args: &Args, var: &str, extension: &str) -> PathBuf {
    args.output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{var}.{extension}")))
}

fn dispatch(args: &Args, dataset: &Dataset) -> Result<()> {
    let spec = args.slice_spec();
    let default_action = !args.has_action();

    if args.info || default_action {
        print_file_info(dataset);
    }

    if args.list_vars || default_action {
        list_variables(dataset);
    }

    if let Some(var) = &args.describe {
        describe_variable(dataset, var)?;
    }

    if let Some(var) = &args.summary {
        let summary = statistics(&dataset.slice(var, &spec)?)?;
        if args.json {
            println!("{:#}", summary.to_json());
        } else {
            summary.print();
        }
    }

    if let Some(var) = &args.read {
        let array = dataset.slice(var, &spec)?;
        array.print_preview(args.max_cols, args.max_rows, &args.missing_marker);

        if let Some(path) = &args.output_netcdf {
            NetCDFWriter::new(path).write_array(&array, dataset.variable(var)?)?;
            println!("Saved result to {}", path.display());
        }
    }

    if let Some(row) = &args.read_row {
        let array = dataset.read_rows(&row.variable, args.dimension.as_deref(), row.rows.clone())?;
        array.print_preview(args.max_cols, args.max_rows, &args.missing_marker);
    }

    if let Some(var) = &args.plot {
        let plot = prepare_for_plot(&dataset.slice(var, &spec)?)?;
        let path = output_path(args, var, "png");
        BitmapRenderer::new(&path, args.plot_options()).render(&plot)?;
        println!("Plot saved to: {}", path.display());
    }

    if let Some(var) = &args.export {
        let table = export(&dataset.slice(var, &spec)?)?;
        let path = output_path(args, var, "csv");
        table.write_csv_file(&path, &args.export_options())?;
        println!("Data exported to: {}", path.display());
    }

    Ok(())
}
