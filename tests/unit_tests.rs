//! Tests for the NetCDF-facing modules: metadata snapshots, attribute
//! conversion, masking and unpacking of stored values, and slice export.

use ncreader::{
    data_source::{DataReader, MemoryReader},
    dataset::Dataset,
    errors::{ErrorKind, Result},
    metadata::{describe_variable, format_attribute, format_size, list_variables, print_file_info},
    netcdf_io::{NetCDFWriter, NetCdfReader, EXPORT_FILL_VALUE},
    parallel::{get_parallel_info, ParallelConfig},
    slice::{Selector, SliceSpec},
    statistics::statistics,
};
use netcdf::create;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// A small file exercising the masking attributes:
/// - `pressure(y, x)`: short, packed with scale 0.5 / offset 100, fill -1,
///   plus integer attributes
/// - `wind(x)`: double, `missing_value` list and `valid_range`
fn create_masked_file(dir: &Path) -> PathBuf {
    let path = dir.join("masked.nc");
    let mut file = create(&path).expect("Failed to create NetCDF file");

    file.add_dimension("y", 2).expect("Failed to add dimension y");
    file.add_dimension("x", 3).expect("Failed to add dimension x");
    file.add_attribute("institution", "Test Lab").expect("Failed to add attribute");

    let mut pressure = file
        .add_variable::<i16>("pressure", &["y", "x"])
        .expect("Failed to add variable");
    pressure.put_attribute("_FillValue", -1i16).expect("Failed to add attribute");
    pressure.put_attribute("scale_factor", 0.5f64).expect("Failed to add attribute");
    pressure.put_attribute("add_offset", 100.0f64).expect("Failed to add attribute");
    pressure.put_attribute("units", "hPa").expect("Failed to add attribute");
    pressure.put_attribute("station_id", 1234i32).expect("Failed to add attribute");
    pressure
        .put_attribute("flag_values", vec![0i32, 1, 2])
        .expect("Failed to add attribute");
    pressure
        .put_values(&[0i16, 2, -1, 4, 6, 8], ..)
        .expect("Failed to write data");

    let mut wind = file.add_variable::<f64>("wind", &["x"]).expect("Failed to add variable");
    wind.put_attribute("missing_value", vec![-1.0f64, -2.0])
        .expect("Failed to add attribute");
    wind.put_attribute("valid_range", vec![0.0f64, 50.0])
        .expect("Failed to add attribute");
    wind.put_values(&[-2.0f64, 12.5, 75.0], ..).expect("Failed to write data");

    path
}

#[test]
fn test_metadata_snapshot() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let ds = Dataset::open(create_masked_file(dir.path()))?;

    let info = ds.info();
    assert_eq!(info.format, "NetCDF");
    assert_eq!(info.num_dimensions, 2);
    assert_eq!(info.num_variables, 2);
    assert_eq!(info.num_global_attributes, 1);
    assert!(info.file_size_bytes.is_some_and(|size| size > 0));

    let pressure = ds.variable("pressure")?;
    assert_eq!(pressure.dimensions, vec!["y", "x"]);
    assert_eq!(pressure.shape, vec![2, 3]);
    assert_eq!(pressure.data_type, "short");
    assert_eq!(pressure.attribute("units"), Some(&json!("hPa")));
    assert_eq!(ds.attributes().get("institution"), Some(&json!("Test Lab")));

    print_file_info(&ds);
    list_variables(&ds);
    describe_variable(&ds, "pressure")?;
    assert_eq!(
        describe_variable(&ds, "humidity").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    Ok(())
}

#[test]
fn test_packed_values_are_masked_then_unpacked() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let ds = Dataset::open(create_masked_file(dir.path()))?;

    let pressure = ds.read("pressure")?;
    assert_eq!(pressure.missing_count(), 1);
    assert_eq!(pressure.get(&[0, 0]), Some(100.0));
    assert_eq!(pressure.get(&[0, 1]), Some(101.0));
    assert_eq!(pressure.get(&[0, 2]), None);
    assert_eq!(pressure.get(&[1, 2]), Some(104.0));

    let summary = statistics(&pressure)?;
    assert_eq!(summary.count, 5);
    assert_eq!(summary.min, 100.0);
    assert_eq!(summary.max, 104.0);
    Ok(())
}

#[test]
fn test_missing_value_list_and_valid_range() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let ds = Dataset::open(create_masked_file(dir.path()))?;

    let wind = ds.read("wind")?;
    assert_eq!(wind.iter().collect::<Vec<_>>(), vec![None, Some(12.5), None]);
    Ok(())
}

#[test]
fn test_unwritten_cells_are_missing() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("partial.nc");
    {
        let mut file = create(&path).expect("Failed to create NetCDF file");
        file.add_dimension("x", 4).expect("Failed to add dimension x");

        let mut depth = file.add_variable::<f64>("depth", &["x"]).expect("Failed to add variable");
        depth.put_values(&[1.0f64, 2.0], 0..2).expect("Failed to write data");

        let mut count = file.add_variable::<i16>("count", &["x"]).expect("Failed to add variable");
        count.put_values(&[5i16], 0..1).expect("Failed to write data");

        let mut flag = file.add_variable::<i8>("flag", &["x"]).expect("Failed to add variable");
        flag.put_values(&[1i8], 0..1).expect("Failed to write data");
    }
    let ds = Dataset::open(&path)?;

    let depth = ds.read("depth")?;
    assert_eq!(depth.iter().collect::<Vec<_>>(), vec![Some(1.0), Some(2.0), None, None]);
    let summary = statistics(&depth)?;
    assert_eq!(summary.count, 2);
    assert_eq!(summary.max, 2.0);

    assert_eq!(statistics(&ds.read("count")?)?.count, 1);
    // byte storage has no default fill to mask
    assert_eq!(ds.read("flag")?.missing_count(), 0);
    Ok(())
}

#[test]
fn test_reader_returns_stored_values() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let reader = NetCdfReader::open(&create_masked_file(dir.path()))?;
    let variables = reader.variables()?;
    let pressure = variables
        .iter()
        .find(|v| v.name == "pressure")
        .expect("pressure variable");
    assert_eq!(
        reader.read_values(pressure, &[0..2, 0..3])?,
        vec![0.0, 2.0, -1.0, 4.0, 6.0, 8.0]
    );
    // only the requested block comes back from the file
    assert_eq!(reader.read_values(pressure, &[1..2, 1..3])?, vec![6.0, 8.0]);
    Ok(())
}

#[test]
fn test_write_slice_to_netcdf() -> Result<()> {
    let dir = tempdir().expect("Failed to create temp dir");
    let ds = Dataset::open(create_masked_file(dir.path()))?;

    let row = ds.slice("pressure", &SliceSpec::new().with("y", Selector::Index(0)))?;
    let output = dir.path().join("pressure_row.nc");
    NetCDFWriter::new(&output).write_array(&row, ds.variable("pressure")?)?;
    // overwriting an existing output is allowed
    NetCDFWriter::new(&output).write_array(&row, ds.variable("pressure")?)?;

    let written = Dataset::open(&output)?;
    let variable = written.variable("pressure")?;
    assert_eq!(variable.dimensions, vec!["x"]);
    assert_eq!(variable.data_type, "double");
    assert_eq!(variable.attribute("units"), Some(&json!("hPa")));
    assert_eq!(variable.attribute("station_id"), Some(&json!(1234)));
    assert_eq!(variable.attribute("flag_values"), Some(&json!([0, 1, 2])));
    assert_eq!(variable.attribute("_FillValue"), Some(&json!(EXPORT_FILL_VALUE)));
    assert!(variable.attribute("scale_factor").is_none());
    assert!(written.attributes().contains_key("history"));

    let values = written.read("pressure")?;
    assert_eq!(values.iter().collect::<Vec<_>>(), vec![Some(100.0), Some(101.0), None]);
    Ok(())
}

#[test]
fn test_memory_reader_dataset() -> Result<()> {
    let reader = MemoryReader::new()
        .with_unlimited_dimension("time", 4)
        .with_dimension("station", 2)
        .with_variable(
            "flow",
            &["time", "station"],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )?
        .with_variable_attribute("flow", "_FillValue", -1.0)?;
    let ds = Dataset::from_reader("memory", reader)?;

    assert!(ds.dimension("time")?.is_unlimited);
    let station = ds.slice("flow", &SliceSpec::new().with("station", Selector::Index(1)))?;
    assert_eq!(station.iter_valid().collect::<Vec<_>>(), vec![2.0, 4.0, 6.0, 8.0]);

    assert_eq!(
        MemoryReader::new()
            .with_variable("v", &["nope"], vec![])
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    Ok(())
}

#[test]
fn test_formatting_helpers() {
    assert_eq!(format_attribute(&json!("K")), "K");
    assert_eq!(format_size(512), "512 bytes");
    assert!(format_size(3 * 1024 * 1024).contains("MB"));
}

#[test]
fn test_parallel_environment() {
    let config = ParallelConfig::new(None);
    assert!(config.num_threads.is_none());
    assert!(config.setup_global_pool().is_ok());

    let info = get_parallel_info();
    assert!(info.current_threads >= 1);
    assert!(info.available_cores >= 1);
}
