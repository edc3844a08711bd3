//! Creates a sample NetCDF file for trying out ncreader.
//!
//! The file has coordinate variables, a 3-D temperature field with fill
//! values, a packed `short` pressure field and a 1-D series with a
//! `missing_value` list, covering every masking rule the reader applies.

use ndarray::{arr0, Array3};
use netcdf::create;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = Path::new("test_data.nc");

    println!("Creating test NetCDF file: {}", output_path.display());

    if output_path.exists() {
        std::fs::remove_file(output_path)?
    }

    let mut file = create(output_path)?;

    file.add_attribute("title", "Test Climate Data")?;
    file.add_attribute("institution", "ncreader sample data")?;
    file.add_attribute("created_by", "create_test_netcdf.rs")?;

    file.add_dimension("time", 12)?; // months
    file.add_dimension("lat", 5)?;
    file.add_dimension("lon", 8)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2023-01-01")?;
        time_var.put_attribute("calendar", "standard")?;
        let time_data: Vec<f64> = (0..12).map(|i| i as f64 * 30.0).collect();
        time_var.put_values(&time_data, ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f32>("lat", &["lat"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        let lat_data: Vec<f32> = (0..5).map(|i| -40.0 + i as f32 * 20.0).collect();
        lat_var.put_values(&lat_data, ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f32>("lon", &["lon"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        let lon_data: Vec<f32> = (0..8).map(|i| -180.0 + i as f32 * 45.0).collect();
        lon_var.put_values(&lon_data, ..)?;
    }

    // temperature(time, lat, lon) with a missing station at lat=0, lon=3
    {
        let mut temp_var = file.add_variable::<f32>("temperature", &["time", "lat", "lon"])?;
        temp_var.put_attribute("units", "K")?;
        temp_var.put_attribute("long_name", "air temperature")?;
        temp_var.put_attribute("_FillValue", -999.0f32)?;

        let temp = Array3::from_shape_fn((12, 5, 8), |(t, lat, lon)| {
            if lat == 0 && lon == 3 {
                return -999.0;
            }
            let lat_effect = -20.0 * ((lat as f32 - 2.0) / 2.0).abs();
            let seasonal = 10.0 * (t as f32 * std::f32::consts::PI / 6.0).cos();
            288.0 + lat_effect + seasonal + lon as f32 * 0.25
        });
        temp_var.put(temp.view(), ..)?;
    }

    // pressure(time, lat) packed as short: hPa = 0.1 * stored + 1000
    {
        let mut pres_var = file.add_variable::<i16>("pressure", &["time", "lat"])?;
        pres_var.put_attribute("units", "hPa")?;
        pres_var.put_attribute("scale_factor", 0.1f64)?;
        pres_var.put_attribute("add_offset", 1000.0f64)?;
        pres_var.put_attribute("_FillValue", i16::MIN)?;
        let stored: Vec<i16> = (0..60)
            .map(|i| if i == 7 { i16::MIN } else { (i * 3 - 90) as i16 })
            .collect();
        pres_var.put_values(&stored, ..)?;
    }

    // precipitation(time) with missing_value markers and a valid range
    {
        let mut precip_var = file.add_variable::<f64>("precipitation", &["time"])?;
        precip_var.put_attribute("units", "mm")?;
        precip_var.put_attribute("missing_value", vec![-1.0f64, -99.0])?;
        precip_var.put_attribute("valid_range", vec![0.0f64, 500.0])?;
        let precip = [12.0, 30.5, -1.0, 44.0, 80.2, -99.0, 120.0, 95.0, 700.0, 33.0, 21.0, 8.0];
        precip_var.put_values(&precip, ..)?;
    }

    {
        let mut global_var = file.add_variable::<f32>("global_average_temp", &[])?;
        global_var.put_attribute("units", "K")?;
        global_var.put(arr0(288.15f32).view(), &[] as &[usize])?;
    }

    println!("Created test NetCDF file with:");
    println!("   Dimensions: time(12), lat(5), lon(8)");
    println!(
        "   Variables: time, lat, lon, temperature, pressure, precipitation, global_average_temp"
    );
    println!("\nTry:");
    println!("   cargo run -- -f test_data.nc --summary temperature --slice time:0");
    println!("   cargo run -- -f test_data.nc --export temperature --slice lon:3");
    println!("   cargo run -- -f test_data.nc --plot temperature");

    Ok(())
}
