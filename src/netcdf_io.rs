//! NetCDF I/O: the container reader and the slice writer
//!
//! [`NetCdfReader`] adapts the `netcdf` crate to [`DataReader`]. Values are
//! always read as `f64`, letting the library convert integer and single
//! precision storage, and only the requested block is fetched from disk.
//! [`NetCDFWriter`] writes a materialized slice to a new NetCDF file with the
//! source variable's attributes preserved.

use crate::array::MaterializedArray;
use crate::data_source::DataReader;
use crate::errors::{Missing, NcReaderError, Result};
use crate::masking::PACKING_ATTRIBUTES;
use crate::metadata::{Dimension, Variable};
use chrono::Utc;
use netcdf::{create, AttributeValue, File};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fill value written for missing elements of an exported slice
pub const EXPORT_FILL_VALUE: f64 = -9999.0;

/// An open NetCDF file
pub struct NetCdfReader {
    path: PathBuf,
    file: File,
}

impl NetCdfReader {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NcReaderError::NotFound {
                kind: Missing::Path,
                name: path.display().to_string(),
            });
        }
        let file = netcdf::open(path).map_err(|source| NcReaderError::FormatError {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "opened NetCDF file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Converts a NetCDF attribute to a JSON value
pub fn attribute_to_json(value: AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Str(s) => JsonValue::String(s),
        AttributeValue::Strs(ss) => json!(ss),
        AttributeValue::Float(f) => json!(f),
        AttributeValue::Floats(fs) => json!(fs),
        AttributeValue::Double(d) => json!(d),
        AttributeValue::Doubles(ds) => json!(ds),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Ints(is) => json!(is),
        AttributeValue::Short(s) => json!(s),
        AttributeValue::Shorts(ss) => json!(ss),
        AttributeValue::Uchar(u) => json!(u),
        AttributeValue::Uchars(us) => json!(us),
        AttributeValue::Ushort(u) => json!(u),
        AttributeValue::Ushorts(us) => json!(us),
        AttributeValue::Uint(u) => json!(u),
        AttributeValue::Uints(us) => json!(us),
        AttributeValue::Schar(i) => json!(i),
        AttributeValue::Schars(is) => json!(is),
        AttributeValue::Longlong(i) => json!(i),
        AttributeValue::Longlongs(is) => json!(is),
        AttributeValue::Ulonglong(u) => json!(u),
        AttributeValue::Ulonglongs(us) => json!(us),
    }
}

/// Maps the `netcdf` crate's type description to its CDL name
/// (`Float(F64)` becomes `double`, `Int(I16)` becomes `short`).
pub fn cdl_type_name(debug_name: &str) -> String {
    let lower = debug_name.to_lowercase();
    const NAMES: [(&str, &str); 12] = [
        ("f64", "double"),
        ("f32", "float"),
        ("u64", "uint64"),
        ("i64", "int64"),
        ("u32", "uint"),
        ("i32", "int"),
        ("u16", "ushort"),
        ("i16", "short"),
        ("u8", "ubyte"),
        ("i8", "byte"),
        ("char", "char"),
        ("string", "string"),
    ];
    NAMES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map_or(lower.clone(), |(_, name)| name.to_string())
}

impl DataReader for NetCdfReader {
    fn format_name(&self) -> &str {
        "NetCDF"
    }

    fn dimensions(&self) -> Result<Vec<Dimension>> {
        Ok(self
            .file
            .dimensions()
            .map(|d| Dimension {
                name: d.name().to_string(),
                len: d.len(),
                is_unlimited: d.is_unlimited(),
            })
            .collect())
    }

    fn variables(&self) -> Result<Vec<Variable>> {
        let mut variables = Vec::new();
        for var in self.file.variables() {
            let mut attributes = BTreeMap::new();
            for attr in var.attributes() {
                attributes.insert(attr.name().to_string(), attribute_to_json(attr.value()?));
            }
            variables.push(Variable {
                name: var.name().to_string(),
                dimensions: var
                    .dimensions()
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect(),
                shape: var.dimensions().iter().map(|d| d.len()).collect(),
                data_type: cdl_type_name(&format!("{:?}", var.vartype())),
                attributes,
            });
        }
        Ok(variables)
    }

    fn global_attributes(&self) -> Result<BTreeMap<String, JsonValue>> {
        let mut attributes = BTreeMap::new();
        for attr in self.file.attributes() {
            attributes.insert(attr.name().to_string(), attribute_to_json(attr.value()?));
        }
        Ok(attributes)
    }

    fn read_values(&self, variable: &Variable, block: &[Range<usize>]) -> Result<Vec<f64>> {
        let var = self
            .file
            .variable(&variable.name)
            .ok_or_else(|| NcReaderError::variable_not_found(&variable.name))?;
        debug!(var = %variable.name, ?block, "reading values");
        if block.is_empty() {
            return Ok(var.get_values::<f64, _>(..)?);
        }
        Ok(var.get_values::<f64, _>(block.to_vec())?)
    }
}

/// Converts a numeric JSON attribute back to a NetCDF attribute.
///
/// Integers that fit in 32 bits become `int`, other integers `int64`, and
/// anything with a fractional part `double`. A list takes the widest type
/// any of its items needs.
pub fn number_attribute(value: &JsonValue) -> Option<AttributeValue> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(match i32::try_from(i) {
                    Ok(small) => AttributeValue::Int(small),
                    Err(_) => AttributeValue::Longlong(i),
                })
            } else {
                n.as_f64().map(AttributeValue::Double)
            }
        }
        JsonValue::Array(items) if !items.is_empty() && items.iter().all(JsonValue::is_number) => {
            if let Some(longs) = items.iter().map(JsonValue::as_i64).collect::<Option<Vec<_>>>() {
                let ints = longs
                    .iter()
                    .map(|&i| i32::try_from(i).ok())
                    .collect::<Option<Vec<_>>>();
                Some(match ints {
                    Some(ints) => AttributeValue::Ints(ints),
                    None => AttributeValue::Longlongs(longs),
                })
            } else {
                let doubles = items.iter().filter_map(JsonValue::as_f64).collect();
                Some(AttributeValue::Doubles(doubles))
            }
        }
        _ => None,
    }
}

/// Writes materialized slices to new NetCDF files
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Writes `array` as a `double` variable named after its source.
    ///
    /// Remaining axis names become dimensions, missing elements are written as
    /// [`EXPORT_FILL_VALUE`], and attributes of `source` are copied except for
    /// the fill/packing ones, which no longer apply to unpacked values.
    pub fn write_array(&self, array: &MaterializedArray, source: &Variable) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = create(self.output_path)?;

        for (dim_name, &dim_len) in array.dims().iter().zip(array.shape()) {
            file.add_dimension(dim_name, dim_len)?;
        }

        let dim_refs: Vec<&str> = array.dims().iter().map(|s| s.as_str()).collect();
        let mut new_var = file.add_variable::<f64>(array.name(), &dim_refs)?;
        new_var.put_attribute("_FillValue", EXPORT_FILL_VALUE)?;

        let values: Vec<f64> = array.filled(EXPORT_FILL_VALUE).iter().copied().collect();
        new_var.put_values(&values, ..)?;

        for (name, value) in &source.attributes {
            if PACKING_ATTRIBUTES.contains(&name.as_str()) {
                continue;
            }
            if let Some(attribute) = number_attribute(value) {
                new_var.put_attribute(name, attribute)?;
                continue;
            }
            match value {
                JsonValue::String(s) => {
                    new_var.put_attribute(name, s.as_str())?;
                }
                JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => {
                    let values: Vec<String> = items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                    new_var.put_attribute(name, values)?;
                }
                _ => {
                    warn!(attribute = %name, "skipped unsupported attribute type");
                }
            }
        }

        file.add_attribute(
            "history",
            format!("Created by ncreader on {}", Utc::now().to_rfc3339()),
        )?;

        debug!(path = %self.output_path.display(), var = %array.name(), "wrote slice");
        Ok(())
    }
}
