//! Dataset metadata and inspection reports
//!
//! The structs in this module are owned snapshots taken when a dataset is
//! opened. A [`Variable`] refers to its dimensions by name only; lengths are
//! copied into its `shape` at open time so an unlimited dimension is read as a
//! fixed snapshot.

use crate::dataset::Dataset;
use crate::errors::Result;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Attribute values longer than this are truncated in reports
const MAX_ATTRIBUTE_CHARS: usize = 100;

/// A named axis with a declared length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
    pub is_unlimited: bool,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            is_unlimited: false,
        }
    }

    pub fn unlimited(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            is_unlimited: true,
        }
    }
}

/// Structured metadata for a variable
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Dimension names in declared axis order
    pub dimensions: Vec<String>,
    /// Lengths of `dimensions`, same order
    pub shape: Vec<usize>,
    pub data_type: String,
    pub attributes: BTreeMap<String, JsonValue>,
}

impl Variable {
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Position of `dim` in the declared axis order
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dim)
    }

    pub fn attribute(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.get(name)
    }

    /// Estimated in-memory size from the element type
    pub fn estimated_size_bytes(&self) -> usize {
        self.len() * element_size(&self.data_type)
    }
}

/// Summary information about an open file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub file_size_bytes: Option<u64>,
    pub format: String,
    pub num_dimensions: usize,
    pub num_variables: usize,
    pub num_global_attributes: usize,
}

fn element_size(data_type: &str) -> usize {
    if data_type.contains("double")
        || data_type.contains("int64")
        || data_type.contains("longlong")
    {
        8
    } else if data_type.contains("short") {
        2
    } else if data_type.contains("byte") || data_type.contains("char") {
        1
    } else {
        4
    }
}

/// Renders an attribute value for display, strings unquoted
pub fn format_attribute(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: String, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut short: String = text.chars().take(max_chars).collect();
        short.push_str("...");
        short
    } else {
        text
    }
}

pub fn format_size(total_bytes: u64) -> String {
    if total_bytes < 1024 {
        format!("{total_bytes} bytes")
    } else if total_bytes < 1024 * 1024 {
        format!("{:.2} KB", total_bytes as f64 / 1024.0)
    } else if total_bytes < 1024 * 1024 * 1024 {
        format!("{:.2} MB", total_bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", total_bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_shape(shape: &[usize]) -> String {
    let parts: Vec<String> = shape.iter().map(|s| s.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Prints file information, dimensions, variables and global attributes.
pub fn print_file_info(dataset: &Dataset) {
    let info = dataset.info();

    println!("\n{}", "=".repeat(60));
    println!("NETCDF FILE INFORMATION");
    println!("{}", "=".repeat(60));
    println!("File Path: {}", info.path);
    if let Some(size) = info.file_size_bytes {
        println!("File Size: {}", format_size(size));
    }
    println!("Format: {}", info.format);
    println!("Num Dimensions: {}", info.num_dimensions);
    println!("Num Variables: {}", info.num_variables);
    println!("Num Global Attributes: {}", info.num_global_attributes);

    println!("\nDimensions ({}):", dataset.dimensions().len());
    for dim in dataset.dimensions() {
        if dim.is_unlimited {
            println!("  {}: unlimited (currently {})", dim.name, dim.len);
        } else {
            println!("  {}: {}", dim.name, dim.len);
        }
    }

    println!("\nVariables ({}):", dataset.variables().len());
    for var in dataset.variables() {
        println!(
            "  {}: {} {} ({})",
            var.name,
            var.data_type,
            format_shape(&var.shape),
            var.dimensions.join(", ")
        );
    }

    if !dataset.attributes().is_empty() {
        println!("\nGlobal Attributes ({}):", dataset.attributes().len());
        for (name, value) in dataset.attributes() {
            println!(
                "  {}: {}",
                name,
                truncate(format_attribute(value), MAX_ATTRIBUTE_CHARS)
            );
        }
    }
}

/// Lists all variables with their dimension names.
pub fn list_variables(dataset: &Dataset) {
    println!("\nAvailable variables:");
    if dataset.variables().is_empty() {
        println!("   (No variables found)");
    }
    for (i, var) in dataset.variables().iter().enumerate() {
        println!("{:2}. {} ({})", i + 1, var.name, var.dimensions.join(", "));
    }
}

/// Describes a specific variable showing its dimensions, shape, type and attributes.
pub fn describe_variable(dataset: &Dataset, var_name: &str) -> Result<()> {
    let var = dataset.variable(var_name)?;

    println!("\nVariable: {}", var.name);
    if var.is_scalar() {
        println!("Dimensions: (scalar)");
        println!("Shape: ()");
    } else {
        println!("Dimensions: ({})", var.dimensions.join(", "));
        println!("Shape: {}", format_shape(&var.shape));
    }
    println!("Data Type: {}", var.data_type);
    println!(
        "Storage: {} elements, ~{}",
        var.len(),
        format_size(var.estimated_size_bytes() as u64)
    );

    if !var.attributes.is_empty() {
        println!("Attributes:");
        for (name, value) in &var.attributes {
            println!("  {}: {}", name, format_attribute(value));
        }
    }

    Ok(())
}
