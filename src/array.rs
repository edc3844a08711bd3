//! In-memory result of slicing a variable

use crate::errors::{NcReaderError, Result};
use ndarray::{ArrayD, Axis, IxDyn};

/// A materialized, independent copy of (part of) a variable.
///
/// Values are stored as `f64` together with an optional mask where `true`
/// marks a missing element. Missing elements keep whatever value was stored
/// in the container; consumers must go through the mask (or the accessors
/// below) rather than the raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedArray {
    name: String,
    dims: Vec<String>,
    data_type: String,
    data: ArrayD<f64>,
    mask: Option<ArrayD<bool>>,
}

impl MaterializedArray {
    /// # Errors
    ///
    /// Returns an error if `dims` does not label every axis of `data` or the
    /// mask shape differs from the data shape.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        data_type: impl Into<String>,
        data: ArrayD<f64>,
        mask: Option<ArrayD<bool>>,
    ) -> Result<Self> {
        let name = name.into();
        if dims.len() != data.ndim() {
            return Err(NcReaderError::ShapeMismatch {
                var: name,
                expected: data.ndim(),
                actual: dims.len(),
            });
        }
        if let Some(m) = &mask {
            if m.shape() != data.shape() {
                return Err(NcReaderError::ShapeMismatch {
                    var: name,
                    expected: data.len(),
                    actual: m.len(),
                });
            }
        }
        // an all-false mask carries no information
        let mask = mask.filter(|m| m.iter().any(|&missing| missing));

        Ok(Self {
            name,
            dims,
            data_type: data_type.into(),
            data,
            mask,
        })
    }

    /// Builds an unmasked array from row-major values.
    pub fn from_values(
        name: &str,
        dims: &[&str],
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Self::new(
            name,
            dims.iter().map(|d| d.to_string()).collect(),
            "double",
            data,
            None,
        )
    }

    /// Replaces the missing mask.
    pub fn with_mask(self, mask: ArrayD<bool>) -> Result<Self> {
        Self::new(self.name, self.dims, self.data_type, self.data, Some(mask))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remaining axis names, in the source variable's declared order
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    /// Number of elements, missing included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored values, missing elements included
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// `None` when no element is missing
    pub fn mask(&self) -> Option<&ArrayD<bool>> {
        self.mask.as_ref()
    }

    pub fn missing_count(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(0, |m| m.iter().filter(|&&missing| missing).count())
    }

    /// Value at `index`, `None` when missing or out of bounds
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if let Some(mask) = &self.mask {
            if *mask.get(index)? {
                return None;
            }
        }
        self.data.get(index).copied()
    }

    /// All elements in row-major order, `None` for missing ones
    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        let mut mask = self.mask.as_ref().map(|m| m.iter());
        self.data.iter().map(move |&value| {
            let missing = mask.as_mut().and_then(|m| m.next()).copied();
            if missing == Some(true) {
                None
            } else {
                Some(value)
            }
        })
    }

    /// Non-missing values in row-major order
    pub fn iter_valid(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().flatten()
    }

    /// Copy of the values with missing elements replaced by `fill`
    pub fn filled(&self, fill: f64) -> ArrayD<f64> {
        match &self.mask {
            Some(mask) => {
                let mut out = self.data.clone();
                out.zip_mut_with(mask, |value, &missing| {
                    if missing {
                        *value = fill;
                    }
                });
                out
            }
            None => self.data.clone(),
        }
    }

    /// Selects a single index along `axis`, dropping that axis.
    ///
    /// # Panics
    ///
    /// Panics if `axis` or `index` is out of bounds, like `ndarray::index_axis`.
    pub fn index_axis(&self, axis: usize, index: usize) -> Self {
        let mut dims = self.dims.clone();
        dims.remove(axis);
        let mask = self
            .mask
            .as_ref()
            .map(|m| m.index_axis(Axis(axis), index).to_owned())
            .filter(|m| m.iter().any(|&missing| missing));
        Self {
            name: self.name.clone(),
            dims,
            data_type: self.data_type.clone(),
            data: self.data.index_axis(Axis(axis), index).to_owned(),
            mask,
        }
    }

    /// Prints shape, type and a preview of the values.
    pub fn print_preview(&self, max_cols: usize, max_rows: usize, missing_marker: &str) {
        let fmt = |value: Option<f64>| match value {
            Some(v) => format!("{v}"),
            None => missing_marker.to_string(),
        };

        println!("\nData for variable '{}':", self.name);
        println!("Shape: {:?}", self.shape());
        println!("Dimensions: ({})", self.dims.join(", "));
        println!("Data type: {}", self.data_type);

        match self.rank() {
            1 => {
                let values: Vec<String> = self.iter().map(fmt).collect();
                if values.len() <= max_cols {
                    println!("Data: [{}]", values.join(", "));
                } else {
                    println!(
                        "First {max_cols} values: [{}]",
                        values[..max_cols].join(", ")
                    );
                    println!(
                        "Last {max_cols} values: [{}]",
                        values[values.len() - max_cols..].join(", ")
                    );
                    println!("... (showing {max_cols} of {} values)", values.len());
                }
            }
            2 => {
                let (rows, cols) = (self.shape()[0], self.shape()[1]);
                println!("Data (rows x columns):");
                for i in 0..rows.min(max_rows) {
                    let row: Vec<String> = (0..cols.min(max_cols))
                        .map(|j| fmt(self.get(&[i, j])))
                        .collect();
                    println!("Row {i}: [{}]", row.join(", "));
                }
                if cols > max_cols {
                    println!("      ... (showing {max_cols} of {cols} columns)");
                }
                if rows > max_rows {
                    println!("      ... (showing {max_rows} of {rows} rows)");
                }
            }
            _ => {
                let values: Vec<String> = self.iter().take(max_cols).map(fmt).collect();
                println!("Showing first few elements: [{}]", values.join(", "));
                if self.len() > max_cols {
                    println!("... (showing {max_cols} of {} total elements)", self.len());
                }
            }
        }
    }
}
