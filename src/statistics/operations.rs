//! Summary statistics of a materialized array

use crate::array::MaterializedArray;
use crate::errors::{NcReaderError, Result};
use crate::statistics::parallel::{chunked_moments, chunked_squared_deviation};
use ndarray::ArrayD;
use serde_json::{json, Value as JsonValue};
use std::borrow::Cow;
use tracing::debug;

/// Number of leading and trailing values kept in a [`Summary`]
pub const PREVIEW_VALUES: usize = 10;

/// Descriptive statistics of the non-missing values of an array
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub variable: String,
    pub shape: Vec<usize>,
    /// Total number of elements, missing included
    pub size: usize,
    /// Number of non-missing elements
    pub count: usize,
    pub data_type: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation (divisor `count`)
    pub std: f64,
    pub first_values: Vec<f64>,
    pub last_values: Vec<f64>,
}

impl Summary {
    pub fn missing(&self) -> usize {
        self.size - self.count
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "variable": self.variable,
            "shape": self.shape,
            "size": self.size,
            "count": self.count,
            "missing": self.missing(),
            "data_type": self.data_type,
            "min": self.min,
            "max": self.max,
            "mean": self.mean,
            "std": self.std,
            "first_values": self.first_values,
            "last_values": self.last_values,
        })
    }

    pub fn print(&self) {
        println!("\nStatistics for variable '{}':", self.variable);
        println!("  Shape:      {:?}", self.shape);
        println!("  Data type:  {}", self.data_type);
        println!("  Size:       {}", self.size);
        println!("  Valid:      {} ({} missing)", self.count, self.missing());
        println!("  Min:        {:.6}", self.min);
        println!("  Max:        {:.6}", self.max);
        println!("  Mean:       {:.6}", self.mean);
        println!("  Std:        {:.6}", self.std);
        println!("  First values: {:?}", self.first_values);
        println!("  Last values:  {:?}", self.last_values);
    }
}

fn contiguous<T: Copy>(array: &ArrayD<T>) -> Cow<'_, [T]> {
    match array.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(array.iter().copied().collect()),
    }
}

/// Computes count, min, max, mean and population standard deviation over the
/// non-missing elements of `array`.
///
/// Accumulation is chunked and merged in a fixed order, so the result does
/// not depend on the size of the rayon pool it runs on.
///
/// # Errors
///
/// `EmptyData` when every element is missing or the array has no elements.
pub fn statistics(array: &MaterializedArray) -> Result<Summary> {
    let values = contiguous(array.data());
    let mask = array.mask().map(contiguous);
    let mask = mask.as_deref();

    let moments = chunked_moments(&values, mask);
    if moments.count == 0 {
        return Err(NcReaderError::EmptyData {
            var: array.name().to_string(),
        });
    }

    let count = moments.count as f64;
    let mean = moments.sum / count;
    let std = (chunked_squared_deviation(&values, mask, mean) / count).sqrt();

    let is_valid = |i: &usize| mask.map_or(true, |m| !m[*i]);
    let first_values: Vec<f64> = (0..values.len())
        .filter(is_valid)
        .take(PREVIEW_VALUES)
        .map(|i| values[i])
        .collect();
    let mut last_values: Vec<f64> = (0..values.len())
        .rev()
        .filter(is_valid)
        .take(PREVIEW_VALUES)
        .map(|i| values[i])
        .collect();
    last_values.reverse();

    debug!(var = %array.name(), count = moments.count, "computed statistics");

    Ok(Summary {
        variable: array.name().to_string(),
        shape: array.shape().to_vec(),
        size: array.len(),
        count: moments.count,
        data_type: array.data_type().to_string(),
        min: moments.min,
        max: moments.max,
        mean,
        std,
        first_values,
        last_values,
    })
}
