//! Data source abstraction over the external array container
//!
//! Parsing of the container format is delegated to a [`DataReader`]. The
//! [`Dataset`](crate::dataset::Dataset) handle owns exactly one reader between
//! `open` and `close` and only ever consumes metadata and raw element values
//! through this trait.

use crate::errors::{Missing, NcReaderError, Result};
use crate::metadata::{Dimension, Variable};
use crate::slice::extract_block;
use ndarray::{ArrayView, IxDyn};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::ops::Range;

/// Read-only access to a self-describing multidimensional container
pub trait DataReader {
    /// Short name of the container format, used in reports
    fn format_name(&self) -> &str;

    /// All dimensions in container order
    fn dimensions(&self) -> Result<Vec<Dimension>>;

    /// All variables in container order
    fn variables(&self) -> Result<Vec<Variable>>;

    /// Global attributes
    fn global_attributes(&self) -> Result<BTreeMap<String, JsonValue>>;

    /// Reads the elements of `variable` inside `block` (one range per axis,
    /// empty for a scalar) in row-major order, as stored. No masking or
    /// unpacking is applied.
    fn read_values(&self, variable: &Variable, block: &[Range<usize>]) -> Result<Vec<f64>>;
}

/// In-memory container, useful for programmatic datasets and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    dimensions: Vec<Dimension>,
    variables: Vec<(Variable, Vec<f64>)>,
    attributes: BTreeMap<String, JsonValue>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.push(Dimension::new(name, len));
        self
    }

    pub fn with_unlimited_dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.push(Dimension::unlimited(name, len));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Adds a `double` variable over previously declared dimensions.
    ///
    /// # Errors
    ///
    /// Fails with `NotFound` for an undeclared dimension and with
    /// `ShapeMismatch` when `values` does not fill the declared shape.
    pub fn with_variable(mut self, name: &str, dims: &[&str], values: Vec<f64>) -> Result<Self> {
        let shape = dims
            .iter()
            .map(|dim| {
                self.dimensions
                    .iter()
                    .find(|d| d.name == *dim)
                    .map(|d| d.len)
                    .ok_or_else(|| NcReaderError::NotFound {
                        kind: Missing::Dimension,
                        name: dim.to_string(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(NcReaderError::ShapeMismatch {
                var: name.to_string(),
                expected,
                actual: values.len(),
            });
        }

        let variable = Variable {
            name: name.to_string(),
            dimensions: dims.iter().map(|d| d.to_string()).collect(),
            shape,
            data_type: "double".to_string(),
            attributes: BTreeMap::new(),
        };
        self.variables.retain(|(v, _)| v.name != name);
        self.variables.push((variable, values));
        Ok(self)
    }

    /// Sets an attribute on an existing variable.
    pub fn with_variable_attribute(
        mut self,
        var_name: &str,
        name: &str,
        value: impl Into<JsonValue>,
    ) -> Result<Self> {
        let (variable, _) = self
            .variables
            .iter_mut()
            .find(|(v, _)| v.name == var_name)
            .ok_or_else(|| NcReaderError::variable_not_found(var_name))?;
        variable.attributes.insert(name.to_string(), value.into());
        Ok(self)
    }
}

impl DataReader for MemoryReader {
    fn format_name(&self) -> &str {
        "in-memory"
    }

    fn dimensions(&self) -> Result<Vec<Dimension>> {
        Ok(self.dimensions.clone())
    }

    fn variables(&self) -> Result<Vec<Variable>> {
        Ok(self.variables.iter().map(|(v, _)| v.clone()).collect())
    }

    fn global_attributes(&self) -> Result<BTreeMap<String, JsonValue>> {
        Ok(self.attributes.clone())
    }

    fn read_values(&self, variable: &Variable, block: &[Range<usize>]) -> Result<Vec<f64>> {
        let (stored, values) = self
            .variables
            .iter()
            .find(|(v, _)| v.name == variable.name)
            .ok_or_else(|| NcReaderError::variable_not_found(&variable.name))?;
        let whole = ArrayView::from_shape(IxDyn(&stored.shape), values.as_slice())?;
        extract_block(whole, block)
    }
}
