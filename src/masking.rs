//! Missing-value detection and unpacking of stored values
//!
//! Detection runs on the packed (stored) values in this order: `_FillValue`,
//! `missing_value`, `valid_min` / `valid_max` / `valid_range`, NaN. Values
//! that survive are unpacked with `scale_factor` and `add_offset`.
//!
//! A variable without `_FillValue` still has cells the file never wrote. Those
//! hold the netCDF default fill for the storage type and are masked as well,
//! except for byte and char storage where every bit pattern is usable data.

use crate::metadata::Variable;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Attributes that only describe storage and are not carried over on export
pub const PACKING_ATTRIBUTES: [&str; 7] = [
    "_FillValue",
    "missing_value",
    "valid_min",
    "valid_max",
    "valid_range",
    "scale_factor",
    "add_offset",
];

/// Masking and unpacking rules derived from a variable's attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingPolicy {
    pub fill_value: Option<f64>,
    pub missing_values: Vec<f64>,
    pub valid_min: Option<f64>,
    pub valid_max: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

fn as_scalar(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::Array(items) if items.len() == 1 => items[0].as_f64(),
        _ => None,
    }
}

fn as_list(value: &JsonValue) -> Vec<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64().into_iter().collect(),
        JsonValue::Array(items) => items.iter().filter_map(JsonValue::as_f64).collect(),
        _ => Vec::new(),
    }
}

/// The netCDF library's default fill value for a CDL type name, as `f64`.
///
/// `None` for `byte`, `ubyte`, `char` and `string`, which are never masked
/// by default.
pub fn default_fill_value(data_type: &str) -> Option<f64> {
    match data_type {
        // NC_FILL_FLOAT and NC_FILL_DOUBLE share the value 1.875 * 2^122
        "double" | "float" => Some(9.969_209_968_386_869e36),
        "short" => Some(-32_767.0),
        "ushort" => Some(65_535.0),
        "int" => Some(-2_147_483_647.0),
        "uint" => Some(4_294_967_295.0),
        "int64" => Some(-9_223_372_036_854_775_806_i64 as f64),
        "uint64" => Some(18_446_744_073_709_551_614_u64 as f64),
        _ => None,
    }
}

impl MissingPolicy {
    /// Builds the policy for `variable`, falling back to the default fill of
    /// its storage type when it declares no `_FillValue`.
    pub fn for_variable(variable: &Variable) -> Self {
        let mut policy = Self::from_attributes(&variable.attributes);
        if !variable.attributes.contains_key("_FillValue") {
            policy.fill_value = default_fill_value(&variable.data_type);
        }
        policy
    }

    pub fn from_attributes(attributes: &BTreeMap<String, JsonValue>) -> Self {
        let mut policy = Self {
            fill_value: attributes.get("_FillValue").and_then(as_scalar),
            missing_values: attributes
                .get("missing_value")
                .map(as_list)
                .unwrap_or_default(),
            scale_factor: attributes.get("scale_factor").and_then(as_scalar),
            add_offset: attributes.get("add_offset").and_then(as_scalar),
            ..Self::default()
        };

        if let Some(range) = attributes.get("valid_range").map(as_list) {
            if range.len() == 2 {
                policy.valid_min = Some(range[0]);
                policy.valid_max = Some(range[1]);
            }
        }
        // valid_min / valid_max take precedence over valid_range
        if let Some(min) = attributes.get("valid_min").and_then(as_scalar) {
            policy.valid_min = Some(min);
        }
        if let Some(max) = attributes.get("valid_max").and_then(as_scalar) {
            policy.valid_max = Some(max);
        }

        policy
    }

    /// Whether a stored value is missing
    pub fn is_missing(&self, raw: f64) -> bool {
        if raw.is_nan() {
            return true;
        }
        if self.fill_value == Some(raw) || self.missing_values.contains(&raw) {
            return true;
        }
        if self.valid_min.is_some_and(|min| raw < min) {
            return true;
        }
        self.valid_max.is_some_and(|max| raw > max)
    }

    /// Converts a stored value to its physical value
    pub fn unpack(&self, raw: f64) -> f64 {
        let scaled = match self.scale_factor {
            Some(scale) => raw * scale,
            None => raw,
        };
        match self.add_offset {
            Some(offset) => scaled + offset,
            None => scaled,
        }
    }

    pub fn is_packed(&self) -> bool {
        self.scale_factor.is_some() || self.add_offset.is_some()
    }

    /// Masks and unpacks `raw` in place, returning the per-element missing
    /// flags. Missing elements keep their stored value.
    pub fn apply(&self, raw: &mut [f64]) -> Vec<bool> {
        let packed = self.is_packed();
        raw.iter_mut()
            .map(|value| {
                let missing = self.is_missing(*value);
                if !missing && packed {
                    *value = self.unpack(*value);
                }
                missing
            })
            .collect()
    }
}
