//! Plot preparation
//!
//! [`prepare_for_plot`] turns a materialized array into a [`PlotSpec`] that a
//! [`crate::render::PlotRenderer`] can draw. Nothing here touches a drawing
//! backend.
//!
//! Missing elements become NaN in a [`PlotSpec`]; renderers leave gaps for them.
//!
//! Arrays of rank 3 or more are reduced to their first two axes by fixing
//! every further axis at `len / 2`. The result is one exact slice through the
//! middle of the data, not a summary of it, and is titled `"<var> (slice)"`
//! with the fixed indices listed in [`PlotSpec::Heatmap::reduction`].

use crate::array::MaterializedArray;
use crate::errors::{NcReaderError, Result};
use ndarray::{Array2, Ix2};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum PlotSpec {
    /// Values against their index
    Line {
        title: String,
        values: Vec<f64>,
        x_label: String,
        y_label: String,
    },
    /// A grid of values; rows follow the first axis, columns the second
    Heatmap {
        title: String,
        values: Array2<f64>,
        rows_dim: String,
        cols_dim: String,
        /// Axes fixed to reach rank 2, with the index each was fixed at
        reduction: Vec<(String, usize)>,
    },
}

impl PlotSpec {
    pub fn title(&self) -> &str {
        match self {
            PlotSpec::Line { title, .. } | PlotSpec::Heatmap { title, .. } => title,
        }
    }

    /// Whether fixed indices were applied to reach a drawable rank
    pub fn is_reduced(&self) -> bool {
        matches!(self, PlotSpec::Heatmap { reduction, .. } if !reduction.is_empty())
    }
}

/// Builds a line spec for rank 1, a heatmap for rank 2 and a mid-index slice
/// heatmap for higher ranks.
///
/// # Errors
///
/// `UnsupportedRank` for a scalar, `EmptyData` when an axis that has to be
/// fixed has length zero.
pub fn prepare_for_plot(array: &MaterializedArray) -> Result<PlotSpec> {
    let name = array.name();
    match array.rank() {
        0 => Err(NcReaderError::UnsupportedRank {
            var: name.to_string(),
            rank: 0,
            operation: "plot",
        }),
        1 => Ok(PlotSpec::Line {
            title: name.to_string(),
            values: array.filled(f64::NAN).iter().copied().collect(),
            x_label: "Index".to_string(),
            y_label: "Value".to_string(),
        }),
        _ => {
            let mut reduced = array.clone();
            let mut reduction = Vec::new();
            while reduced.rank() > 2 {
                let dim = reduced.dims()[2].clone();
                let len = reduced.shape()[2];
                if len == 0 {
                    return Err(NcReaderError::EmptyData {
                        var: name.to_string(),
                    });
                }
                let mid = len / 2;
                reduced = reduced.index_axis(2, mid);
                reduction.push((dim, mid));
            }
            if !reduction.is_empty() {
                debug!(var = %name, ?reduction, "reduced to a mid-index slice for plotting");
            }

            let title = if reduction.is_empty() {
                name.to_string()
            } else {
                format!("{name} (slice)")
            };
            let values = reduced.filled(f64::NAN).into_dimensionality::<Ix2>()?;

            Ok(PlotSpec::Heatmap {
                title,
                values,
                rows_dim: reduced.dims()[0].clone(),
                cols_dim: reduced.dims()[1].clone(),
                reduction,
            })
        }
    }
}
