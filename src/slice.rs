//! Dimension-aware slicing
//!
//! A [`SliceSpec`] is keyed by dimension name and may be partial. It is
//! resolved once against a variable into a [`ResolvedSlice`]: one selection
//! per axis, in the variable's declared order, validated exhaustively before
//! any data is read.
//!
//! Only the bounding block of a selection is read from the container: each
//! axis contributes the smallest contiguous range covering its selected
//! indices, and the selection is then re-applied relative to that block.

use crate::array::MaterializedArray;
use crate::errors::{NcReaderError, Result};
use crate::masking::MissingPolicy;
use crate::metadata::Variable;
use ndarray::{ArrayD, ArrayView, Axis, IxDyn, Slice};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, instrument};

/// Selection along one named axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single index; removes the axis from the result
    Index(i64),
    /// Explicit indices in the given order; keeps the axis
    Indices(Vec<i64>),
    /// Contiguous `start..end`; keeps the axis
    Range { start: i64, end: i64 },
    /// The whole axis
    Full,
}

/// Name-keyed, possibly partial description of a selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceSpec {
    selectors: BTreeMap<String, Selector>,
}

impl SliceSpec {
    /// An empty specification, selecting every axis in full
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dim: impl Into<String>, selector: Selector) -> Self {
        self.selectors.insert(dim.into(), selector);
        self
    }

    /// Sets the selector for `dim`, returning the one it replaces
    pub fn insert(&mut self, dim: impl Into<String>, selector: Selector) -> Option<Selector> {
        self.selectors.insert(dim.into(), selector)
    }

    pub fn get(&self, dim: &str) -> Option<&Selector> {
        self.selectors.get(dim)
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.selectors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, Selector)> for SliceSpec {
    fn from_iter<I: IntoIterator<Item = (S, Selector)>>(iter: I) -> Self {
        Self {
            selectors: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Validated selection along one axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisSelection {
    Index(usize),
    Indices(Vec<usize>),
    Range(Range<usize>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAxis {
    pub dim: String,
    pub len: usize,
    pub selection: AxisSelection,
}

impl ResolvedAxis {
    /// Length of the axis after selection, `None` when the axis is dropped
    pub fn output_len(&self) -> Option<usize> {
        match &self.selection {
            AxisSelection::Index(_) => None,
            AxisSelection::Indices(indices) => Some(indices.len()),
            AxisSelection::Range(range) => Some(range.len()),
        }
    }

    /// Smallest contiguous range of the axis covering every selected index
    pub fn bounds(&self) -> Range<usize> {
        match &self.selection {
            AxisSelection::Index(index) => *index..*index + 1,
            AxisSelection::Indices(indices) => {
                match (indices.iter().min(), indices.iter().max()) {
                    (Some(&lo), Some(&hi)) => lo..hi + 1,
                    _ => 0..0,
                }
            }
            AxisSelection::Range(range) => range.clone(),
        }
    }

    /// The same selection expressed against [`Self::bounds`] instead of the
    /// whole axis
    fn rebased(&self) -> Self {
        let bounds = self.bounds();
        let start = bounds.start;
        let selection = match &self.selection {
            AxisSelection::Index(index) => AxisSelection::Index(index - start),
            AxisSelection::Indices(indices) => {
                AxisSelection::Indices(indices.iter().map(|i| i - start).collect())
            }
            AxisSelection::Range(range) => {
                AxisSelection::Range(range.start - start..range.end - start)
            }
        };
        Self {
            dim: self.dim.clone(),
            len: bounds.len(),
            selection,
        }
    }

    fn is_full(&self) -> bool {
        matches!(&self.selection, AxisSelection::Range(r) if r.start == 0 && r.end == self.len)
    }
}

fn check_index(dim: &str, index: i64, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| NcReaderError::IndexOutOfRange {
            dim: dim.to_string(),
            index,
            len,
        })
}

fn resolve_selector(dim: &str, len: usize, selector: &Selector) -> Result<AxisSelection> {
    match selector {
        Selector::Index(index) => Ok(AxisSelection::Index(check_index(dim, *index, len)?)),
        Selector::Indices(indices) => indices
            .iter()
            .map(|&index| check_index(dim, index, len))
            .collect::<Result<Vec<usize>>>()
            .map(AxisSelection::Indices),
        Selector::Range { start, end } => {
            if *start < 0 || start >= end {
                return Err(NcReaderError::InvalidRange {
                    dim: dim.to_string(),
                    start: *start,
                    end: *end,
                });
            }
            let start_idx = check_index(dim, *start, len)?;
            // end is exclusive, so `len` itself is allowed
            if usize::try_from(*end).map_or(true, |e| e > len) {
                return Err(NcReaderError::IndexOutOfRange {
                    dim: dim.to_string(),
                    index: *end,
                    len,
                });
            }
            Ok(AxisSelection::Range(start_idx..*end as usize))
        }
        Selector::Full => Ok(AxisSelection::Range(0..len)),
    }
}

/// A slice specification resolved against one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlice {
    axes: Vec<ResolvedAxis>,
}

impl ResolvedSlice {
    /// Resolves `spec` against the declared axis order of `variable`.
    ///
    /// # Errors
    ///
    /// - `UnknownDimension` if `spec` names a dimension the variable lacks
    /// - `IndexOutOfRange` for an index (or range end) beyond the axis
    /// - `InvalidRange` for a range with `start < 0` or `start >= end`
    pub fn resolve(variable: &Variable, spec: &SliceSpec) -> Result<Self> {
        for (dim, _) in spec.iter() {
            if variable.axis_of(dim).is_none() {
                return Err(NcReaderError::UnknownDimension {
                    var: variable.name.clone(),
                    dim: dim.to_string(),
                });
            }
        }

        let axes = variable
            .dimensions
            .iter()
            .zip(&variable.shape)
            .map(|(dim, &len)| {
                let selector = spec.get(dim).unwrap_or(&Selector::Full);
                Ok(ResolvedAxis {
                    dim: dim.clone(),
                    len,
                    selection: resolve_selector(dim, len, selector)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[ResolvedAxis] {
        &self.axes
    }

    /// Names of the axes that survive selection
    pub fn output_dims(&self) -> Vec<String> {
        self.axes
            .iter()
            .filter(|a| a.output_len().is_some())
            .map(|a| a.dim.clone())
            .collect()
    }

    pub fn output_shape(&self) -> Vec<usize> {
        self.axes.iter().filter_map(ResolvedAxis::output_len).collect()
    }

    /// Per-axis ranges of the block that has to be read
    pub fn block(&self) -> Vec<Range<usize>> {
        self.axes.iter().map(ResolvedAxis::bounds).collect()
    }

    /// Element count of [`Self::block`]
    pub fn block_len(&self) -> usize {
        self.axes.iter().map(|a| a.bounds().len()).product()
    }

    /// The selection relative to [`Self::block`], for applying to the values
    /// read from it
    pub fn within_block(&self) -> Self {
        Self {
            axes: self.axes.iter().map(ResolvedAxis::rebased).collect(),
        }
    }

    /// Applies the selection to an array shaped like the axes it describes.
    ///
    /// Axes are processed from last to first so that dropping an axis never
    /// shifts the position of one still to be processed.
    pub fn apply<T: Clone>(&self, source: ArrayD<T>) -> ArrayD<T> {
        let mut out = source;
        for (axis, resolved) in self.axes.iter().enumerate().rev() {
            if resolved.is_full() {
                continue;
            }
            out = match &resolved.selection {
                AxisSelection::Index(index) => out.index_axis(Axis(axis), *index).to_owned(),
                AxisSelection::Indices(indices) => out.select(Axis(axis), indices),
                AxisSelection::Range(range) => out
                    .slice_axis(Axis(axis), Slice::from(range.clone()))
                    .to_owned(),
            };
        }
        out
    }
}

/// Copies the elements of `block` out of `source` in row-major order.
///
/// # Errors
///
/// `InvalidSlice` when `block` does not have one range per axis or a range
/// runs past its axis.
pub fn extract_block<T: Clone>(
    source: ArrayView<'_, T, IxDyn>,
    block: &[Range<usize>],
) -> Result<Vec<T>> {
    if block.len() != source.ndim() {
        return Err(NcReaderError::InvalidSlice {
            message: format!("{} ranges for an array of rank {}", block.len(), source.ndim()),
        });
    }
    let mut view = source;
    for (axis, range) in block.iter().enumerate() {
        let len = view.len_of(Axis(axis));
        if range.start > range.end || range.end > len {
            return Err(NcReaderError::InvalidSlice {
                message: format!("block {range:?} exceeds axis {axis} of length {len}"),
            });
        }
        view.slice_axis_inplace(Axis(axis), Slice::from(range.clone()));
    }
    Ok(view.iter().cloned().collect())
}

/// Builds a [`MaterializedArray`] from the stored values of a whole variable.
///
/// Masking and unpacking are applied after selection, on the selected
/// elements only.
#[instrument(skip_all, fields(var = %variable.name))]
pub fn materialize(
    variable: &Variable,
    values: Vec<f64>,
    spec: &SliceSpec,
) -> Result<MaterializedArray> {
    if values.len() != variable.len() {
        return Err(NcReaderError::ShapeMismatch {
            var: variable.name.clone(),
            expected: variable.len(),
            actual: values.len(),
        });
    }
    let resolved = ResolvedSlice::resolve(variable, spec)?;
    let whole = ArrayView::from_shape(IxDyn(&variable.shape), &values)?;
    let block = extract_block(whole, &resolved.block())?;
    materialize_resolved(variable, block, &resolved)
}

/// Builds a [`MaterializedArray`] from the stored values of the block
/// `resolved` covers.
pub(crate) fn materialize_resolved(
    variable: &Variable,
    block_values: Vec<f64>,
    resolved: &ResolvedSlice,
) -> Result<MaterializedArray> {
    let expected = resolved.block_len();
    if block_values.len() != expected {
        return Err(NcReaderError::ShapeMismatch {
            var: variable.name.clone(),
            expected,
            actual: block_values.len(),
        });
    }

    let block_shape: Vec<usize> = resolved.block().iter().map(|r| r.len()).collect();
    let raw = ArrayD::from_shape_vec(IxDyn(&block_shape), block_values)?;
    let mut selected = resolved.within_block().apply(raw);
    if !selected.is_standard_layout() {
        selected = selected.as_standard_layout().to_owned();
    }

    let policy = MissingPolicy::for_variable(variable);
    let shape = selected.raw_dim();
    let mut flat = selected.into_raw_vec();
    let mask = policy.apply(&mut flat);
    let data = ArrayD::from_shape_vec(shape.clone(), flat)?;
    let mask = ArrayD::from_shape_vec(shape, mask)?;

    let array = MaterializedArray::new(
        variable.name.clone(),
        resolved.output_dims(),
        variable.data_type.clone(),
        data,
        Some(mask),
    )?;
    debug!(
        shape = ?array.shape(),
        missing = array.missing_count(),
        "materialized slice"
    );
    Ok(array)
}
