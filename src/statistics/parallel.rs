//! Deterministic parallel accumulation
//!
//! Values are split into fixed-size chunks. Each chunk is accumulated
//! sequentially on some rayon worker, and the per-chunk partials are merged
//! sequentially in chunk order. The floating-point summation order therefore
//! depends only on [`CHUNK_LEN`], never on the number of threads or on work
//! stealing, and results are bit-for-bit reproducible.

use rayon::prelude::*;

/// Number of elements accumulated sequentially per task
pub const CHUNK_LEN: usize = 4096;

/// Count, sum and extrema of the non-missing values of a chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Moments {
    pub const EMPTY: Self = Self {
        count: 0,
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Combines two partials; `self` must cover the earlier elements
    pub fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

fn chunk_mask<'a>(mask: Option<&'a [bool]>, chunk_index: usize, len: usize) -> Option<&'a [bool]> {
    let start = chunk_index * CHUNK_LEN;
    mask.map(|m| &m[start..start + len])
}

fn valid_values<'a>(values: &'a [f64], mask: Option<&'a [bool]>) -> impl Iterator<Item = f64> + 'a {
    values
        .iter()
        .enumerate()
        .filter(move |(i, _)| mask.map_or(true, |m| !m[*i]))
        .map(|(_, &v)| v)
}

/// Accumulates count, sum, min and max over values whose mask entry is
/// `false` (all values when `mask` is `None`).
pub fn chunked_moments(values: &[f64], mask: Option<&[bool]>) -> Moments {
    let partials: Vec<Moments> = values
        .par_chunks(CHUNK_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            let mut moments = Moments::EMPTY;
            for value in valid_values(chunk, chunk_mask(mask, i, chunk.len())) {
                moments.push(value);
            }
            moments
        })
        .collect();

    partials.into_iter().fold(Moments::EMPTY, Moments::merge)
}

/// Sum of squared deviations from `mean` over the non-missing values
pub fn chunked_squared_deviation(values: &[f64], mask: Option<&[bool]>, mean: f64) -> f64 {
    let partials: Vec<f64> = values
        .par_chunks(CHUNK_LEN)
        .enumerate()
        .map(|(i, chunk)| {
            valid_values(chunk, chunk_mask(mask, i, chunk.len()))
                .map(|v| (v - mean) * (v - mean))
                .fold(0.0, |acc, d| acc + d)
        })
        .collect();

    partials.into_iter().fold(0.0, |acc, p| acc + p)
}
