//! Statistics over materialized arrays
//!
//! Missing elements never take part in a computation.
//!
//! # Organization
//!
//! - [`operations`]: the [`Summary`] and the [`statistics`] entry point
//! - [`parallel`]: deterministic chunked accumulation on the rayon pool

pub mod operations;
pub mod parallel;

pub use operations::{statistics, Summary, PREVIEW_VALUES};
pub use parallel::{chunked_moments, Moments, CHUNK_LEN};
