//! Drawing plot specs
//!
//! [`PlotRenderer`] is the seam between plot preparation and a drawing
//! backend. [`BitmapRenderer`] draws to a raster file with `plotters`.
//!
//! Axes and titles are not drawn since the bitmap backend is built without
//! font support; the image holds the data only.

use crate::errors::{NcReaderError, Result};
use crate::plot::PlotSpec;
use ndarray::Array2;
use plotters::prelude::*;
use plotters::style::{HSLColor, RGBColor};
use std::path::{Path, PathBuf};
use tracing::info;

const MISSING_CELL: RGBColor = RGBColor(190, 190, 190);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
        }
    }
}

pub trait PlotRenderer {
    fn render(&self, spec: &PlotSpec) -> Result<()>;
}

/// Renders to an image file; the format follows the file extension.
pub struct BitmapRenderer {
    path: PathBuf,
    options: PlotOptions,
}

fn render_error(err: impl std::fmt::Display) -> NcReaderError {
    NcReaderError::Render(err.to_string())
}

/// Finite min and max of `values`, widened when they coincide
fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    if lo == hi {
        Some((lo - 0.5, hi + 0.5))
    } else {
        Some((lo, hi))
    }
}

/// Splits a series into runs of finite points
fn segments(values: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            current.push((i as f64, v));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Blue for the low end of the range, red for the high end
fn cell_color(value: f64, (lo, hi): (f64, f64)) -> ShapeStyle {
    if !value.is_finite() {
        return MISSING_CELL.filled();
    }
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    HSLColor((1.0 - t) * 240.0 / 360.0, 0.8, 0.5).filled()
}

impl BitmapRenderer {
    pub fn new(path: impl Into<PathBuf>, options: PlotOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn draw_line(&self, title: &str, values: &[f64]) -> Result<()> {
        let (lo, hi) = value_range(values).ok_or_else(|| NcReaderError::EmptyData {
            var: title.to_string(),
        })?;
        let root = BitMapBackend::new(&self.path, (self.options.width, self.options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let x_max = values.len().saturating_sub(1).max(1) as f64;
        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(0f64..x_max, lo..hi)
            .map_err(render_error)?;

        for run in segments(values) {
            chart
                .draw_series(LineSeries::new(run, &BLUE))
                .map_err(render_error)?;
        }
        root.present().map_err(render_error)?;
        Ok(())
    }

    fn draw_heatmap(&self, title: &str, values: &Array2<f64>) -> Result<()> {
        let range = value_range(values.iter()).ok_or_else(|| NcReaderError::EmptyData {
            var: title.to_string(),
        })?;
        let (n_rows, n_cols) = values.dim();

        let root = BitMapBackend::new(&self.path, (self.options.width, self.options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .build_cartesian_2d(0f64..n_cols as f64, 0f64..n_rows as f64)
            .map_err(render_error)?;

        // row 0 at the top
        chart
            .draw_series(values.indexed_iter().map(|((i, j), &v)| {
                let y = (n_rows - i - 1) as f64;
                let x = j as f64;
                Rectangle::new([(x, y), (x + 1.0, y + 1.0)], cell_color(v, range))
            }))
            .map_err(render_error)?;
        root.present().map_err(render_error)?;
        Ok(())
    }
}

impl PlotRenderer for BitmapRenderer {
    fn render(&self, spec: &PlotSpec) -> Result<()> {
        match spec {
            PlotSpec::Line { title, values, .. } => self.draw_line(title, values)?,
            PlotSpec::Heatmap { title, values, .. } => self.draw_heatmap(title, values)?,
        }
        info!(path = %self.path.display(), title = spec.title(), "saved plot");
        Ok(())
    }
}
