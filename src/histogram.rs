//! 2D histogramming of a column pair.
//!
//! Binning follows the usual convention: every bin is half-open
//! `[e_i, e_{i+1})` except the last one, which also holds its right edge.
//! Points outside the binning range, and NaNs, are dropped.

use serde::{Deserialize, Serialize};

use crate::error::{DstError, Result};

/// Closed interval `(lo, hi)` used for both binning ranges and plot limits.
pub type Interval = (f64, f64);

// ---------------------------------------------------------------------------
// Binning configuration
// ---------------------------------------------------------------------------

/// How an axis is cut into bins.
#[derive(Debug, Clone, PartialEq)]
pub enum Bins {
    /// Same number of uniform bins on both axes.
    Count(usize),
    /// Uniform bins, possibly different per axis.
    PerAxis(usize, usize),
    /// Explicit, strictly increasing edges for each axis.
    Edges { x: Vec<f64>, y: Vec<f64> },
}

impl From<usize> for Bins {
    fn from(n: usize) -> Self {
        Bins::Count(n)
    }
}

/// Range over which the uniform bins are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinRange {
    /// Observed min/max of each column.
    #[default]
    Auto,
    /// Fixed range per axis.
    Explicit { x: Interval, y: Interval },
    /// Use the panel's display limits (`xlim`, `ylim`) as binning range.
    AsPlotLimits,
}

// ---------------------------------------------------------------------------
// Histogram2D
// ---------------------------------------------------------------------------

/// Counts on a `bins_x × bins_y` grid with the matching bin edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    /// Row-major over x: `counts[ix * bins_y + iy]`.
    counts: Vec<u32>,
}

impl Histogram2D {
    /// Assemble a histogram from parts, checking the grid is consistent.
    pub fn from_parts(x_edges: Vec<f64>, y_edges: Vec<f64>, counts: Vec<u32>) -> Result<Self> {
        check_edges(&x_edges, "x")?;
        check_edges(&y_edges, "y")?;
        let expected = (x_edges.len() - 1) * (y_edges.len() - 1);
        if counts.len() != expected {
            return Err(DstError::InvalidBins(format!(
                "{} counts for a grid of {expected} cells",
                counts.len()
            )));
        }
        Ok(Histogram2D {
            x_edges,
            y_edges,
            counts,
        })
    }

    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    pub fn bins_x(&self) -> usize {
        self.x_edges.len() - 1
    }

    pub fn bins_y(&self) -> usize {
        self.y_edges.len() - 1
    }

    pub fn count(&self, ix: usize, iy: usize) -> u32 {
        self.counts[ix * self.bins_y() + iy]
    }

    /// Raw counts, row-major over x.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Number of entries that landed inside the grid.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Same grid, 1 where the bin was ever populated and 0 elsewhere.
    pub fn acceptance_mask(&self) -> Histogram2D {
        Histogram2D {
            x_edges: self.x_edges.clone(),
            y_edges: self.y_edges.clone(),
            counts: self.counts.iter().map(|&c| u32::from(c > 0)).collect(),
        }
    }

    /// `log10(count)`, NaN for empty bins.
    pub fn log10_counts(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| log10_or_nan(c)).collect()
    }

    /// Iterate `(ix, iy, count)` with x as the outer loop.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u32)> + '_ {
        let ny = self.bins_y();
        self.counts
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i / ny, i % ny, c))
    }
}

pub fn log10_or_nan(count: u32) -> f64 {
    if count > 0 {
        f64::from(count).log10()
    } else {
        f64::NAN
    }
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Bin `(xs[i], ys[i])` pairs.
///
/// `range` is only used for [`Bins::Count`] / [`Bins::PerAxis`]; `None` means
/// the observed extent of each column.
pub fn histogram2d(
    xs: &[f64],
    ys: &[f64],
    bins: &Bins,
    range: Option<(Interval, Interval)>,
) -> Result<Histogram2D> {
    if xs.len() != ys.len() {
        return Err(DstError::InvalidBins(format!(
            "x has {} values but y has {}",
            xs.len(),
            ys.len()
        )));
    }

    let (x_edges, y_edges) = match bins {
        Bins::Count(n) => build_edges(xs, ys, *n, *n, range)?,
        Bins::PerAxis(nx, ny) => build_edges(xs, ys, *nx, *ny, range)?,
        Bins::Edges { x, y } => {
            check_edges(x, "x")?;
            check_edges(y, "y")?;
            (x.clone(), y.clone())
        }
    };

    let nx = x_edges.len() - 1;
    let ny = y_edges.len() - 1;
    let mut counts = vec![0u32; nx * ny];
    let mut dropped = 0usize;

    for (&x, &y) in xs.iter().zip(ys) {
        let (Some(ix), Some(iy)) = (bin_index(&x_edges, x), bin_index(&y_edges, y)) else {
            dropped += 1;
            continue;
        };
        counts[ix * ny + iy] += 1;
    }
    if dropped > 0 {
        log::warn!(
            "{dropped} of {} points fall outside the binning range or are NaN",
            xs.len()
        );
    }

    Ok(Histogram2D {
        x_edges,
        y_edges,
        counts,
    })
}

fn build_edges(
    xs: &[f64],
    ys: &[f64],
    nx: usize,
    ny: usize,
    range: Option<(Interval, Interval)>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (x_range, y_range) = match range {
        Some((x, y)) => (check_range(x, "x")?, check_range(y, "y")?),
        None => (data_extent(xs), data_extent(ys)),
    };
    Ok((
        uniform_edges(x_range, nx)?,
        uniform_edges(y_range, ny)?,
    ))
}

/// Observed extent, widened by 0.5 on each side when degenerate.
fn data_extent(values: &[f64]) -> Interval {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

fn check_range((lo, hi): Interval, axis: &str) -> Result<Interval> {
    if !lo.is_finite() || !hi.is_finite() {
        return Err(DstError::InvalidRange(format!(
            "{axis} range ({lo}, {hi}) is not finite"
        )));
    }
    if lo > hi {
        return Err(DstError::InvalidRange(format!(
            "{axis} range ({lo}, {hi}) is reversed"
        )));
    }
    if lo == hi {
        return Ok((lo - 0.5, hi + 0.5));
    }
    Ok((lo, hi))
}

fn uniform_edges((lo, hi): Interval, n: usize) -> Result<Vec<f64>> {
    if n == 0 {
        return Err(DstError::InvalidBins("bin count must be at least 1".into()));
    }
    let step = (hi - lo) / n as f64;
    let mut edges: Vec<f64> = (0..n).map(|i| lo + i as f64 * step).collect();
    edges.push(hi);
    Ok(edges)
}

fn check_edges(edges: &[f64], axis: &str) -> Result<()> {
    if edges.len() < 2 {
        return Err(DstError::InvalidBins(format!(
            "{axis} needs at least two edges, got {}",
            edges.len()
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DstError::InvalidBins(format!(
            "{axis} edges must be finite and strictly increasing"
        )));
    }
    Ok(())
}

/// Index of the bin holding `v`, `None` when outside the edges.
fn bin_index(edges: &[f64], v: f64) -> Option<usize> {
    let lo = edges[0];
    let hi = edges[edges.len() - 1];
    if v.is_nan() || v < lo || v > hi {
        return None;
    }
    let n = edges.len() - 1;
    if v == hi {
        return Some(n - 1);
    }
    // Number of edges <= v, minus one.
    let idx = edges.partition_point(|&e| e <= v) - 1;
    Some(idx.min(n - 1))
}
