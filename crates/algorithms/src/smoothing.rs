//! Uniform (local mean) smoothing with edge replication
//!
//! The asymmetry measure compares locally averaged power, so the smoother
//! is the leaf of the whole pipeline. Out-of-bounds neighbors replicate the
//! nearest in-bounds edge cell; no zero padding, no wraparound.

use ndarray::Array2;
use rayon::prelude::*;
use sarchange_core::raster::Raster;
use sarchange_core::{Error, Result};

/// Smoothing window dimensions in cells.
///
/// Immutable configuration: both dimensions must be positive, enforced at
/// construction so downstream stages never re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterWindow {
    rows: usize,
    cols: usize,
}

impl FilterWindow {
    /// Create a window of `rows` x `cols` cells.
    ///
    /// Returns an `InvalidParameter` error if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidParameter {
                name: "filter_size",
                value: format!("({rows}, {cols})"),
                reason: "window dimensions must be positive".into(),
            });
        }
        Ok(Self { rows, cols })
    }

    /// Window height in cells
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Window width in cells
    pub fn cols(&self) -> usize {
        self.cols
    }
}

impl Default for FilterWindow {
    fn default() -> Self {
        Self { rows: 3, cols: 3 }
    }
}

/// Local mean filter with "nearest" boundary handling.
///
/// Every output cell is the arithmetic mean of the input cells inside the
/// window centered on it. Neighbors falling outside the grid are replaced
/// by the nearest in-bounds cell (clamped indexing). Even window sizes take
/// the extra cell on the leading side: a window of size `k` covers offsets
/// `-(k/2) ..= k - 1 - k/2`.
///
/// # Arguments
/// * `raster` - Input field
/// * `window` - Smoothing window dimensions
///
/// # Returns
/// Raster of identical shape holding the windowed means
pub fn uniform_smooth(raster: &Raster<f64>, window: FilterWindow) -> Result<Raster<f64>> {
    if raster.is_empty() {
        return Err(Error::EmptyInput("uniform_smooth"));
    }

    let (rows, cols) = raster.shape();
    let (wr, wc) = (window.rows() as isize, window.cols() as isize);

    let row_lo = -(wr / 2);
    let row_hi = wr - 1 - wr / 2;
    let col_lo = -(wc / 2);
    let col_hi = wc - 1 - wc / 2;
    let norm = 1.0 / (wr * wc) as f64;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let mut sum = 0.0;
                for dr in row_lo..=row_hi {
                    let nr = (row as isize + dr).clamp(0, rows as isize - 1) as usize;
                    for dc in col_lo..=col_hi {
                        let nc = (col as isize + dc).clamp(0, cols as isize - 1) as usize;
                        sum += unsafe { raster.get_unchecked(nr, nc) };
                    }
                }
                *out = sum * norm;
            }

            row_data
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(format!("uniform_smooth reshape: {e}")))?;
    let mut output = Raster::from_array(data);
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}
