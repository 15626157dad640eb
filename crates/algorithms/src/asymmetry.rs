//! Normalized power-asymmetry map between two amplitude fields
//!
//! The measure compares locally averaged power from two co-registered
//! acquisitions. Where local power is symmetric the value is 1; changed
//! areas pull it away from 1. Missing (NaN) cells are masked out, zero
//! filled for the smoothing pass, and re-imposed afterwards: the smoother
//! cannot skip missing values natively, and the zero fill deliberately
//! participates in the neighbors' averages.

use crate::power::filtered_power;
use crate::smoothing::FilterWindow;
use ndarray::Array2;
use rayon::prelude::*;
use sarchange_core::raster::Raster;
use sarchange_core::{Error, Result};

/// Guard added to the ratio denominator so cells where both power fields
/// are exactly zero divide cleanly. The inverted value there is infinite
/// rather than NaN; that is defined behavior, not an error.
pub const EPSILON: f64 = 1e-10;

/// Build the asymmetry map for a pair of amplitude fields.
///
/// Per cell, with `p` and `s` the smoothed power of the primary and
/// secondary field:
///
/// `asym = 2 * (sqrt(p * s) + 1e-10) / (p + s)`
///
/// computed as the reciprocal of the normalized power sum, so perfectly
/// symmetric pairs yield exactly 1. Cells that are NaN in either input are
/// NaN in the output regardless of what the smoothed powers produced.
///
/// # Arguments
/// * `primary` - Amplitude field of the first acquisition
/// * `secondary` - Amplitude field of the second acquisition
/// * `window` - Smoothing window for the power fields
///
/// # Returns
/// Asymmetry field with the same shape as the inputs
pub fn asymmetry_map(
    primary: &Raster<f64>,
    secondary: &Raster<f64>,
    window: FilterWindow,
) -> Result<Raster<f64>> {
    if primary.is_empty() || secondary.is_empty() {
        return Err(Error::EmptyInput("asymmetry_map"));
    }

    let (rows, cols) = primary.shape();
    if secondary.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: secondary.rows(),
            ac: secondary.cols(),
        });
    }

    // Step 1-2: mask missing cells, zero-fill copies before smoothing so
    // NaN does not propagate through the windowed means.
    let mut nanmask = Array2::from_elem((rows, cols), false);
    let mut primary_filled = primary.data().clone();
    let mut secondary_filled = secondary.data().clone();
    for ((mask, p), s) in nanmask
        .iter_mut()
        .zip(primary_filled.iter_mut())
        .zip(secondary_filled.iter_mut())
    {
        if p.is_nan() || s.is_nan() {
            *mask = true;
            *p = 0.0;
            *s = 0.0;
        }
    }

    // Step 3: smoothed power fields.
    let power_primary = filtered_power(&Raster::from_array(primary_filled), window)?;
    let power_secondary = filtered_power(&Raster::from_array(secondary_filled), window)?;

    // Steps 4-6: normalized ratio, inverted, with NaN re-imposed.
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if nanmask[(row, col)] {
                    continue;
                }
                let p = unsafe { power_primary.get_unchecked(row, col) };
                let s = unsafe { power_secondary.get_unchecked(row, col) };
                let ratio = (p + s) / (2.0 * ((p * s).sqrt() + EPSILON));
                *out = ratio.recip();
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(format!("asymmetry_map reshape: {e}")))?;
    let mut output = Raster::from_array(array);
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}
