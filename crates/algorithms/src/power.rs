//! Locally averaged power from an amplitude field

use crate::smoothing::{uniform_smooth, FilterWindow};
use sarchange_core::raster::Raster;
use sarchange_core::{Error, Result};

/// Square an amplitude field, then smooth it.
///
/// Squaring must precede smoothing: the asymmetry measure needs the local
/// mean of squares (power), not the square of the local mean amplitude.
///
/// # Arguments
/// * `amplitude` - Non-negative amplitude field
/// * `window` - Smoothing window
pub fn filtered_power(amplitude: &Raster<f64>, window: FilterWindow) -> Result<Raster<f64>> {
    if amplitude.is_empty() {
        return Err(Error::EmptyInput("filtered_power"));
    }

    let squared = Raster::from_array(amplitude.data().mapv(|v| v * v));
    uniform_smooth(&squared, window)
}
