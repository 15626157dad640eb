//! Raster data structures and operations

mod amplitude;
mod element;
mod grid;

pub use amplitude::{amplitude, amplitude_of_complex};
pub use element::RasterElement;
pub use grid::{Raster, RasterStatistics};
