//! # sarchange Core
//!
//! Core types for the sarchange amplitude change detection library.
//!
//! This crate provides:
//! - `Raster<T>`: Generic 2D raster grid type
//! - Amplitude extraction for real and complex images
//! - The `Algorithm` trait for a consistent API
//! - The shared error taxonomy (validation vs. computation errors)

pub mod error;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{amplitude, amplitude_of_complex, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{amplitude, amplitude_of_complex, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in sarchange.
///
/// Algorithms are pure functions that transform input data according to
/// parameters: no I/O, no persistent state, no mutation of inputs.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
