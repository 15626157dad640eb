//! # sarchange Algorithms
//!
//! Pairwise change detection for co-registered SAR intensity images.
//!
//! Pipeline stages, in dependency order:
//!
//! - **smoothing**: local mean filter with nearest-edge replication
//! - **power**: squared amplitude, smoothed (local power)
//! - **asymmetry**: normalized power-asymmetry map for an image pair
//! - **isolation**: seeded isolation forest outlier labeling
//! - **change**: signed change classification and the `detect_changes`
//!   entry points
//!
//! ```
//! use sarchange_algorithms::prelude::*;
//!
//! let first = Raster::filled(8, 8, 1.0);
//! let mut second = Raster::filled(8, 8, 1.0);
//! second.set(4, 4, 20.0).unwrap();
//!
//! let params = DetectParams { contamination: 0.1, ..DetectParams::default() };
//! let map = detect_changes(&first, &second, &params).unwrap();
//! assert_eq!(map.shape(), (8, 8));
//! ```

pub mod asymmetry;
pub mod change;
pub mod isolation;
pub mod power;
pub mod smoothing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::asymmetry::asymmetry_map;
    pub use crate::change::{
        classify_changes, detect_changes, detect_changes_complex, detect_changes_with_scorer,
        ChangeDetection, DetectParams, CHANGE_APPEARANCE, CHANGE_DISAPPEARANCE, CHANGE_NONE,
    };
    pub use crate::isolation::{AnomalyScorer, IsolationForest};
    pub use crate::power::filtered_power;
    pub use crate::smoothing::{uniform_smooth, FilterWindow};
    pub use sarchange_core::prelude::*;
}
