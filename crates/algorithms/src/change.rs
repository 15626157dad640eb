//! Pairwise amplitude change detection
//!
//! End-to-end pipeline over two co-registered acquisitions:
//! validate inputs, take amplitudes, build the power-asymmetry map, label
//! statistical outliers in its flattened values, then sign each flagged
//! pixel by the amplitude difference. The output is a change map with
//! values -1 (disappearance), 0 (no change) and +1 (appearance).

use crate::asymmetry::asymmetry_map;
use crate::isolation::{AnomalyScorer, IsolationForest};
use crate::smoothing::FilterWindow;
use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;
use sarchange_core::raster::{amplitude, amplitude_of_complex, Raster};
use sarchange_core::{Algorithm, Error, Result};

/// Change map cell values
pub const CHANGE_DISAPPEARANCE: i8 = -1;
pub const CHANGE_NONE: i8 = 0;
pub const CHANGE_APPEARANCE: i8 = 1;

/// Parameters for change detection
#[derive(Debug, Clone)]
pub struct DetectParams {
    /// Smoothing window for the power fields. Larger windows smooth the
    /// asymmetry map: fewer false positives, blurrier change boundaries.
    pub filter_size: FilterWindow,
    /// Expected fraction of changed pixels, strictly inside (0, 1).
    /// Higher values flag more pixels.
    pub contamination: f64,
    /// Seed for the isolation forest
    pub seed: u64,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            filter_size: FilterWindow::default(),
            contamination: 0.02,
            seed: 0,
        }
    }
}

/// Detect changes between two real-valued images.
///
/// Values may be negative; the pipeline compares per-pixel magnitudes.
/// Deterministic for a fixed input pair and seed.
///
/// # Arguments
/// * `first` - Image at time T1
/// * `second` - Image at time T2, same shape
/// * `params` - Window, contamination and seed
///
/// # Returns
/// `Raster<i8>` of the same shape, every cell in {-1, 0, 1}
pub fn detect_changes(
    first: &Raster<f64>,
    second: &Raster<f64>,
    params: &DetectParams,
) -> Result<Raster<i8>> {
    let forest = IsolationForest::with_seed(params.seed);
    detect_changes_with_scorer(first, second, params, &forest)
}

/// Detect changes between two single-look complex images.
///
/// Takes the complex modulus per cell and runs the real-valued pipeline.
pub fn detect_changes_complex(
    first: &Array2<Complex64>,
    second: &Array2<Complex64>,
    params: &DetectParams,
) -> Result<Raster<i8>> {
    let amp_first = amplitude_of_complex(first);
    let amp_second = amplitude_of_complex(second);
    detect_changes(&amp_first, &amp_second, params)
}

/// Detect changes with a caller-supplied anomaly scorer.
///
/// The pipeline is otherwise identical to [`detect_changes`]; substituting
/// a deterministic stub scorer makes the surrounding stages testable in
/// isolation from the stochastic forest.
pub fn detect_changes_with_scorer(
    first: &Raster<f64>,
    second: &Raster<f64>,
    params: &DetectParams,
    scorer: &dyn AnomalyScorer,
) -> Result<Raster<i8>> {
    // Validation short-circuits: nothing below runs on bad input.
    if first.is_empty() || second.is_empty() {
        return Err(Error::EmptyInput("detect_changes"));
    }
    let (rows, cols) = first.shape();
    if second.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: second.rows(),
            ac: second.cols(),
        });
    }
    if !(0.0 < params.contamination && params.contamination < 1.0) {
        return Err(Error::InvalidParameter {
            name: "contamination",
            value: params.contamination.to_string(),
            reason: "must lie strictly between 0 and 1".into(),
        });
    }

    log::debug!(
        "detecting changes on {rows}x{cols} pair, window {}x{}, contamination {}",
        params.filter_size.rows(),
        params.filter_size.cols(),
        params.contamination
    );

    let amp_first = amplitude(first);
    let amp_second = amplitude(second);

    let asym = asymmetry_map(&amp_first, &amp_second, params.filter_size)?;

    // The scorer sees the flat value distribution only, never the shape.
    let values: Vec<f64> = asym.data().iter().copied().collect();
    let labels = scorer
        .fit_and_label(&values, params.contamination)
        .map_err(|e| Error::Algorithm(format!("anomaly scoring failed: {e}")))?;
    if labels.len() != values.len() {
        return Err(Error::Algorithm(format!(
            "anomaly scorer returned {} labels for {} values",
            labels.len(),
            values.len()
        )));
    }

    let mask = Array2::from_shape_vec((rows, cols), labels)
        .map_err(|e| Error::Other(format!("anomaly mask reshape: {e}")))?;

    let map = classify_changes(&mask, &amp_first, &amp_second)?;
    log::debug!(
        "change map ready: {} pixels flagged",
        map.data().iter().filter(|&&v| v != CHANGE_NONE).count()
    );
    Ok(map)
}

/// Convert an anomaly mask plus the amplitude pair into a signed change map.
///
/// Per pixel, `difference = secondary - primary`. Where the mask is set the
/// output is +1 for `difference > 0` and -1 otherwise; a tie
/// (`difference == 0`) classifies as disappearance, which is deliberate
/// policy. Unmasked pixels are 0.
pub fn classify_changes(
    mask: &Array2<bool>,
    primary: &Raster<f64>,
    secondary: &Raster<f64>,
) -> Result<Raster<i8>> {
    let (rows, cols) = primary.shape();
    if mask.dim() != (rows, cols) || secondary.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: mask.nrows(),
            ac: mask.ncols(),
        });
    }

    let data: Vec<i8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![CHANGE_NONE; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if !mask[(row, col)] {
                    continue;
                }
                let p = unsafe { primary.get_unchecked(row, col) };
                let s = unsafe { secondary.get_unchecked(row, col) };
                *out = if s - p > 0.0 {
                    CHANGE_APPEARANCE
                } else {
                    CHANGE_DISAPPEARANCE
                };
            }
            row_data
        })
        .collect();

    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(format!("change map reshape: {e}")))?;
    Ok(Raster::from_array(array))
}

/// Change detection algorithm, for registry-style dispatch.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetection;

impl Algorithm for ChangeDetection {
    type Input = (Raster<f64>, Raster<f64>);
    type Output = Raster<i8>;
    type Params = DetectParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "AmplitudeChangeDetection"
    }

    fn description(&self) -> &'static str {
        "Detect pairwise amplitude changes via local power asymmetry and isolation forest outlier labeling"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        detect_changes(&input.0, &input.1, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scorer with a fixed answer, for exercising the pipeline wiring.
    struct FixedScorer(Vec<bool>);

    impl AnomalyScorer for FixedScorer {
        fn fit_and_label(&self, _values: &[f64], _contamination: f64) -> Result<Vec<bool>> {
            Ok(self.0.clone())
        }
    }

    struct FailingScorer;

    impl AnomalyScorer for FailingScorer {
        fn fit_and_label(&self, _values: &[f64], _contamination: f64) -> Result<Vec<bool>> {
            Err(Error::Other("fit degenerated".into()))
        }
    }

    #[test]
    fn test_classify_sign_rule() {
        let mask = Array2::from_elem((2, 2), true);
        let primary = Raster::from_vec(vec![1.0, 5.0, 2.0, 2.0], 2, 2).unwrap();
        let secondary = Raster::from_vec(vec![4.0, 1.0, 2.0, 9.0], 2, 2).unwrap();

        let map = classify_changes(&mask, &primary, &secondary).unwrap();
        assert_eq!(map.get(0, 0).unwrap(), CHANGE_APPEARANCE);
        assert_eq!(map.get(0, 1).unwrap(), CHANGE_DISAPPEARANCE);
        // Tie classifies as disappearance by policy.
        assert_eq!(map.get(1, 0).unwrap(), CHANGE_DISAPPEARANCE);
        assert_eq!(map.get(1, 1).unwrap(), CHANGE_APPEARANCE);
    }

    #[test]
    fn test_classify_zero_outside_mask() {
        let mask = Array2::from_elem((3, 3), false);
        let primary = Raster::filled(3, 3, 1.0);
        let secondary = Raster::filled(3, 3, 9.0);

        let map = classify_changes(&mask, &primary, &secondary).unwrap();
        assert!(map.data().iter().all(|&v| v == CHANGE_NONE));
    }

    #[test]
    fn test_classify_shape_mismatch() {
        let mask = Array2::from_elem((2, 3), true);
        let primary = Raster::filled(2, 2, 1.0);
        let secondary = Raster::filled(2, 2, 1.0);
        assert!(classify_changes(&mask, &primary, &secondary).is_err());
    }

    #[test]
    fn test_stub_scorer_drives_the_map() {
        let first = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let second = Raster::from_vec(vec![9.0, 2.0, 3.0, 0.5], 2, 2).unwrap();
        let scorer = FixedScorer(vec![true, false, false, true]);

        let map =
            detect_changes_with_scorer(&first, &second, &DetectParams::default(), &scorer)
                .unwrap();
        assert_eq!(map.get(0, 0).unwrap(), CHANGE_APPEARANCE);
        assert_eq!(map.get(0, 1).unwrap(), CHANGE_NONE);
        assert_eq!(map.get(1, 0).unwrap(), CHANGE_NONE);
        assert_eq!(map.get(1, 1).unwrap(), CHANGE_DISAPPEARANCE);
    }

    #[test]
    fn test_scorer_failure_is_wrapped_not_masked() {
        let first = Raster::filled(2, 2, 1.0);
        let second = Raster::filled(2, 2, 2.0);
        let err =
            detect_changes_with_scorer(&first, &second, &DetectParams::default(), &FailingScorer)
                .unwrap_err();
        assert!(matches!(err, Error::Algorithm(_)));
        assert!(err.to_string().contains("anomaly scoring failed"));
    }

    #[test]
    fn test_wrong_label_count_is_an_error() {
        let first = Raster::filled(2, 2, 1.0);
        let second = Raster::filled(2, 2, 2.0);
        let scorer = FixedScorer(vec![true]);
        let err =
            detect_changes_with_scorer(&first, &second, &DetectParams::default(), &scorer)
                .unwrap_err();
        assert!(matches!(err, Error::Algorithm(_)));
    }

    #[test]
    fn test_validation_short_circuits() {
        let a = Raster::filled(2, 2, 1.0);
        let b = Raster::filled(3, 2, 1.0);
        let err = detect_changes(&a, &b, &DetectParams::default()).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));

        let empty: Raster<f64> = Raster::new(0, 0);
        let err = detect_changes(&empty, &empty, &DetectParams::default()).unwrap_err();
        assert!(err.is_validation());

        let bad = DetectParams {
            contamination: 1.5,
            ..DetectParams::default()
        };
        let err = detect_changes(&a, &a, &bad).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_identical_inputs_give_zero_map() {
        let image = Raster::from_vec((1..=16).map(|v| v as f64).collect(), 4, 4).unwrap();
        let map = detect_changes(&image, &image, &DetectParams::default()).unwrap();
        assert!(map.data().iter().all(|&v| v == CHANGE_NONE));
    }

    #[test]
    fn test_all_zero_amplitudes_do_not_crash() {
        // Both power fields are zero everywhere: the asymmetry map is
        // entirely infinite, which must flow through scoring untouched.
        let zeros = Raster::filled(4, 4, 0.0);
        let map = detect_changes(&zeros, &zeros, &DetectParams::default()).unwrap();
        assert!(map.data().iter().all(|&v| v == CHANGE_NONE));
    }

    #[test]
    fn test_concrete_two_by_two_scenario() {
        let first = Raster::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let second = Raster::from_vec(vec![4.0, 3.0, 2.0, 1.0], 2, 2).unwrap();
        let params = DetectParams {
            filter_size: FilterWindow::new(2, 2).unwrap(),
            ..DetectParams::default()
        };

        let map = detect_changes(&first, &second, &params).unwrap();
        assert_eq!(map.shape(), (2, 2));
        for row in 0..2 {
            for col in 0..2 {
                let v = map.get(row, col).unwrap();
                assert!((-1..=1).contains(&v));
                let diff = second.get(row, col).unwrap() - first.get(row, col).unwrap();
                if v == CHANGE_APPEARANCE {
                    assert!(diff > 0.0);
                } else if v == CHANGE_DISAPPEARANCE {
                    assert!(diff <= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_nan_pixels_never_change() {
        let mut first = Raster::filled(4, 4, 1.0);
        first.set(2, 2, f64::NAN).unwrap();
        let mut second = Raster::filled(4, 4, 1.0);
        second.set(0, 3, f64::NAN).unwrap();
        // Give the scorer something non-degenerate to chew on.
        second.set(3, 0, 25.0).unwrap();

        let params = DetectParams {
            contamination: 0.1,
            ..DetectParams::default()
        };
        let map = detect_changes(&first, &second, &params).unwrap();
        assert_eq!(map.get(2, 2).unwrap(), CHANGE_NONE);
        assert_eq!(map.get(0, 3).unwrap(), CHANGE_NONE);
    }

    #[test]
    fn test_complex_entry_point() {
        let first = Array2::from_elem((3, 3), Complex64::new(1.0, 0.0));
        let mut second = first.clone();
        second[(1, 1)] = Complex64::new(0.0, 12.0);

        let params = DetectParams {
            contamination: 0.2,
            ..DetectParams::default()
        };
        let map = detect_changes_complex(&first, &second, &params).unwrap();
        assert_eq!(map.shape(), (3, 3));
        assert!(map.data().iter().all(|&v| (-1..=1).contains(&v)));
    }

    #[test]
    fn test_algorithm_trait_dispatch() {
        let image = Raster::from_vec((1..=16).map(|v| v as f64).collect(), 4, 4).unwrap();
        let algo = ChangeDetection;
        assert_eq!(algo.name(), "AmplitudeChangeDetection");
        let map = algo.execute_default((image.clone(), image)).unwrap();
        assert_eq!(map.shape(), (4, 4));
    }
}
