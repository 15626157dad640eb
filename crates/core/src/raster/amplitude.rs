//! Amplitude extraction from real and complex images
//!
//! SAR acquisitions arrive either as detected (real-valued) intensity or as
//! single-look complex samples. Both are reduced to a non-negative amplitude
//! field before any comparison; the pipeline downstream is purely real.

use crate::raster::Raster;
use ndarray::Array2;
use num_complex::Complex64;

/// Per-cell magnitude of a real-valued image.
///
/// NaN cells stay NaN; everything else maps to its absolute value. The
/// output shares the input's shape and carries NaN as its nodata marker.
pub fn amplitude(image: &Raster<f64>) -> Raster<f64> {
    let mut out = Raster::from_array(image.data().mapv(f64::abs));
    out.set_nodata(Some(f64::NAN));
    out
}

/// Per-cell modulus of a complex-valued image.
///
/// A NaN real or imaginary part yields a NaN amplitude cell.
pub fn amplitude_of_complex(image: &Array2<Complex64>) -> Raster<f64> {
    let mut out = Raster::from_array(image.mapv(|c| c.norm()));
    out.set_nodata(Some(f64::NAN));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_abs() {
        let image = Raster::from_vec(vec![-3.0, 4.0, 0.0, -0.5], 2, 2).unwrap();
        let amp = amplitude(&image);
        assert_eq!(amp.get(0, 0).unwrap(), 3.0);
        assert_eq!(amp.get(0, 1).unwrap(), 4.0);
        assert_eq!(amp.get(1, 1).unwrap(), 0.5);
    }

    #[test]
    fn test_amplitude_preserves_nan() {
        let image = Raster::from_vec(vec![f64::NAN, 1.0, 2.0, 3.0], 2, 2).unwrap();
        let amp = amplitude(&image);
        assert!(amp.get(0, 0).unwrap().is_nan());
        assert_eq!(amp.get(1, 1).unwrap(), 3.0);
    }

    #[test]
    fn test_amplitude_of_complex_modulus() {
        let image = Array2::from_shape_vec(
            (1, 2),
            vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, -2.0)],
        )
        .unwrap();
        let amp = amplitude_of_complex(&image);
        assert!((amp.get(0, 0).unwrap() - 5.0).abs() < 1e-12);
        assert!((amp.get(0, 1).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_amplitude_of_complex_nan_component() {
        let image =
            Array2::from_shape_vec((1, 1), vec![Complex64::new(f64::NAN, 1.0)]).unwrap();
        let amp = amplitude_of_complex(&image);
        assert!(amp.get(0, 0).unwrap().is_nan());
    }
}
