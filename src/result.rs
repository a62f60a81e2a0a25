//! Computed spectra and their accumulation across trials.
//!
//! [`ComputedData`] is one series over the computation range: the x axis
//! (wavelength in nm or photon energy in eV), a real part and, for complex
//! modes, an imaginary part. Randomized runs add trial series element-wise
//! and divide by the trial count at the end.

use ndarray::Array1;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn series(y: [f64; 3], im: Option<[f64; 3]>) -> ComputedData {
        ComputedData {
            x: array![1.0, 2.0, 3.0],
            y_real: Array1::from(y.to_vec()),
            y_imaginary: im.map(|v| Array1::from(v.to_vec())),
        }
    }

    #[test]
    fn accumulate_then_normalize_gives_mean() {
        let mut acc = ComputedData::new_empty(array![1.0, 2.0, 3.0], true);
        acc += &series([1.0, 2.0, 3.0], Some([0.0, 1.0, 2.0]));
        acc += &series([3.0, 4.0, 5.0], Some([2.0, 3.0, 4.0]));
        acc.normalize(2.0);
        assert_eq!(acc.y_real, array![2.0, 3.0, 4.0]);
        assert_eq!(acc.y_imaginary, Some(array![1.0, 2.0, 3.0]));
    }

    #[test]
    fn real_series_has_no_imaginary_part() {
        let data = series([0.1, 0.2, 0.3], None);
        assert!(!data.is_complex());
        assert_eq!(data.len(), 3);
        let rows: Vec<_> = data.rows().collect();
        assert_eq!(rows[1], (2.0, 0.2, None));
    }
}

/// One computed series over the computation range.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedData {
    pub x: Array1<f64>,
    pub y_real: Array1<f64>,
    pub y_imaginary: Option<Array1<f64>>,
}

impl ComputedData {
    /// Zero-filled series over `x`, ready for accumulation.
    pub fn new_empty(x: Array1<f64>, complex: bool) -> Self {
        let n = x.len();
        Self {
            x,
            y_real: Array1::zeros(n),
            y_imaginary: complex.then(|| Array1::zeros(n)),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn is_complex(&self) -> bool {
        self.y_imaginary.is_some()
    }

    /// `(x, y_real, y_imaginary)` per sample point.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, Option<f64>)> + '_ {
        self.x.iter().enumerate().map(|(i, x)| {
            (
                *x,
                self.y_real[i],
                self.y_imaginary.as_ref().map(|im| im[i]),
            )
        })
    }

    /// Divides the accumulated series by the number of contributions.
    pub fn normalize(&mut self, count: f64) {
        self.y_real /= count;
        if let Some(im) = self.y_imaginary.as_mut() {
            *im /= count;
        }
    }
}

impl std::ops::AddAssign<&ComputedData> for ComputedData {
    fn add_assign(&mut self, item: &ComputedData) {
        self.y_real += &item.y_real;
        if let (Some(acc), Some(im)) = (self.y_imaginary.as_mut(), item.y_imaginary.as_ref()) {
            *acc += im;
        }
    }
}
