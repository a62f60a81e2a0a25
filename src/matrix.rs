//! 2×2 complex transfer matrices.
//!
//! A transfer matrix maps forward/backward field amplitudes on the incident
//! side of an element to those on the far side. Stacks compose by
//! pre-multiplication: the matrix of every later element (in the direction of
//! propagation) multiplies the accumulated product from the left.

use std::ops::Mul;

use nalgebra::Matrix2;
use num_complex::Complex64;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(a: f64, b: f64) -> TransferMatrix {
        let mut m = TransferMatrix::identity();
        m.set(0, 0, Complex64::new(a, 1.0));
        m.set(0, 1, Complex64::new(b, -0.5));
        m.set(1, 0, Complex64::new(0.25, b));
        m.set(1, 1, Complex64::new(1.0, a));
        m
    }

    #[test]
    fn identity_is_neutral() {
        let m = sample(2.0, 3.0);
        assert_eq!(m * TransferMatrix::identity(), m);
        assert_eq!(TransferMatrix::identity() * m, m);
    }

    #[test]
    fn pow_matches_repeated_product() {
        let m = sample(0.3, 0.7);
        let expected = m * m * m;
        let got = m.pow(3);
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(got.get(i, j).re, expected.get(i, j).re, epsilon = 1e-12);
                assert_abs_diff_eq!(got.get(i, j).im, expected.get(i, j).im, epsilon = 1e-12);
            }
        }
        assert_eq!(m.pow(0), TransferMatrix::identity());
    }

    #[test]
    fn compose_pre_multiplies_in_traversal_order() {
        let first = sample(1.0, 2.0);
        let second = sample(-1.0, 0.5);
        let stack = TransferMatrix::compose([first, second]);
        assert_eq!(stack, second * first);
        assert_ne!(stack, first * second);
    }

    #[test]
    fn det_and_inverse() {
        let m = sample(2.0, 1.0);
        let det = m.det();
        let expected = m.get(0, 0) * m.get(1, 1) - m.get(0, 1) * m.get(1, 0);
        assert_abs_diff_eq!(det.re, expected.re, epsilon = 1e-12);
        let product = m * m.inverse().unwrap();
        assert_abs_diff_eq!(product.get(0, 0).re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(product.get(0, 1).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_matrix_poisons_products() {
        let m = TransferMatrix::nan() * TransferMatrix::identity();
        assert!(m.get(1, 1).re.is_nan());
    }
}

/// 2×2 complex transfer matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferMatrix(pub Matrix2<Complex64>);

impl TransferMatrix {
    pub fn identity() -> Self {
        Self(Matrix2::identity())
    }

    /// Matrix filled with NaN, used where a value is undefined.
    pub fn nan() -> Self {
        let nan = Complex64::new(f64::NAN, f64::NAN);
        Self(Matrix2::new(nan, nan, nan, nan))
    }

    pub fn diagonal(m00: Complex64, m11: Complex64) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self(Matrix2::new(m00, zero, zero, m11))
    }

    /// Both diagonal entries equal `diagonal`, both off-diagonal entries equal `anti`.
    pub fn symmetric(diagonal: Complex64, anti: Complex64) -> Self {
        Self(Matrix2::new(diagonal, anti, anti, diagonal))
    }

    pub fn from_entries(m00: Complex64, m01: Complex64, m10: Complex64, m11: Complex64) -> Self {
        Self(Matrix2::new(m00, m01, m10, m11))
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.0[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Complex64) {
        self.0[(row, col)] = value;
    }

    pub fn det(&self) -> Complex64 {
        self.get(0, 0) * self.get(1, 1) - self.get(0, 1) * self.get(1, 0)
    }

    /// Inverse, or `None` when the determinant vanishes.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.det();
        if det.norm() == 0.0 {
            return None;
        }
        Some(Self::from_entries(
            self.get(1, 1) / det,
            -self.get(0, 1) / det,
            -self.get(1, 0) / det,
            self.get(0, 0) / det,
        ))
    }

    /// Integer power by repeated squaring; `pow(0)` is the identity.
    pub fn pow(&self, mut exponent: u32) -> Self {
        let mut base = *self;
        let mut acc = Self::identity();
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exponent >>= 1;
        }
        acc
    }

    /// Folds matrices given in traversal order into a stack matrix.
    pub fn compose<I>(matrices: I) -> Self
    where
        I: IntoIterator<Item = TransferMatrix>,
    {
        matrices
            .into_iter()
            .fold(Self::identity(), |acc, next| next * acc)
    }
}

impl Mul for TransferMatrix {
    type Output = TransferMatrix;

    fn mul(self, rhs: TransferMatrix) -> TransferMatrix {
        TransferMatrix(self.0 * rhs.0)
    }
}
