//! Generalized Snell's law for complex refractive indices.
//!
//! Layers never store an angle. Each one derives the complex cosine of the
//! propagation angle inside itself from the angle of incidence in the left
//! external medium:
//! - `sin²θ₂ = sin²θ₁ · (n₁/n₂)²`
//! - `cosθ₂ = √(1 − sin²θ₂)` on the principal branch
//!
//! For absorbing layers, and beyond the critical angle, the cosine is complex.
//! That is what makes the phase sign convention in [`crate::layer`]
//! necessary.

use num_complex::Complex64;

use crate::complex::{real, ONE};
use crate::optics::OpticalParams;

#[cfg(test)]
mod tests {

    use super::*;
    use crate::optics::Medium;
    use approx::assert_abs_diff_eq;

    fn params(angle: f64) -> OpticalParams {
        OpticalParams {
            angle,
            ..OpticalParams::default()
        }
    }

    #[test]
    fn normal_incidence() {
        let cos = cos_theta_in_layer(Complex64::new(1.31, 0.0), 500.0, &params(0.0));
        assert_abs_diff_eq!(cos.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cos.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn same_media_keeps_angle() {
        let cos = cos_theta_in_layer(real(1.0), 500.0, &params(45.0));
        assert_abs_diff_eq!(cos.re, cos_theta_incident(45.0), epsilon = 1e-12);
    }

    #[test]
    fn angle30_incidence() {
        // θ_t = asin(sin 30° / 1.31) = 0.3916126 rad
        let cos = cos_theta_in_layer(real(1.31), 500.0, &params(30.0));
        assert_abs_diff_eq!(cos.re, 0.3916126_f64.cos(), epsilon = 1e-6);
    }

    #[test]
    fn beyond_critical_angle_is_imaginary() {
        let params = OpticalParams {
            angle: 60.0,
            left: Medium::Custom { n_re: 3.0, n_im: 0.0 },
            ..OpticalParams::default()
        };
        let cos = cos_theta_in_layer(real(1.0), 500.0, &params);
        assert_abs_diff_eq!(cos.re, 0.0, epsilon = 1e-12);
        assert!(cos.im.abs() > 1.0);
    }
}

/// Cosine of the angle of incidence given in degrees.
pub fn cos_theta_incident(angle: f64) -> f64 {
    angle.to_radians().cos()
}

/// Complex cosine of the propagation angle inside a medium of index `n`.
///
/// **Context**: The transfer matrix of every layer and interface needs the
/// projection of the wave vector onto the stack normal. For absorbing media
/// the angle is complex, so the cosine must be computed without ever forming
/// the angle itself.
///
/// **How it Works**: Applies Snell's law against the left external medium at
/// wavelength `wl`, then takes the principal square root of `1 − sin²θ`.
pub fn cos_theta_in_layer(n: Complex64, wl: f64, params: &OpticalParams) -> Complex64 {
    let n1 = params.left.refractive_index(wl);
    let cos1 = cos_theta_incident(params.angle);
    let sin1_sq = real(1.0 - cos1 * cos1);
    let ratio = n1 / n;
    let sin2_sq = sin1_sq * ratio * ratio;
    (ONE - sin2_sq).sqrt()
}
