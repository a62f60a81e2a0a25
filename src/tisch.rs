//! Temperature-dependent permittivity of wurtzite Al(x)Ga(1-x)N.
//!
//! Tisch et al., J. Appl. Phys. 89, 2676 (2001). A single broadened E0
//! critical point plus a background constant, with every coefficient a
//! quadratic in temperature. GaN is the `c_al = 0` member.

use num_complex::Complex64;

use crate::complex::ONE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gan_below_gap_has_positive_index() {
        // 3.0 eV is below the ~3.43 eV room temperature gap
        let eps = permittivity(3.0, 0.0, 300.0);
        assert!(eps.re > 4.0 && eps.re < 8.0, "eps = {}", eps);
    }

    #[test]
    fn gap_shrinks_with_temperature() {
        assert!(gap(0.0, 300.0) < gap(0.0, 10.0));
        assert!(gap(0.3, 300.0) > gap(0.0, 300.0));
    }
}

/// Band gap (eV) with the Bose-Einstein temperature correction.
pub fn gap(c_al: f64, temperature: f64) -> f64 {
    3.502 + 1.35 * c_al + 0.99 * c_al * c_al - 0.224 / ((386.0 / temperature).exp() - 1.0)
}

fn strength(c_al: f64, t: f64) -> f64 {
    79.30 - 8.37e-2 * t + 6.73e-5 * t * t + (18.99 + 0.13 * t - 1.76e-4 * t * t) * c_al + 37.51 * c_al * c_al
}

fn background(c_al: f64, t: f64) -> f64 {
    2.49 + 2.27e-3 * t - 1.80e-6 * t * t - (0.74 + 4.61e-3 * t - 5.33e-6 * t * t) * c_al
}

/// Broadening in eV.
fn broadening(c_al: f64, t: f64) -> f64 {
    (-8.69 + 4.13e-2 * t + (248.24 - 0.19 * t) * c_al * c_al) * 1e-3
}

/// Permittivity at photon energy `w` (eV) and `temperature` (K).
pub fn permittivity(w: f64, c_al: f64, temperature: f64) -> Complex64 {
    let eg = gap(c_al, temperature);
    let y = Complex64::new(w, broadening(c_al, temperature)) / eg;
    let factor = (2.0 * ONE - (ONE + y).sqrt() - (ONE - y).sqrt()) / (y * y);
    factor * (strength(c_al, temperature) / eg.powf(1.5)) + background(c_al, temperature)
}
