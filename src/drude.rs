//! Free-carrier response of metallic particles.
//!
//! - Drude: `ε = ε∞ − ω_pl² / (ω(ω + iγ))`
//! - Drude-Lorentz: Drude minus a sum of Lorentz oscillators
//!   `f_i / (ω² + iωγ_i − ω_i²)`
//!
//! Energies and dampings are in eV.

use num_complex::Complex64;

use crate::complex::{real, I};
use crate::optics::to_energy;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn drude_is_negative_below_plasma_frequency() {
        // ω = 1.2398 eV at 1000 nm
        let eps = drude(1000.0, 9.0, 0.05, 1.0);
        assert!(eps.re < -40.0, "eps = {}", eps);
        assert!(eps.im > 0.0);
    }

    #[test]
    fn no_oscillators_reduces_to_drude() {
        let plain = drude(600.0, 5.0, 0.1, 2.0);
        let lorentz = drude_lorentz(600.0, 5.0, 0.1, 2.0, &[]);
        assert_eq!(plain, lorentz);
    }

    #[test]
    fn oscillator_subtracts_resonance() {
        let osc = LorentzOscillator { f: 1.0, g: 0.2, w: 2.0 };
        let wl = crate::optics::to_wavelength(2.0);
        let base = drude(wl, 5.0, 0.1, 2.0);
        let eps = drude_lorentz(wl, 5.0, 0.1, 2.0, &[osc]);
        // at resonance the oscillator term is f / (iωγ) = -i·2.5
        assert_abs_diff_eq!((eps - base).im, 2.5, epsilon = 1e-9);
    }
}

/// One Lorentz oscillator of the Drude-Lorentz model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LorentzOscillator {
    /// Strength.
    pub f: f64,
    /// Damping (eV).
    pub g: f64,
    /// Resonance energy (eV).
    pub w: f64,
}

pub fn drude(wl: f64, w_plasma: f64, gamma: f64, eps_inf: f64) -> Complex64 {
    let w = real(to_energy(wl));
    real(eps_inf) - real(w_plasma * w_plasma) / (w * (w + I * gamma))
}

pub fn drude_lorentz(
    wl: f64,
    w_plasma: f64,
    gamma: f64,
    eps_inf: f64,
    oscillators: &[LorentzOscillator],
) -> Complex64 {
    let w = real(to_energy(wl));
    let lorentz: Complex64 = oscillators
        .iter()
        .map(|osc| real(osc.f) / (w * w + I * w * osc.g - osc.w * osc.w))
        .sum();
    drude(wl, w_plasma, gamma, eps_inf) - lorentz
}
