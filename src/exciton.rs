//! Exciton resonance of a quantum well layer.
//!
//! The resonance enters a layer in two places:
//! - the permittivity, through the continuum contribution of
//!   Bolshakov & Chaldyshev, J. Appl. Phys. 121, 133101 (2017), eq. 6 and 9
//! - the transfer matrix, through the resonance term
//!   `S = γ0e / (ω − ω0 + iΓ)` folded into all four entries

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::complex::{real, I, ONE};
use crate::error::Result;
use crate::matrix::TransferMatrix;
use crate::optics::{to_energy, to_wavelength, Polarization};
use crate::params::{ComplexSlot, Slot};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn exciton(g0: f64) -> Exciton<f64> {
        Exciton {
            w0: 1.5,
            g0,
            g: 0.001,
            wb: 1.51,
            gb: 0.002,
            b: 0.05,
            c: ComplexSlot::constant("c", Complex64::new(0.0, 0.0)),
        }
    }

    #[test]
    fn no_radiative_broadening_means_no_contribution() {
        let x = exciton(0.0).contribution(800.0, 10.0, real(3.6)).unwrap();
        assert_abs_diff_eq!(x.norm(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn resonance_peaks_at_exciton_energy() {
        let ex = exciton(0.0001);
        let on = ex.resonance(to_wavelength(1.5), ONE, Polarization::S).unwrap();
        let off = ex.resonance(to_wavelength(1.4), ONE, Polarization::S).unwrap();
        assert!(on.norm() > 10.0 * off.norm());
        // on resonance S is purely imaginary: γ0 / (iΓ)
        assert_abs_diff_eq!(on.im, -0.1, epsilon = 1e-9);
    }

    #[test]
    fn polarizations_project_differently() {
        let ex = exciton(0.0001);
        let cos = real(0.5);
        let s = ex.resonance(800.0, cos, Polarization::S).unwrap();
        let p = ex.resonance(800.0, cos, Polarization::P).unwrap();
        assert_abs_diff_eq!((s / p).re, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_resonance_gives_plain_phase_matrix() {
        let phi = Complex64::new(0.3, 0.01);
        let m = resonant_matrix(phi, Complex64::new(0.0, 0.0));
        assert_eq!(m.get(0, 1), Complex64::new(0.0, 0.0));
        assert_abs_diff_eq!((m.get(0, 0) - (I * phi).exp()).norm(), 0.0, epsilon = 1e-15);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exciton<S> {
    /// Resonance energy (eV).
    pub w0: S,
    /// Radiative broadening (eV).
    pub g0: S,
    /// Non-radiative broadening (eV).
    pub g: S,
    /// ω0 plus the exciton binding energy (eV).
    pub wb: S,
    /// Broadening of the continuum edge (eV).
    pub gb: S,
    /// Magnitude coefficient, between 2 Ry (bulk) and 16 Ry (2D).
    pub b: S,
    /// Additive background constant.
    pub c: ComplexSlot<S>,
}

impl<S: Slot> Exciton<S> {
    /// Excitonic contribution `X` to the well permittivity.
    ///
    /// **Context**: An excitonic layer has permittivity
    /// `ε = ε_medium · (1 + X + C)`. `X` couples the resonance to the band
    /// to band continuum just above it.
    ///
    /// **How it Works**: The effective radiative width
    /// `2Γ0 / sin(k·d)` uses the wave vector of the medium at the resonance
    /// wavelength. The continuum term is
    /// `(π/2 − atan(ωb / q)) / q` with `q = √(−ω² − iΓb·ω)`.
    pub fn contribution(&self, wl: f64, thickness: f64, n_medium: Complex64) -> Result<Complex64> {
        let w = to_energy(wl);
        let w0 = self.w0.value()?;

        let wave_vector = n_medium * 2.0 * PI / to_wavelength(w0);
        let w_eff = real(2.0 * self.g0.value()?) / (wave_vector * thickness).sin();

        let q = Complex64::new(-w * w, -self.gb.value()? * w).sqrt();
        let continuum = (real(self.wb.value()?) / q).atan();
        let eps_continuum = (real(PI / 2.0) - continuum) / q;

        Ok(w_eff * w0 * 2.0 * eps_continuum / self.b.value()?)
    }

    /// Resonance term `S` at wavelength `wl` for a wave with propagation
    /// cosine `cos` inside the layer.
    pub fn resonance(&self, wl: f64, cos: Complex64, polarization: Polarization) -> Result<Complex64> {
        let g0 = self.g0.value()?;
        let gamma0e = match polarization {
            Polarization::P => g0 * cos.re,
            Polarization::S => g0 * (ONE / cos).re,
        };
        Ok(real(gamma0e) / Complex64::new(to_energy(wl) - self.w0.value()?, self.g.value()?))
    }

    pub fn slots(&self) -> Vec<&S> {
        let mut slots = vec![&self.w0, &self.g0, &self.g, &self.wb, &self.gb, &self.b];
        slots.extend(self.c.slots());
        slots
    }

    pub fn slots_mut(&mut self) -> Vec<&mut S> {
        let mut slots = vec![
            &mut self.w0,
            &mut self.g0,
            &mut self.g,
            &mut self.wb,
            &mut self.gb,
            &mut self.b,
        ];
        slots.extend(self.c.slots_mut());
        slots
    }
}

/// Transfer matrix of a layer with phase `phi` and resonance term `s`.
pub fn resonant_matrix(phi: Complex64, s: Complex64) -> TransferMatrix {
    TransferMatrix::from_entries(
        (I * phi).exp() * (ONE - I * s),
        -I * s,
        I * s,
        (-I * phi).exp() * (ONE + I * s),
    )
}
