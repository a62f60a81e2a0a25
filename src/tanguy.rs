//! Wannier exciton dispersion after Tanguy, Phys. Rev. Lett. 75, 4090 (1995).
//!
//! The model sums the bound and continuum exciton states in closed form
//! through the function
//! `g(ξ) = 2 ln ξ − 2π cot(πξ) − 2ψ(ξ) − 1/ξ`
//! where ψ is the digamma function, evaluated here by a truncated series.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::complex::{real, ONE, ZERO};
use crate::error::Result;
use crate::params::Slot;


pub const EULER_MASCHERONI: f64 = 0.5772156649015329;
const DIGAMMA_TERMS: usize = 1000;

/// Electron rest mass (kg).
const M0: f64 = 9.1093837015e-31;
/// Planck constant (J·s).
const H: f64 = 6.62607015e-34;
/// Elementary charge (C).
const Q: f64 = 1.602176634e-19;
/// Vacuum permittivity (F/m).
const EPS0: f64 = 8.85418781762039e-12;

/// Digamma function by the truncated series
/// `ψ(z) = −γ + Σ_{n=0}^{N−1} (1/(n+1) − 1/(n+z))`.
pub fn digamma(z: Complex64) -> Complex64 {
    (0..DIGAMMA_TERMS).fold(real(-EULER_MASCHERONI), |acc, n| {
        let n = n as f64;
        acc + real(1.0 / (n + 1.0)) - ONE / (z + n)
    })
}

/// General Tanguy 1995 model. Masses are in units of the electron rest mass,
/// energies in eV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tanguy95 {
    pub m_e: f64,
    pub m_hh: f64,
    pub exciton_rydberg: f64,
    pub eg: f64,
    pub gamma: f64,
    /// Squared dipole matrix element.
    pub matrix_element: f64,
    pub eps_infrared: f64,
}

impl Tanguy95 {
    fn strength(&self) -> f64 {
        let h_bar = H / (2.0 * PI);
        let reduced_mass = M0 * self.m_e * self.m_hh / (self.m_e + self.m_hh);
        h_bar * h_bar * Q * Q / (2.0 * PI * EPS0 * M0 * M0)
            * (2.0 * reduced_mass / (h_bar * h_bar)).powf(1.5)
            * self.matrix_element
    }

    fn xi(&self, z: Complex64) -> Complex64 {
        (real(self.exciton_rydberg) / (real(self.eg) - z)).sqrt()
    }

    fn g(xi: Complex64) -> Complex64 {
        let cot = ONE / (xi * PI).tan();
        2.0 * xi.ln() - 2.0 * PI * cot - 2.0 * digamma(xi) - ONE / xi
    }

    /// Permittivity at photon energy `w` (eV).
    pub fn permittivity(&self, w: f64) -> Complex64 {
        let energy = Complex64::new(w, self.gamma);
        let prefactor =
            self.strength() * self.exciton_rydberg.sqrt() / (energy * energy * self.eps_infrared);
        let sum = Self::g(self.xi(energy)) + Self::g(self.xi(-energy)) - 2.0 * Self::g(self.xi(ZERO));
        prefactor * sum + self.eps_infrared
    }
}

/// Tanguy 1995 parameters of a custom layer, possibly variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Tanguy95Params<S> {
    pub m_e: S,
    pub m_hh: S,
    pub exciton_rydberg: S,
    pub eg: S,
    pub gamma: S,
    pub matrix_element: S,
    pub eps_infrared: S,
}

impl<S: Slot> Tanguy95Params<S> {
    pub fn model(&self) -> Result<Tanguy95> {
        Ok(Tanguy95 {
            m_e: self.m_e.value()?,
            m_hh: self.m_hh.value()?,
            exciton_rydberg: self.exciton_rydberg.value()?,
            eg: self.eg.value()?,
            gamma: self.gamma.value()?,
            matrix_element: self.matrix_element.value()?,
            eps_infrared: self.eps_infrared.value()?,
        })
    }

    pub fn slots(&self) -> Vec<&S> {
        vec![
            &self.m_e,
            &self.m_hh,
            &self.exciton_rydberg,
            &self.eg,
            &self.gamma,
            &self.matrix_element,
            &self.eps_infrared,
        ]
    }

    pub fn slots_mut(&mut self) -> Vec<&mut S> {
        vec![
            &mut self.m_e,
            &mut self.m_hh,
            &mut self.exciton_rydberg,
            &mut self.eg,
            &mut self.gamma,
            &mut self.matrix_element,
            &mut self.eps_infrared,
        ]
    }
}
