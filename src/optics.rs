//! Shared optical vocabulary: polarization, computation modes, unit
//! conversions and the external media that bound a structure.
//!
//! Every computation receives an [`OpticalParams`] context instead of reading
//! ambient state, so concurrent computations never share anything mutable.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::Deserialize;

use crate::adachi;
use crate::complex::real;


/// Photon energy (eV) times wavelength (nm).
pub const ENERGY_WAVELENGTH_PRODUCT: f64 = 1239.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    S,
    P,
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarization::S => write!(f, "S"),
            Polarization::P => write!(f, "P"),
        }
    }
}

impl FromStr for Polarization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" => Ok(Polarization::S),
            "p" => Ok(Polarization::P),
            other => Err(format!("unknown polarization '{}', expected 's' or 'p'", other)),
        }
    }
}

/// What a computation produces for each sample point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Reflectance,
    Transmittance,
    Absorbance,
    Permittivity,
    RefractiveIndex,
    ExtinctionCoefficient,
    ScatteringCoefficient,
}

impl Mode {
    /// Modes that produce a real and an imaginary series.
    pub fn is_complex(&self) -> bool {
        matches!(self, Mode::Permittivity | Mode::RefractiveIndex)
    }

    /// Modes that depend on polarization and angle of incidence.
    pub fn is_angular(&self) -> bool {
        matches!(
            self,
            Mode::Reflectance | Mode::Transmittance | Mode::Absorbance
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Reflectance => "REFLECTANCE",
            Mode::Transmittance => "TRANSMITTANCE",
            Mode::Absorbance => "ABSORBANCE",
            Mode::Permittivity => "PERMITTIVITY",
            Mode::RefractiveIndex => "REFRACTIVE_INDEX",
            Mode::ExtinctionCoefficient => "EXTINCTION_COEFFICIENT",
            Mode::ScatteringCoefficient => "SCATTERING_COEFFICIENT",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reflectance" => Ok(Mode::Reflectance),
            "transmittance" => Ok(Mode::Transmittance),
            "absorbance" => Ok(Mode::Absorbance),
            "permittivity" => Ok(Mode::Permittivity),
            "refractive_index" => Ok(Mode::RefractiveIndex),
            "extinction_coefficient" => Ok(Mode::ExtinctionCoefficient),
            "scattering_coefficient" => Ok(Mode::ScatteringCoefficient),
            other => Err(format!("unknown computation mode '{}'", other)),
        }
    }
}

/// Semi-infinite medium on either side of the structure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Medium {
    Air,
    /// Bulk GaAs described by the simple Adachi model without absorption.
    Gaas,
    /// Constant complex refractive index.
    Custom { n_re: f64, n_im: f64 },
}

impl Medium {
    pub fn refractive_index(&self, wl: f64) -> Complex64 {
        match self {
            Medium::Air => real(1.0),
            Medium::Gaas => {
                to_refractive_index(adachi::simple_permittivity_scaled(to_energy(wl), 0.0, 0.0))
            }
            Medium::Custom { n_re, n_im } => Complex64::new(*n_re, *n_im),
        }
    }
}

/// Per-computation context passed explicitly to every layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalParams {
    pub mode: Mode,
    pub polarization: Polarization,
    /// Angle of incidence in degrees.
    pub angle: f64,
    /// Temperature in kelvin.
    pub temperature: f64,
    pub left: Medium,
    pub right: Medium,
}

impl Default for OpticalParams {
    fn default() -> Self {
        Self {
            mode: Mode::Reflectance,
            polarization: Polarization::S,
            angle: 0.0,
            temperature: 300.0,
            left: Medium::Air,
            right: Medium::Air,
        }
    }
}

pub fn to_energy(wl: f64) -> f64 {
    ENERGY_WAVELENGTH_PRODUCT / wl
}

pub fn to_wavelength(energy: f64) -> f64 {
    ENERGY_WAVELENGTH_PRODUCT / energy
}

/// n + ik from permittivity, with the non-negative extinction branch.
pub fn to_refractive_index(eps: Complex64) -> Complex64 {
    let modulus = eps.norm();
    Complex64::new(
        ((modulus + eps.re) / 2.0).sqrt(),
        ((modulus - eps.re) / 2.0).sqrt(),
    )
}

pub fn to_permittivity(n: Complex64) -> Complex64 {
    n * n
}

/// Absorption coefficient α = 4πk/λ in cm⁻¹ for a wavelength in nm.
pub fn extinction_coefficient(n: Complex64, wl: f64) -> f64 {
    4.0 * PI * n.im / nm_to_cm(wl)
}

pub fn nm_to_cm(length: f64) -> f64 {
    length * 1e-7
}
