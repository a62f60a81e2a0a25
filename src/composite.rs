//! Host medium with embedded particles.
//!
//! - Maxwell-Garnett effective medium: an effective permittivity
//! - Mie: medium permittivity plus extinction and scattering coefficients,
//!   see [`crate::mie`]
//! - Persson sphere lattice, Phys. Rev. B 28, 4247 (1983): reflection and
//!   transmission of a 2D square array of spheres, turned directly into a
//!   transfer matrix

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::complex::{I, ONE};
use crate::error::Result;
use crate::layer::Layer;
use crate::matrix::TransferMatrix;
use crate::optics::{to_refractive_index, OpticalParams, Polarization};
use crate::params::Slot;
use crate::particle::Particle;
use crate::snell::cos_theta_in_layer;


/// Host layer and particles shared by every composite variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite<S> {
    pub d: S,
    pub medium: Box<Layer<S>>,
    pub particle: Particle<S>,
}

impl<S: Slot> Composite<S> {
    pub fn medium_permittivity(&self, wl: f64, temperature: f64) -> Result<Complex64> {
        self.medium.permittivity(wl, temperature)
    }

    pub fn particle_permittivity(&self, wl: f64) -> Result<Complex64> {
        self.particle.permittivity(wl)
    }

    pub fn slots(&self) -> Vec<&S> {
        let mut slots = vec![&self.d];
        slots.extend(self.medium.slots());
        slots.extend(self.particle.slots());
        slots
    }

    pub fn slots_mut(&mut self) -> Vec<&mut S> {
        let mut slots = vec![&mut self.d];
        slots.extend(self.medium.slots_mut());
        slots.extend(self.particle.slots_mut());
        slots
    }
}

/// Maxwell-Garnett permittivity for a volume fraction `f` of particles.
pub fn effective_medium_permittivity(eps_medium: Complex64, eps_particle: Complex64, f: f64) -> Complex64 {
    if f == 0.0 {
        return eps_medium;
    }
    let contrast = eps_particle - eps_medium;
    let numerator = contrast * f * 2.0 + eps_particle + eps_medium * 2.0;
    let denominator = eps_medium * 2.0 + eps_particle - contrast * f;
    eps_medium * (numerator / denominator)
}

/// Reflection and transmission amplitudes of a square lattice of spheres.
///
/// **Context**: A monolayer of spheres whose diameter equals the layer
/// thickness `d`, with lattice period `lattice_factor · d / 2`.
///
/// **How it Works**: Each sphere has the quasi-static polarizability
/// `α = R³(εp − εm)/(εp + 2εm)`. Dipole coupling through `U0 = 9.03/a³`
/// renormalizes it separately for in-plane and out-of-plane dipoles. The
/// amplitudes follow from the renormalized polarizabilities and the
/// propagation angle in the host.
pub fn spheres_lattice_rt(
    wl: f64,
    params: &OpticalParams,
    d: f64,
    lattice_factor: f64,
    eps_medium: Complex64,
    eps_particle: Complex64,
) -> (Complex64, Complex64) {
    let radius = d / 2.0;
    let a = lattice_factor * radius;
    let u0 = 9.03 / (a * a * a);

    let cos = cos_theta_in_layer(to_refractive_index(eps_medium), wl, params);
    let sin = (ONE - cos * cos).sqrt();
    let theta = cos.acos();

    let alpha = (eps_particle - eps_medium) / (eps_particle + eps_medium * 2.0) * radius.powi(3);
    let alpha_parallel = alpha / (ONE - alpha * 0.5 * u0);
    let alpha_orthogonal = alpha / (ONE + alpha * u0);

    let k = (2.0 * PI / a).powi(2) / wl;
    let big_a = I / cos * k;
    let big_b = sin * k;

    let c1 = cos * cos * alpha_parallel;
    let c2 = sin * sin * alpha_orthogonal;
    let c3 = ONE + big_b * (alpha_orthogonal - alpha_parallel);
    let c4 = big_a * big_b * alpha_parallel * alpha_orthogonal * (theta * I * 2.0).exp();

    let (r_numerator, t_numerator, denominator) = match params.polarization {
        Polarization::S => (
            -big_a * c1,
            ONE - big_b * alpha_parallel,
            ONE - big_b * alpha_parallel - big_a * c1,
        ),
        Polarization::P => (
            -big_a * (c1 - c2) - c4,
            c3,
            c3 - big_a * (c1 + c2) - c4,
        ),
    };
    (r_numerator / denominator, t_numerator / denominator)
}

/// Transfer matrix of an interface-free sheet with amplitudes `r` and `t`.
pub fn lattice_matrix(r: Complex64, t: Complex64) -> TransferMatrix {
    TransferMatrix::from_entries((t * t - r * r) / t, r / t, -r / t, ONE / t)
}
