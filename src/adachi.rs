//! Adachi critical-point permittivity models for Al(x)Ga(1-x)As.
//!
//! Four families are provided:
//! - the simple model (J. Appl. Phys. 58, R1, 1985): real permittivity below
//!   the gap, optionally with an imaginary part scaled from the real one
//! - the 1989 model (J. Appl. Phys. 66, 6030): E0, E1 and E2 critical points
//!   with a single Lorentzian broadening Γ
//! - the Gaussian-broadened model (Djurisic et al., J. Appl. Phys. 86, 445,
//!   1999): E0, E1, excitonic and E2..E4 oscillator terms with
//!   energy-dependent broadening
//! - the "modified Gaussian" variant that replaces Im(ε) below E0 with a
//!   damping-scaled real part
//!
//! All energies are photon energies in eV and `c_al` is the Al fraction.

use num_complex::Complex64;

use crate::complex::{real, ONE};


/// Direct gap E0 (eV).
pub fn gap(c_al: f64) -> f64 {
    1.424 + 1.155 * c_al + 0.37 * c_al * c_al
}

/// Spin-orbit split gap E0 + Δ0 (eV).
pub fn gap_split_off(c_al: f64) -> f64 {
    gap(c_al) + 0.34 - 0.04 * c_al
}

/// E1 transition energy (eV).
pub fn e1(c_al: f64) -> f64 {
    ternary_transition(2.926, 0.962, -0.2124, -0.7850, c_al)
}

/// E1 + Δ1 transition energy (eV).
pub fn e1_split_off(c_al: f64) -> f64 {
    ternary_transition(3.170, 0.917, -0.0734, -0.9393, c_al)
}

fn ternary_transition(e_gaas: f64, shift: f64, c0: f64, c1: f64, c_al: f64) -> f64 {
    e_gaas + shift * c_al - (c0 + c1 * c_al) * c_al * (1.0 - c_al)
}

/// Simple Adachi model; energies above the gap are clamped to the gap.
pub fn simple_permittivity(w: f64, c_al: f64) -> Complex64 {
    let eg = gap(c_al);
    let energy = w.min(eg);
    let delta = 0.34 - 0.04 * c_al;
    let a = 6.3 + 19.0 * c_al;
    let b = 9.4 - 10.2 * c_al;

    let f = |z: f64| (2.0 - (1.0 + z).sqrt() - (1.0 - z).sqrt()) / (z * z);
    let chi = energy / eg;
    let chi_so = energy / (eg + delta);

    real(a * (f(chi) + 0.5 * (eg / (eg + delta)).powf(1.5) * f(chi_so)) + b)
}

/// Simple Adachi model with `Im ε = df · Re ε`.
pub fn simple_permittivity_scaled(w: f64, c_al: f64, df: f64) -> Complex64 {
    let eps = simple_permittivity(w, c_al);
    Complex64::new(eps.re, eps.re * df)
}

/// Lattice constant of Al(x)Ga(1-x)As in Å.
pub fn lattice_constant(c_al: f64) -> f64 {
    5.6533 + 0.0078 * c_al
}

/// Adachi 1989 model broadened by `gamma` (eV).
pub fn permittivity_1989(w: f64, c_al: f64, gamma: f64) -> Complex64 {
    let eps_inf = -2.337 * c_al + 1.3363;
    let a = 37.4026 * c_al - 2.9818;
    let c = -1.4026 * c_al + 2.7418;

    // E0, E0 + Δ0
    let e0 = gap(c_al);
    let e0_so = gap_split_off(c_al);
    let chi0 = w / e0;
    let chi_so = w / e0_so;
    let f = |chi: f64| {
        let below = if chi <= 1.0 { (1.0 - chi).sqrt() } else { 0.0 };
        (2.0 - (1.0 + chi).sqrt() - below) / (chi * chi)
    };
    let above = |e: f64| if w >= e { (w - e).sqrt() } else { 0.0 };
    let e0_part = Complex64::new(
        a * e0.powf(-1.5) * (f(chi0) + 0.5 * (e0 / e0_so).powf(1.5) * f(chi_so)),
        a / (w * w) * (above(e0) + 0.5 * above(e0_so)),
    );

    // E1, E1 + Δ1; the broadening keeps the logarithm finite at the edge
    let e1 = e1(c_al);
    let e1_so = e1_split_off(c_al);
    let delta1 = e1_so - e1;
    let a0 = lattice_constant(c_al);
    let b1 = 44.0 * (e1 + delta1 / 3.0) / (a0 * e1 * e1);
    let b2 = 44.0 * (e1 + 2.0 * delta1 / 3.0) / (a0 * e1_so * e1_so);
    let energy = Complex64::new(w, gamma);
    let log_term = |b: f64, e: f64| {
        let chi_sq = (energy / e).powi(2);
        -(b / chi_sq) * (ONE - chi_sq).ln()
    };
    let e1_part = log_term(b1, e1) + log_term(b2, e1_so);

    // E2 damped harmonic oscillator
    let e2 = 4.529 * (1.0 - c_al) + 4.660 * c_al;
    let chi2 = w / e2;
    let common = (1.0 - chi2 * chi2).powi(2) + (chi2 * gamma).powi(2);
    let e2_part = Complex64::new(
        c * (1.0 - chi2 * chi2) / common,
        c * chi2 * gamma / common,
    );

    real(eps_inf) + e0_part + e1_part + e2_part
}

/// Composition dependence of a Djurisic model parameter, linear between the
/// GaAs and AlAs values.
#[derive(Debug, Clone, Copy)]
struct Linear(f64, f64);

impl Linear {
    fn at(&self, c_al: f64) -> f64 {
        self.0 * (1.0 - c_al) + self.1 * c_al
    }
}

const EPS_INF: Linear = Linear(1.347, 0.02);
const A0: Linear = Linear(3.06, 14.21);
const GAMMA0: Linear = Linear(0.0001, 0.0107);
const ALPHA0: Linear = Linear(3.96, 1.617);
const B1: Linear = Linear(6.099, 4.381);
const B1S: Linear = Linear(0.001, 0.103);
const B1X: Linear = Linear(1.185, 0.639);
const B2X: Linear = Linear(0.473, 0.770);
const GAMMA1: Linear = Linear(0.194, 0.125);
const ALPHA1: Linear = Linear(0.018, 0.012);
/// (f, Γ, α, E) for the E2, E3 and E4 damped oscillators.
const OSCILLATORS: [(Linear, Linear, Linear, Linear); 3] = [
    (
        Linear(4.318, 0.326),
        Linear(0.496, 0.597),
        Linear(0.014, 0.281),
        Linear(4.529, 4.660),
    ),
    (
        Linear(4.924, 5.483),
        Linear(0.800, 0.434),
        Linear(0.032, 0.052),
        Linear(4.746, 4.710),
    ),
    (
        Linear(3.529, 4.672),
        Linear(0.302, 0.414),
        Linear(0.004, 0.023),
        Linear(4.860, 4.976),
    ),
];

const GAMMA_FLOOR: f64 = 1e-6;
const EXCITON_SERIES_PRECISION: f64 = 1e-4;
const EXCITON_SERIES_MAX_TERMS: usize = 100_000;

/// Lorentzian broadening modulated by a Gaussian in energy.
fn gaussian_gamma(w: f64, gamma: f64, alpha: f64, e: f64) -> f64 {
    gamma * (-alpha * ((w - e) / gamma).powi(2)).exp()
}

/// Djurisic 1999 model with Gaussian-like broadening.
pub fn gaussian_permittivity(w: f64, c_al: f64) -> Complex64 {
    real(EPS_INF.at(c_al))
        + e0_term(w, c_al)
        + e1_term(w, c_al)
        + exciton_term(w, c_al)
        + oscillator_term(w, c_al)
}

/// Gaussian model whose imaginary part below E0 is `df · Re ε`.
pub fn modified_gaussian_permittivity(w: f64, c_al: f64, df: f64) -> Complex64 {
    let eps = gaussian_permittivity(w, c_al);
    if w >= gap(c_al) {
        eps
    } else {
        Complex64::new(eps.re, eps.re * df)
    }
}

fn e0_term(w: f64, c_al: f64) -> Complex64 {
    let e0 = gap(c_al);
    let e0_so = gap_split_off(c_al);
    let gamma = gaussian_gamma(w, GAMMA0.at(c_al), ALPHA0.at(c_al), e0).max(GAMMA_FLOOR);

    let f = |z: Complex64| (2.0 * ONE - (ONE + z).sqrt() - (ONE - z).sqrt()) / (z * z);
    let energy = Complex64::new(w, gamma);

    (f(energy / e0) + f(energy / e0_so) * 0.5 * (e0 / e0_so).powf(1.5)) * A0.at(c_al) * e0.powf(-1.5)
}

fn e1_term(w: f64, c_al: f64) -> Complex64 {
    let gamma = gaussian_gamma(w, GAMMA1.at(c_al), ALPHA1.at(c_al), e1(c_al));
    let energy = Complex64::new(w, gamma);
    let chi_sq = (energy / e1(c_al)).powi(2);
    let chi_so_sq = (energy / e1_split_off(c_al)).powi(2);

    -(B1.at(c_al) / chi_sq) * (ONE - chi_sq).ln() - (B1S.at(c_al) / chi_so_sq) * (ONE - chi_so_sq).ln()
}

/// Two-dimensional exciton series at E1 and E1 + Δ1, summed until the next
/// term drops below the series precision.
fn exciton_term(w: f64, c_al: f64) -> Complex64 {
    let gamma = gaussian_gamma(w, GAMMA1.at(c_al), ALPHA1.at(c_al), e1(c_al));
    let base = B1X.at(c_al) / Complex64::new(e1(c_al) - w, -gamma)
        + B2X.at(c_al) / Complex64::new(e1_split_off(c_al) - w, -gamma);

    let mut sum = Complex64::new(0.0, 0.0);
    for n in 1..=EXCITON_SERIES_MAX_TERMS {
        let term = base / (2.0 * n as f64 - 1.0).powi(3);
        sum += term;
        if term.norm() < EXCITON_SERIES_PRECISION {
            break;
        }
    }
    sum
}

fn oscillator_term(w: f64, c_al: f64) -> Complex64 {
    OSCILLATORS
        .iter()
        .map(|(f, gamma, alpha, e)| {
            let e = e.at(c_al);
            let gamma = gaussian_gamma(w, gamma.at(c_al), alpha.at(c_al), e);
            let f = f.at(c_al);
            real(f * f) / Complex64::new(e * e - w * w, -w * gamma)
        })
        .sum()
}
