//! Temperature-dependent Adachi model for Al(x)Ga(1-x)As(y)Sb(1-y).
//!
//! Follows González-Cuevas et al., J. Appl. Phys. 102, 014504 (2007):
//! - critical point energies of the four binaries follow the Varshni law
//! - ternary energies interpolate binaries with a bowing term
//! - quaternary energies combine the four ternaries
//! - model strengths, broadenings and the lattice constant interpolate the
//!   binaries directly with two bowing constants
//!
//! GaAs and AlGaAs use this model with an As fraction of 1.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::complex::{real, I, ONE};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn varshni_lowers_gap_with_temperature() {
        let cold = Binary::GaAs.energy(CriticalPoint::E0, 0.0);
        let warm = Binary::GaAs.energy(CriticalPoint::E0, 300.0);
        assert_abs_diff_eq!(cold, 1.52, epsilon = 1e-12);
        assert!(warm < cold);
        // 1.52 - 0.55e-3 * 300² / 525
        assert_abs_diff_eq!(warm, 1.52 - 0.55e-3 * 90000.0 / 525.0, epsilon = 1e-12);
    }

    #[test]
    fn quaternary_reduces_to_binary_corners() {
        // x = 0, y = 1 is GaAs; the clamp keeps the weights finite
        let model = AlGaAsSb::new(0.0, 1.0, 300.0);
        assert_abs_diff_eq!(
            model.energy(CriticalPoint::E0),
            Binary::GaAs.energy(CriticalPoint::E0, 300.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn gaas_is_transparent_below_gap() {
        let eps = permittivity(1.0, 0.0, 1.0, 300.0);
        assert!(eps.re > 9.0 && eps.re < 14.0, "eps = {}", eps);
        assert!(eps.im < 0.5, "eps = {}", eps);
        let above = permittivity(3.0, 0.0, 1.0, 300.0);
        assert!(above.im > eps.im);
    }
}

/// Binary end members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binary {
    AlAs,
    AlSb,
    GaAs,
    GaSb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticalPoint {
    E0,
    E0Delta0,
    E1,
    Delta1,
    E1Delta1,
    E2,
    EIndirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    A,
    C,
    D,
    GammaE0Delta0,
    GammaE1Delta1,
    GammaE2,
    GammaEIndirect,
    Lattice,
}

/// Varshni record: energy at 0 K (eV), α (meV/K), β (K).
struct Varshni(f64, f64, f64);

impl Varshni {
    fn at(&self, temperature: f64) -> f64 {
        self.0 - self.1 * 1e-3 * temperature * temperature / (temperature + self.2)
    }
}

impl Binary {
    fn varshni(&self, point: CriticalPoint) -> Varshni {
        use CriticalPoint::*;
        match (self, point) {
            (Binary::AlAs, E0) => Varshni(3.09, 0.88, 530.0),
            (Binary::AlAs, E0Delta0) => Varshni(3.37, 0.88, 530.0),
            (Binary::AlAs, E1) => Varshni(3.98, 0.67, 0.0),
            (Binary::AlAs, Delta1) => Varshni(0.2, 0.67, 0.0),
            (Binary::AlAs, E1Delta1) => Varshni(4.18, 0.67, 0.0),
            (Binary::AlAs, E2) => Varshni(4.86, 0.32, 0.0),
            (Binary::AlAs, EIndirect) => Varshni(2.46, 0.61, 204.0),

            (Binary::AlSb, E0) => Varshni(2.39, 0.42, 140.0),
            (Binary::AlSb, E0Delta0) => Varshni(3.06, 0.42, 140.0),
            (Binary::AlSb, E1) => Varshni(2.94, 0.47, 0.0),
            (Binary::AlSb, Delta1) => Varshni(0.49, 0.43, 0.0),
            (Binary::AlSb, E1Delta1) => Varshni(3.43, 0.43, 0.0),
            (Binary::AlSb, E2) => Varshni(4.18, 0.47, 0.0),
            (Binary::AlSb, EIndirect) => Varshni(1.70, 0.39, 140.0),

            (Binary::GaAs, E0) => Varshni(1.52, 0.55, 225.0),
            (Binary::GaAs, E0Delta0) => Varshni(1.85, 0.35, 225.0),
            (Binary::GaAs, E1) => Varshni(3.04, 0.72, 205.0),
            (Binary::GaAs, Delta1) => Varshni(0.23, 0.72, 205.0),
            (Binary::GaAs, E1Delta1) => Varshni(3.27, 0.72, 205.0),
            (Binary::GaAs, E2) => Varshni(5.13, 0.66, 43.0),
            (Binary::GaAs, EIndirect) => Varshni(1.82, 0.61, 204.0),

            (Binary::GaSb, E0) => Varshni(0.81, 0.42, 140.0),
            (Binary::GaSb, E0Delta0) => Varshni(1.57, 0.42, 140.0),
            (Binary::GaSb, E1) => Varshni(2.19, 0.68, 147.0),
            (Binary::GaSb, Delta1) => Varshni(0.43, 0.67, 176.0),
            (Binary::GaSb, E1Delta1) => Varshni(2.62, 0.67, 176.0),
            (Binary::GaSb, E2) => Varshni(4.32, 0.90, 376.0),
            (Binary::GaSb, EIndirect) => Varshni(0.88, 0.60, 140.0),
        }
    }

    /// Critical point energy (eV) at `temperature` (K).
    pub fn energy(&self, point: CriticalPoint, temperature: f64) -> f64 {
        self.varshni(point).at(temperature)
    }

    fn index(&self) -> usize {
        match self {
            Binary::AlAs => 0,
            Binary::AlSb => 1,
            Binary::GaAs => 2,
            Binary::GaSb => 3,
        }
    }

    /// Model parameter of the binary at `temperature`.
    pub fn parameter(&self, parameter: Parameter, temperature: f64) -> f64 {
        let i = self.index();
        match parameter {
            Parameter::A => [23.740, 36.580, 5.520, 1.102][i],
            Parameter::C => [2.240, 1.600, 2.890, 3.340][i],
            Parameter::D => [0.705, 1.190, 21.320, 4.93][i],
            Parameter::GammaE0Delta0 => 0.001,
            Parameter::GammaEIndirect => [0.490, 1.940, 0.037, 0.020][i],
            // Γ_L (meV) + γ (meV/K) · T
            Parameter::GammaE1Delta1 => {
                let (gamma_l, slope) = [(0.006, 0.029), (0.001, 0.057), (0.001, 0.066), (0.001, 0.124)][i];
                gamma_l * 1e-3 + slope * 1e-3 * temperature
            }
            Parameter::GammaE2 => {
                let (gamma_l, slope) = [(742.1, 0.164), (693.0, 0.306), (663.1, 0.41), (680.4, 0.48)][i];
                gamma_l * 1e-3 + slope * 1e-3 * temperature
            }
            // a (Å) + κ (1e-5 Å/K) · (T − 300)
            Parameter::Lattice => {
                let (a, kappa) = [(5.66, 2.90), (6.13, 2.60), (5.65, 3.88), (6.10, 4.72)][i];
                a + kappa * 1e-5 * (temperature - 300.0)
            }
        }
    }
}

impl Parameter {
    /// Bowing constants (Al-Ga, As-Sb).
    fn bowing(&self) -> (f64, f64) {
        match self {
            Parameter::A => (0.012, 0.010),
            Parameter::C => (0.019, 0.010),
            Parameter::D => (0.010, 0.010),
            Parameter::GammaE0Delta0 => (-0.004, 0.010),
            Parameter::GammaE1Delta1 => (0.033, 0.009),
            Parameter::GammaE2 => (-0.031, 0.009),
            Parameter::GammaEIndirect => (0.008, 0.010),
            Parameter::Lattice => (0.0, 0.0),
        }
    }
}

impl CriticalPoint {
    /// Ternary bowing constants (AlAsSb, GaAsSb, AlGaAs, AlGaSb).
    fn bowing(&self) -> [f64; 4] {
        match self {
            CriticalPoint::E0 => [0.72, 1.20, 0.37, 0.69],
            CriticalPoint::E0Delta0 => [0.15, 0.61, 0.07, 0.30],
            CriticalPoint::E1 => [0.0, 0.0, 0.45, 0.28],
            CriticalPoint::Delta1 => [0.0, 0.0, 0.0, 0.0],
            CriticalPoint::E1Delta1 => [0.0, 0.0, 0.0, 0.32],
            CriticalPoint::E2 => [0.0, 0.0, 0.02, 0.0],
            CriticalPoint::EIndirect => [0.28, 1.09, 0.06, 0.55],
        }
    }
}

/// Ternary interpolation between two binaries.
fn vegard32(fraction: f64, b_ac: f64, b_bc: f64, bowing: f64) -> f64 {
    fraction * b_ac + (1.0 - fraction) * b_bc - fraction * (1.0 - fraction) * bowing
}

/// Quaternary interpolation from the four binaries.
#[allow(clippy::too_many_arguments)]
fn vegard42(x: f64, y: f64, b_ac: f64, b_ad: f64, b_bc: f64, b_bd: f64, bowing_ab: f64, bowing_cd: f64) -> f64 {
    x * y * b_ac
        + x * (1.0 - y) * b_ad
        + (1.0 - x) * y * b_bc
        + (1.0 - x) * (1.0 - y) * b_bd
        + x * (1.0 - x) * bowing_ab
        + y * (1.0 - y) * bowing_cd
}

/// Quaternary interpolation from the four ternaries.
fn vegard43(x: f64, y: f64, t_abc: f64, t_abd: f64, t_acd: f64, t_bcd: f64) -> f64 {
    const EDGE: f64 = 1e-7;
    let x = x.clamp(EDGE, 1.0 - EDGE);
    let y = y.clamp(EDGE, 1.0 - EDGE);
    let c1 = x * (1.0 - x);
    let c2 = y * (1.0 - y);
    (c1 * (y * t_abc + (1.0 - y) * t_abd) + c2 * (x * t_acd + (1.0 - x) * t_bcd)) / (c1 + c2)
}

/// Model state for one composition and temperature.
pub struct AlGaAsSb {
    c_al: f64,
    c_as: f64,
    temperature: f64,
}

impl AlGaAsSb {
    pub fn new(c_al: f64, c_as: f64, temperature: f64) -> Self {
        Self {
            c_al,
            c_as,
            temperature,
        }
    }

    pub fn energy(&self, point: CriticalPoint) -> f64 {
        let t = self.temperature;
        let [al_as_sb, ga_as_sb, al_ga_as, al_ga_sb] = point.bowing();
        let e = |b: Binary| b.energy(point, t);

        let t_abc = vegard32(self.c_al, e(Binary::AlAs), e(Binary::GaAs), al_ga_as);
        let t_abd = vegard32(self.c_al, e(Binary::AlSb), e(Binary::GaSb), al_ga_sb);
        let t_acd = vegard32(self.c_as, e(Binary::AlAs), e(Binary::AlSb), al_as_sb);
        let t_bcd = vegard32(self.c_as, e(Binary::GaAs), e(Binary::GaSb), ga_as_sb);

        vegard43(self.c_al, self.c_as, t_abc, t_abd, t_acd, t_bcd)
    }

    pub fn parameter(&self, parameter: Parameter) -> f64 {
        let t = self.temperature;
        let (bowing_ab, bowing_cd) = parameter.bowing();
        vegard42(
            self.c_al,
            self.c_as,
            Binary::AlAs.parameter(parameter, t),
            Binary::AlSb.parameter(parameter, t),
            Binary::GaAs.parameter(parameter, t),
            Binary::GaSb.parameter(parameter, t),
            bowing_ab,
            bowing_cd,
        )
    }

    pub fn permittivity(&self, w: f64) -> Complex64 {
        self.e0_term(w) + self.e1_term(w) + self.e2_term(w) + self.indirect_term(w)
    }

    fn e0_term(&self, w: f64) -> Complex64 {
        let a = self.parameter(Parameter::A);
        let e0 = self.energy(CriticalPoint::E0);
        let e0_so = self.energy(CriticalPoint::E0Delta0);
        let energy = Complex64::new(w, self.parameter(Parameter::GammaE0Delta0));

        let f = |z: Complex64| (2.0 * ONE - (ONE + z).sqrt() - (ONE - z).sqrt()) / (z * z);
        (f(energy / e0) + f(energy / e0_so) * 0.5 * (e0 / e0_so).powf(1.5)) * a / e0.powf(1.5)
    }

    fn e1_term(&self, w: f64) -> Complex64 {
        let e1 = self.energy(CriticalPoint::E1);
        let delta1 = self.energy(CriticalPoint::Delta1);
        let e1_so = self.energy(CriticalPoint::E1Delta1);
        let lattice = self.parameter(Parameter::Lattice);
        let energy = Complex64::new(w, self.parameter(Parameter::GammaE1Delta1));

        let b1 = 44.0 * (e1 + delta1 / 3.0) / (lattice * e1 * e1);
        let b2 = 44.0 * (e1 + 2.0 * delta1 / 3.0) / (lattice * e1_so * e1_so);
        let chi1 = (energy / e1).powi(2);
        let chi2 = (energy / e1_so).powi(2);

        -(b1 / chi1) * (ONE - chi1).ln() - (b2 / chi2) * (ONE - chi2).ln()
    }

    fn e2_term(&self, w: f64) -> Complex64 {
        let e2_sq = real(self.energy(CriticalPoint::E2).powi(2));
        let gamma = self.parameter(Parameter::GammaE2);
        e2_sq * self.parameter(Parameter::C) / (e2_sq - w * w - I * w * gamma)
    }

    fn indirect_term(&self, w: f64) -> Complex64 {
        let d = self.parameter(Parameter::D);
        let indirect = self.energy(CriticalPoint::EIndirect);
        // high-energy cutoff taken at E1
        let cutoff = self.energy(CriticalPoint::E1);
        let energy = Complex64::new(w, self.parameter(Parameter::GammaEIndirect));
        let chi = indirect / energy;

        let s1 = -(chi * chi) * (cutoff / indirect).ln();
        let s2 = 0.5 * (ONE + chi).powi(2) * ((energy + cutoff) / (energy + indirect)).ln();
        let s3 = 0.5 * (ONE - chi).powi(2) * ((energy - cutoff) / (energy - indirect)).ln();

        (s1 + s2 + s3) * d * 2.0 / PI
    }
}

/// Permittivity of Al(x)Ga(1-x)As(y)Sb(1-y) at photon energy `w` (eV).
pub fn permittivity(w: f64, c_al: f64, c_as: f64, temperature: f64) -> Complex64 {
    AlGaAsSb::new(c_al, c_as, temperature).permittivity(w)
}
