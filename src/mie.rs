//! Extinction and scattering of a dilute ensemble of spheres.
//!
//! - [`MieOrders::One`] and [`MieOrders::Two`]: small particle expansion of
//!   the first one or two multipole coefficients
//! - [`MieOrders::All`]: full Bohren–Huffman series, truncated after
//!   `n_stop = x + 4x^{1/3} + 2` terms
//!
//! Coefficients are returned in cm⁻¹ for a volume fraction `f` of spheres of
//! radius `r` (nm) at wavelength `wl` (nm).

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::complex::{real, I, ONE, ZERO};
use crate::optics::{nm_to_cm, to_refractive_index};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn silver_in_glass() -> MieInput {
        MieInput {
            wl: 500.0,
            eps_medium: real(2.25),
            eps_particle: Complex64::new(-9.0, 0.3),
            f: 0.01,
            r: 2.0,
        }
    }

    #[test]
    fn small_particle_orders_agree_with_full_series() {
        let input = silver_in_glass();
        let full = MieOrders::All.extinction(&input, false);
        let one = MieOrders::One.extinction(&input, false);
        let two = MieOrders::Two.extinction(&input, false);
        assert_relative_eq!(one, full, max_relative = 0.05);
        assert_relative_eq!(two, full, max_relative = 0.05);
    }

    #[test]
    fn coefficients_are_non_negative() {
        for r in [1.0, 10.0, 50.0, 120.0] {
            let input = MieInput { r, ..silver_in_glass() };
            for orders in [MieOrders::One, MieOrders::Two, MieOrders::All] {
                assert!(orders.extinction(&input, false) >= 0.0, "{:?} r = {}", orders, r);
                assert!(orders.scattering(&input) >= 0.0, "{:?} r = {}", orders, r);
            }
        }
    }

    #[test]
    fn scattering_never_exceeds_extinction() {
        let input = MieInput { r: 40.0, ..silver_in_glass() };
        assert!(MieOrders::All.scattering(&input) <= MieOrders::All.extinction(&input, false));
    }

    #[test]
    fn medium_absorption_is_additive() {
        let input = MieInput {
            eps_medium: Complex64::new(2.25, 0.1),
            ..silver_in_glass()
        };
        let with = MieOrders::Two.extinction(&input, true);
        let without = MieOrders::Two.extinction(&input, false);
        let n = to_refractive_index(input.eps_medium);
        assert_relative_eq!(with - without, 4.0 * PI * n.im / nm_to_cm(500.0), max_relative = 1e-9);
    }

    #[test]
    fn parses_order_names() {
        assert_eq!("1".parse::<MieOrders>(), Ok(MieOrders::One));
        assert_eq!("ALL".parse::<MieOrders>(), Ok(MieOrders::All));
        assert!("3".parse::<MieOrders>().is_err());
    }
}

/// Number of multipole orders kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MieOrders {
    One,
    Two,
    All,
}

impl std::str::FromStr for MieOrders {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" => Ok(MieOrders::One),
            "2" => Ok(MieOrders::Two),
            "all" => Ok(MieOrders::All),
            other => Err(format!(
                "available orders are 1, 2 or \"all\", got \"{}\"",
                other
            )),
        }
    }
}

/// Physical inputs shared by every order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MieInput {
    pub wl: f64,
    pub eps_medium: Complex64,
    pub eps_particle: Complex64,
    pub f: f64,
    pub r: f64,
}

impl MieInput {
    /// Converts a cross section (cm²) into a coefficient (cm⁻¹).
    fn per_volume(&self, cross_section: f64) -> f64 {
        let r = nm_to_cm(self.r);
        0.75 * self.f / (PI * r * r * r) * cross_section
    }

    fn medium_absorption(&self) -> f64 {
        4.0 * PI * to_refractive_index(self.eps_medium).im / nm_to_cm(self.wl)
    }
}

impl MieOrders {
    /// Extinction coefficient in cm⁻¹, optionally including the absorption
    /// of the host medium.
    pub fn extinction(&self, input: &MieInput, include_medium_absorption: bool) -> f64 {
        let (c_ext, _) = self.cross_sections(input);
        let host = if include_medium_absorption {
            input.medium_absorption()
        } else {
            0.0
        };
        input.per_volume(c_ext) + host
    }

    /// Scattering coefficient in cm⁻¹.
    pub fn scattering(&self, input: &MieInput) -> f64 {
        let (_, c_sca) = self.cross_sections(input);
        input.per_volume(c_sca)
    }

    /// Extinction and scattering cross sections in cm².
    fn cross_sections(&self, input: &MieInput) -> (f64, f64) {
        match self {
            MieOrders::One | MieOrders::Two => {
                let k = 2.0 * PI * to_refractive_index(input.eps_medium).re / nm_to_cm(input.wl);
                let x = k * nm_to_cm(input.r);
                let m_sq = input.eps_particle / input.eps_medium;
                let orders = if *self == MieOrders::One { 1 } else { 2 };
                let (q_ext, q_sca) = efficiency_sums(&small_particle_coefficients(x, m_sq)[..orders]);
                let common = 2.0 * PI / (k * k);
                (common * q_ext, common * q_sca)
            }
            MieOrders::All => {
                let n_medium = to_refractive_index(input.eps_medium);
                let m = to_refractive_index(input.eps_particle) / n_medium;
                let x = n_medium.re * 2.0 * PI * input.r / input.wl;
                let coefficients = bohren_huffman_coefficients(x, m);
                let (q_ext, q_sca) = efficiency_sums(&coefficients);
                let r = nm_to_cm(input.r);
                let area = PI * r * r;
                (2.0 / (x * x) * q_ext * area, 2.0 / (x * x) * q_sca * area)
            }
        }
    }
}

/// `Σ(2n+1)·Re(aₙ+bₙ)` and `Σ(2n+1)·(|aₙ|²+|bₙ|²)`, orders counted from 1.
fn efficiency_sums(coefficients: &[(Complex64, Complex64)]) -> (f64, f64) {
    coefficients
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(ext, sca), (index, (a, b))| {
            let weight = (2 * (index + 1) + 1) as f64;
            (
                ext + weight * (a + b).re,
                sca + weight * (a.norm_sqr() + b.norm_sqr()),
            )
        })
}

/// Leading terms of a₁, a₂, b₁ and b₂ in the size parameter `x` for the
/// relative permittivity `m_sq`.
fn small_particle_coefficients(x: f64, m_sq: Complex64) -> [(Complex64, Complex64); 2] {
    let c = (m_sq - 1.0) / (m_sq + 2.0);
    let a1 = -I * (2.0 / 3.0) * x.powi(3) * c
        - I * (2.0 / 5.0) * x.powi(5) * (m_sq - 2.0) / (m_sq + 2.0) * c
        + ONE * (4.0 / 9.0) * x.powi(6) * c * c;
    let a2 = -I / 15.0 * x.powi(5) * (m_sq - 1.0) / (m_sq * 2.0 + 3.0);
    let b1 = -I / 45.0 * x.powi(5) * (m_sq - 1.0);
    [(a1, b1), (a2, ZERO)]
}

/// Mie coefficients aₙ, bₙ for n = 1..n_stop.
///
/// **Context**: Absorbing spheres of any size need the full multipole series.
/// Naive upward recurrence of the logarithmic derivative is unstable for
/// complex `m`.
///
/// **How it Works**: The logarithmic derivative `D_n(mx)` is computed by
/// downward recurrence from zero at `n_max = max(n_stop, |mx|) + 15`. The
/// Riccati-Bessel functions ψ and χ of the real argument `x` are computed by
/// upward recurrence starting from `cos x` and `sin x`.
fn bohren_huffman_coefficients(x: f64, m: Complex64) -> Vec<(Complex64, Complex64)> {
    let x_stop = x + 4.0 * x.powf(1.0 / 3.0) + 2.0;
    let n_stop = x_stop as usize;
    let mx = m * x;
    let n_max = (x_stop.max(mx.norm()) + 15.0).round() as usize;

    let mut d = vec![ZERO; n_max + 1];
    for i in (1..n_max).rev() {
        let c = real(i as f64 + 1.0) / mx;
        d[i] = c - ONE / (d[i + 1] + c);
    }

    let (mut psi_prev_prev, mut psi_prev) = (x.cos(), x.sin());
    let (mut chi_prev_prev, mut chi_prev) = (-x.sin(), x.cos());
    let mut xi_prev = Complex64::new(psi_prev, -chi_prev);

    let mut coefficients = Vec::with_capacity(n_stop);
    for n in 1..=n_stop {
        let nf = n as f64;
        let psi = (2.0 * nf - 1.0) * psi_prev / x - psi_prev_prev;
        let chi = (2.0 * nf - 1.0) * chi_prev / x - chi_prev_prev;
        let xi = Complex64::new(psi, -chi);

        let a_common = d[n] / m + nf / x;
        let a = (a_common * psi - psi_prev) / (a_common * xi - xi_prev);
        let b_common = d[n] * m + nf / x;
        let b = (b_common * psi - psi_prev) / (b_common * xi - xi_prev);
        coefficients.push((a, b));

        psi_prev_prev = psi_prev;
        psi_prev = psi;
        chi_prev_prev = chi_prev;
        chi_prev = chi;
        xi_prev = xi;
    }
    coefficients
}
