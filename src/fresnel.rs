//! Boundary conditions between two media of a layered structure.
//!
//! Tangential field continuity at a planar interface is expressed through
//! the effective index of each medium:
//! - s polarization: `n·cosθ`
//! - p polarization: `n/cosθ`
//!
//! The interface transfer matrix maps the forward and backward amplitudes on
//! the left side to those on the right side. A single interface has the
//! classic Fresnel amplitudes, which this module also provides for checks.

use num_complex::Complex64;

use crate::complex::ONE;
use crate::matrix::TransferMatrix;
use crate::optics::Polarization;


/// Index that enters the boundary conditions for the given polarization.
pub fn effective_index(n: Complex64, cos: Complex64, polarization: Polarization) -> Complex64 {
    match polarization {
        Polarization::S => n * cos,
        Polarization::P => n / cos,
    }
}

/// Transfer matrix across the interface from medium 1 to medium 2.
///
/// **Context**: Between two adjacent layers the amplitudes jump according to
/// the ratio of their effective indices. Layer matrices alone only carry the
/// phase inside each layer.
///
/// **How it Works**: With effective indices `η1` and `η2` the diagonal holds
/// `(η2 + η1)/(2η2)` and the anti-diagonal `(η2 − η1)/(2η2)`.
pub fn interface_matrix(
    n1: Complex64,
    cos1: Complex64,
    n2: Complex64,
    cos2: Complex64,
    polarization: Polarization,
) -> TransferMatrix {
    let eta1 = effective_index(n1, cos1, polarization);
    let eta2 = effective_index(n2, cos2, polarization);
    TransferMatrix::symmetric((eta2 + eta1) / (eta2 * 2.0), (eta2 - eta1) / (eta2 * 2.0))
}

/// Fresnel reflection amplitude of a single interface.
pub fn reflection(
    n1: Complex64,
    cos1: Complex64,
    n2: Complex64,
    cos2: Complex64,
    polarization: Polarization,
) -> Complex64 {
    let eta1 = effective_index(n1, cos1, polarization);
    let eta2 = effective_index(n2, cos2, polarization);
    (eta1 - eta2) / (eta1 + eta2)
}

/// Transmission amplitude of a single interface in the effective index
/// convention of [`interface_matrix`].
pub fn transmission(
    n1: Complex64,
    cos1: Complex64,
    n2: Complex64,
    cos2: Complex64,
    polarization: Polarization,
) -> Complex64 {
    let eta1 = effective_index(n1, cos1, polarization);
    let eta2 = effective_index(n2, cos2, polarization);
    eta1 * 2.0 / (eta1 + eta2) * ONE
}
