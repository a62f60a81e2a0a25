//! Spectra of a structure over a computation range.
//!
//! The range is given in nm or eV. Either way every sample is converted to
//! a wavelength before it reaches the [`Mirror`], and the x axis of the
//! result keeps the unit of the range.

use std::fmt;

use ndarray::Array1;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::mirror::Mirror;
use crate::optics::{to_wavelength, Mode, OpticalParams};
use crate::params::Slot;
use crate::result::ComputedData;
use crate::structure::Structure;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::real;
    use crate::layer::Layer;
    use crate::params::ComplexSlot;
    use crate::structure::Block;
    use approx::assert_abs_diff_eq;

    fn glass() -> Structure<f64> {
        Structure::new(vec![Block::new(
            1,
            vec![Layer::ConstPermittivity {
                d: 100.0,
                eps: ComplexSlot::constant("eps", real(2.25)),
            }],
        )])
    }

    #[test]
    fn inclusive_end_survives_rounding() {
        let values = inclusive_steps(0.1, 0.3, 0.1);
        assert_eq!(values.len(), 3);
        assert_abs_diff_eq!(values[2], 0.3, epsilon = 1e-12);
        assert_eq!(inclusive_steps(400.0, 800.0, 100.0), vec![400.0, 500.0, 600.0, 700.0, 800.0]);
        assert_eq!(inclusive_steps(5.0, 5.0, 1.0), vec![5.0]);
    }

    #[test]
    fn range_validation() {
        let bad = [
            ComputationRange::nm(0.0, 10.0, 1.0),
            ComputationRange::nm(10.0, 5.0, 1.0),
            ComputationRange::nm(1.0, 5.0, 0.0),
        ];
        for range in bad {
            assert_eq!(range.validate().unwrap_err().header(), "Computation range error");
        }
        assert!(ComputationRange::nm(400.0, 800.0, 1.0).validate().is_ok());
    }

    #[test]
    fn reflectance_series_matches_point_values() {
        let structure = glass();
        let params = OpticalParams::default();
        let data = compute(&structure, &params, &ComputationRange::nm(500.0, 600.0, 50.0)).unwrap();
        assert_eq!(data.x, Array1::from(vec![500.0, 550.0, 600.0]));
        assert!(!data.is_complex());
        let mirror = Mirror::new(&structure, &params);
        assert_abs_diff_eq!(data.y_real[1], mirror.reflectance(550.0).unwrap(), epsilon = 1e-15);
    }

    #[test]
    fn energy_range_keeps_energy_axis() {
        let structure = glass();
        let params = OpticalParams {
            mode: Mode::Permittivity,
            ..OpticalParams::default()
        };
        let range = ComputationRange {
            unit: ComputationUnit::Ev,
            ..ComputationRange::nm(1.5, 2.5, 0.5)
        };
        let data = compute(&structure, &params, &range).unwrap();
        assert_eq!(data.x[0], 1.5);
        assert!(data.is_complex());
        assert_abs_diff_eq!(data.y_real[0], 2.25, epsilon = 1e-15);
    }

    #[test]
    fn scattering_mode_needs_mie_layer() {
        let params = OpticalParams {
            mode: Mode::ScatteringCoefficient,
            ..OpticalParams::default()
        };
        let err = compute(&glass(), &params, &ComputationRange::nm(500.0, 510.0, 10.0)).unwrap_err();
        assert_eq!(err.header(), "Scattering coefficient unavailable");
    }
}

/// Relative tolerance that keeps the end of a range despite rounding.
pub const RANGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComputationUnit {
    #[default]
    Nm,
    Ev,
}

impl fmt::Display for ComputationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationUnit::Nm => write!(f, "nm"),
            ComputationUnit::Ev => write!(f, "eV"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ComputationRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    #[serde(default)]
    pub unit: ComputationUnit,
}

impl ComputationRange {
    pub fn nm(start: f64, end: f64, step: f64) -> Self {
        Self {
            start,
            end,
            step,
            unit: ComputationUnit::Nm,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |detail: String| Err(Error::structural("Computation range error", detail));
        if !(self.start > 0.0) {
            return fail(format!("incorrect computation start {}, it must be > 0", self.start));
        }
        if self.end < self.start {
            return fail(format!(
                "incorrect computation range, end {} is less than start {}",
                self.end, self.start
            ));
        }
        if !(self.step > 0.0) {
            return fail(format!("incorrect computation step {}, it must be > 0", self.step));
        }
        Ok(())
    }

    /// Sample points in the unit of the range.
    pub fn values(&self) -> Array1<f64> {
        Array1::from(inclusive_steps(self.start, self.end, self.step))
    }

    fn wavelength(&self, x: f64) -> f64 {
        match self.unit {
            ComputationUnit::Nm => x,
            ComputationUnit::Ev => to_wavelength(x),
        }
    }
}

/// `start + i·step` for every `i` that stays within `end`, the end point
/// included up to [`RANGE_TOLERANCE`].
///
/// Values are computed from the index rather than by repeated addition so
/// that rounding never accumulates.
pub fn inclusive_steps(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || end < start {
        return vec![];
    }
    let limit = end + RANGE_TOLERANCE * end.abs().max(step);
    (0..)
        .map(|i| start + i as f64 * step)
        .take_while(|value| *value <= limit)
        .collect()
}

/// Computes the mode of `params` at every point of `range`.
pub fn compute<S: Slot>(
    structure: &Structure<S>,
    params: &OpticalParams,
    range: &ComputationRange,
) -> Result<ComputedData> {
    let x = range.values();
    let mirror = Mirror::new(structure, params);
    let mut data = ComputedData::new_empty(x.clone(), params.mode.is_complex());
    debug!(mode = %params.mode, points = x.len(), "computing");

    for (i, value) in x.iter().enumerate() {
        let wl = range.wavelength(*value);
        let (re, im) = match params.mode {
            Mode::Reflectance => (mirror.reflectance(wl)?, None),
            Mode::Transmittance => (mirror.transmittance(wl)?, None),
            Mode::Absorbance => (mirror.absorbance(wl)?, None),
            Mode::Permittivity => {
                let eps = mirror.permittivity(wl)?;
                (eps.re, Some(eps.im))
            }
            Mode::RefractiveIndex => {
                let n = mirror.refractive_index(wl)?;
                (n.re, Some(n.im))
            }
            Mode::ExtinctionCoefficient => (mirror.extinction_coefficient(wl)?, None),
            Mode::ScatteringCoefficient => (mirror.scattering_coefficient(wl)?, None),
        };
        data.y_real[i] = re;
        if let (Some(series), Some(im)) = (data.y_imaginary.as_mut(), im) {
            series[i] = im;
        }
    }
    Ok(data)
}
