//! Whole-stack optical response.
//!
//! A [`Mirror`] wraps a structure together with the optical context and
//! produces the stack transfer matrix, the amplitude coefficients and the
//! energy fractions R, T and A. Material quantities (permittivity, index,
//! extinction, scattering) are read from the first layer.

use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::fresnel::interface_matrix;
use crate::layer::Layer;
use crate::matrix::TransferMatrix;
use crate::optics::{OpticalParams, Polarization};
use crate::params::Slot;
use crate::snell::{cos_theta_in_layer, cos_theta_incident};
use crate::structure::Structure;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::real;
    use crate::optics::Medium;
    use crate::params::ComplexSlot;
    use crate::structure::Block;
    use approx::assert_abs_diff_eq;

    fn constant(d: f64, eps: Complex64) -> Layer<f64> {
        Layer::ConstPermittivity {
            d,
            eps: ComplexSlot::constant("eps", eps),
        }
    }

    fn stack(layers: Vec<Layer<f64>>) -> Structure<f64> {
        Structure::new(vec![Block::new(1, layers)])
    }

    #[test]
    fn empty_structure_between_identical_media_is_transparent() {
        let structure = Structure::<f64>::new(vec![]);
        let params = OpticalParams::default();
        let mirror = Mirror::new(&structure, &params);
        assert_abs_diff_eq!(mirror.reflectance(500.0).unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mirror.transmittance(500.0).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mirror.absorbance(500.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn layer_matching_the_surroundings_is_invisible() {
        let structure = stack(vec![constant(120.0, real(1.0))]);
        for polarization in [Polarization::S, Polarization::P] {
            let params = OpticalParams {
                polarization,
                angle: 30.0,
                ..OpticalParams::default()
            };
            let mirror = Mirror::new(&structure, &params);
            assert_abs_diff_eq!(mirror.reflectance(550.0).unwrap(), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(mirror.transmittance(550.0).unwrap(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn bare_interface_matches_fresnel() {
        let params = OpticalParams {
            right: Medium::Custom { n_re: 1.5, n_im: 0.0 },
            ..OpticalParams::default()
        };
        let structure = Structure::<f64>::new(vec![]);
        let mirror = Mirror::new(&structure, &params);
        assert_abs_diff_eq!(mirror.reflectance(500.0).unwrap(), 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(mirror.transmittance(500.0).unwrap(), 0.96, epsilon = 1e-12);
    }

    #[test]
    fn lossless_film_conserves_energy() {
        let structure = stack(vec![constant(85.0, real(4.0)), constant(40.0, real(2.1))]);
        for polarization in [Polarization::S, Polarization::P] {
            let params = OpticalParams {
                polarization,
                angle: 45.0,
                right: Medium::Custom { n_re: 1.45, n_im: 0.0 },
                ..OpticalParams::default()
            };
            let mirror = Mirror::new(&structure, &params);
            for wl in [400.0, 532.0, 800.0] {
                let r = mirror.reflectance(wl).unwrap();
                let t = mirror.transmittance(wl).unwrap();
                assert_abs_diff_eq!(r + t, 1.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn quarter_wave_coating_cancels_reflection() {
        // n = sqrt(1.5) coating of quarter-wave thickness on n = 1.5
        let n = 1.5f64.sqrt();
        let structure = stack(vec![constant(600.0 / (4.0 * n), real(1.5))]);
        let params = OpticalParams {
            right: Medium::Custom { n_re: 1.5, n_im: 0.0 },
            ..OpticalParams::default()
        };
        let mirror = Mirror::new(&structure, &params);
        assert_abs_diff_eq!(mirror.reflectance(600.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn absorbing_layer_absorbs() {
        let structure = stack(vec![constant(30.0, Complex64::new(-10.0, 4.0))]);
        let params = OpticalParams::default();
        let mirror = Mirror::new(&structure, &params);
        let a = mirror.absorbance(600.0).unwrap();
        assert!(a > 0.0 && a < 1.0);
    }

    #[test]
    fn material_quantities_come_from_first_layer() {
        let structure = stack(vec![constant(10.0, real(4.0)), constant(10.0, real(9.0))]);
        let params = OpticalParams::default();
        let mirror = Mirror::new(&structure, &params);
        assert_eq!(mirror.permittivity(500.0).unwrap(), real(4.0));
        assert_abs_diff_eq!(mirror.refractive_index(500.0).unwrap().re, 2.0, epsilon = 1e-12);
        assert_eq!(mirror.extinction_coefficient(500.0).unwrap(), 0.0);
        let err = mirror.scattering_coefficient(500.0).unwrap_err();
        assert_eq!(err.header(), "Scattering coefficient unavailable");
    }

    #[test]
    fn empty_structure_has_no_material() {
        let structure = Structure::<f64>::new(vec![]);
        let params = OpticalParams::default();
        let err = Mirror::new(&structure, &params).permittivity(500.0).unwrap_err();
        assert_eq!(err.header(), "Empty structure");
    }
}

/// Structure between the two external media of `params`.
pub struct Mirror<'a, S> {
    structure: &'a Structure<S>,
    params: &'a OpticalParams,
}

impl<'a, S: Slot> Mirror<'a, S> {
    pub fn new(structure: &'a Structure<S>, params: &'a OpticalParams) -> Self {
        Self { structure, params }
    }

    /// Transfer matrix of the whole stack at wavelength `wl`.
    ///
    /// **Context**: Layer matrices carry the phase accumulated inside each
    /// layer, interface matrices the jump between neighbouring media. Both are
    /// needed from the left external medium to the right one.
    ///
    /// **How it Works**: Walks the flattened layers in order, pre-multiplying
    /// the running product by the interface into each layer and then by the
    /// layer itself. The interface into the right medium closes the product.
    /// An empty structure reduces to the single left-to-right interface.
    pub fn matrix(&self, wl: f64) -> Result<TransferMatrix> {
        let params = self.params;
        let medium = |n: Complex64| (n, cos_theta_in_layer(n, wl, params));

        let left = medium(params.left.refractive_index(wl));
        let (product, last) = self.structure.layers().try_fold(
            (TransferMatrix::identity(), left),
            |(acc, (n1, cos1)), layer| -> Result<_> {
                let (n2, cos2) = medium(layer.refractive_index(wl, params.temperature)?);
                let interface = interface_matrix(n1, cos1, n2, cos2, params.polarization);
                let acc = layer.matrix(wl, params)? * (interface * acc);
                Ok((acc, (n2, cos2)))
            },
        )?;

        let (n_right, cos_right) = medium(params.right.refractive_index(wl));
        let closing = interface_matrix(last.0, last.1, n_right, cos_right, params.polarization);
        Ok(closing * product)
    }

    /// Reflection amplitude `−M10/M11`.
    pub fn r(&self, wl: f64) -> Result<Complex64> {
        let m = self.matrix(wl)?;
        Ok(-m.get(1, 0) / m.get(1, 1))
    }

    /// Transmission amplitude `det M / M11`.
    pub fn t(&self, wl: f64) -> Result<Complex64> {
        let m = self.matrix(wl)?;
        Ok(m.det() / m.get(1, 1))
    }

    pub fn reflectance(&self, wl: f64) -> Result<f64> {
        Ok(self.r(wl)?.norm_sqr())
    }

    /// Transmitted energy fraction, with the index and angle factor of the
    /// right medium relative to the left one.
    pub fn transmittance(&self, wl: f64) -> Result<f64> {
        let params = self.params;
        let n1 = params.left.refractive_index(wl);
        let n2 = params.right.refractive_index(wl);
        let cos1 = Complex64::new(cos_theta_incident(params.angle), 0.0);
        let cos2 = cos_theta_in_layer(n2, wl, params);
        let factor = match params.polarization {
            Polarization::P => (n2 * cos1) / (n1 * cos2),
            Polarization::S => (n2 * cos2) / (n1 * cos1),
        };
        Ok(factor.norm() * self.t(wl)?.norm_sqr())
    }

    pub fn absorbance(&self, wl: f64) -> Result<f64> {
        Ok(1.0 - self.reflectance(wl)? - self.transmittance(wl)?)
    }

    pub fn permittivity(&self, wl: f64) -> Result<Complex64> {
        self.first_layer()?.permittivity(wl, self.params.temperature)
    }

    pub fn refractive_index(&self, wl: f64) -> Result<Complex64> {
        self.first_layer()?.refractive_index(wl, self.params.temperature)
    }

    pub fn extinction_coefficient(&self, wl: f64) -> Result<f64> {
        self.first_layer()?.extinction_coefficient(wl, self.params.temperature)
    }

    pub fn scattering_coefficient(&self, wl: f64) -> Result<f64> {
        self.first_layer()?.scattering_coefficient(wl, self.params.temperature)
    }

    fn first_layer(&self) -> Result<&'a Layer<S>> {
        self.structure.first_layer().ok_or_else(|| {
            Error::structural("Empty structure", "the structure does not contain any layer")
        })
    }
}
