//! Optical layers of a structure.
//!
//! A single enum [`Layer`] covers every layer kind. It is generic over the
//! storage of its real parameters:
//! - `Layer<f64>` is the fixed flavor used for plain computations
//! - `Layer<VarParameter>` is the mutable flavor used for sweeps and
//!   randomization, where exactly one slot of the whole structure varies
//!
//! Every layer exposes its permittivity, the derived refractive index and
//! extinction coefficient, and a transfer matrix. Most layers use the
//! plain phase matrix of [`layer_matrix`]. Excitonic layers fold a resonance
//! term into all four entries, and sphere lattices build their matrix from
//! reflection and transmission amplitudes.

use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;

use crate::adachi;
use crate::algaassb;
use crate::complex::I;
use crate::composite::{self, Composite};
use crate::error::{Error, Result};
use crate::exciton::{self, Exciton};
use crate::expression::Expression;
use crate::matrix::TransferMatrix;
use crate::mie::{MieInput, MieOrders};
use crate::optics::{self, to_energy, to_refractive_index, OpticalParams};
use crate::params::{ComplexSlot, Slot};
use crate::snell::cos_theta_in_layer;
use crate::tabulated::NamedTable;
use crate::tanguy::Tanguy95Params;
use crate::tisch;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::real;
    use crate::params::{VarParameter, Variation};
    use crate::particle::{Particle, ParticleKind};
    use approx::assert_abs_diff_eq;

    fn glass(d: f64) -> Layer<f64> {
        Layer::ConstPermittivity {
            d,
            eps: ComplexSlot::constant("eps", real(2.25)),
        }
    }

    #[test]
    fn phase_matrix_of_lossless_layer_is_unitary_diagonal() {
        let m = glass(100.0).matrix(600.0, &OpticalParams::default()).unwrap();
        // φ = 2π·100·1.5/600 = π/2
        assert_abs_diff_eq!((m.get(0, 0) - I).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((m.get(1, 1) + I).norm(), 0.0, epsilon = 1e-12);
        assert_eq!(m.get(0, 1), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn phase_is_flipped_to_decay() {
        let phi = phase(10.0, Complex64::new(2.0, -0.5), real(1.0), 500.0);
        assert!(phi.im >= 0.0);
        let absorbing = Layer::<f64>::ConstPermittivity {
            d: 50.0,
            eps: ComplexSlot::constant("eps", Complex64::new(-4.0, 1.0)),
        };
        let m = absorbing.matrix(500.0, &OpticalParams::default()).unwrap();
        assert!(m.get(0, 0).norm() <= 1.0);
        assert!(m.get(1, 1).norm() >= 1.0);
    }

    #[test]
    fn gaas_and_algaas_share_the_adachi_model() {
        let gaas = Layer::<f64>::Adachi {
            d: 10.0,
            c_al: 0.0,
            df: Some(0.0),
            g: None,
            model: AdachiModel::Simple,
        };
        let eps = gaas.permittivity(900.0, 300.0).unwrap();
        assert_eq!(eps, adachi::simple_permittivity_scaled(to_energy(900.0), 0.0, 0.0));
    }

    #[test]
    fn missing_model_parameter_is_structural() {
        let layer = Layer::<f64>::Adachi {
            d: 10.0,
            c_al: 0.3,
            df: None,
            g: None,
            model: AdachiModel::ModifiedGaussian,
        };
        assert!(matches!(layer.permittivity(800.0, 300.0), Err(Error::Structural { .. })));
    }

    #[test]
    fn mie_layer_keeps_host_permittivity() {
        let layer = Layer::<f64>::Mie {
            composite: Composite {
                d: 100.0,
                medium: Box::new(glass(0.0)),
                particle: Particle {
                    radius: Some(5.0),
                    kind: ParticleKind::Drude { w: 9.0, g: 0.1, eps_inf: 1.0 },
                },
            },
            f: 0.01,
            orders: MieOrders::All,
            include_medium_absorption: false,
        };
        assert_eq!(layer.permittivity(500.0, 300.0).unwrap(), real(2.25));
        assert!(layer.extinction_coefficient(500.0, 300.0).unwrap() > 0.0);
        assert!(layer.scattering_coefficient(500.0, 300.0).unwrap() > 0.0);
        assert!(glass(1.0).scattering_coefficient(500.0, 300.0).is_err());
    }

    #[test]
    fn excitonic_layer_without_resonance_matches_host() {
        let host = glass(0.0);
        let layer = Layer::<f64>::Excitonic {
            d: 20.0,
            medium: Box::new(host),
            exciton: Exciton {
                w0: 1.5,
                g0: 0.0,
                g: 0.001,
                wb: 1.51,
                gb: 0.001,
                b: 0.05,
                c: ComplexSlot::constant("c", real(0.0)),
            },
        };
        let params = OpticalParams::default();
        let excitonic = layer.matrix(700.0, &params).unwrap();
        let plain = glass(20.0).matrix(700.0, &params).unwrap();
        assert_abs_diff_eq!((excitonic.get(0, 0) - plain.get(0, 0)).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(excitonic.get(0, 1).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn deep_copy_does_not_alias_slots() {
        let mut original = Layer::<VarParameter>::AlGaN {
            d: VarParameter::variable("d", Variation::Random { mean: 10.0, deviation: 1.0 }),
            c_al: VarParameter::constant("cal", 0.2),
        };
        let copy = original.deep_copy();
        assert_eq!(original, copy);

        let mut slots = original.slots_mut();
        slots[0].set(12.0).unwrap();
        assert_eq!(original.thickness().unwrap(), 12.0);
        assert!(matches!(copy.thickness(), Err(Error::Uninitialized { .. })));
    }

    #[test]
    fn nested_slots_are_enumerated() {
        let layer = Layer::<f64>::EffectiveMedium {
            composite: Composite {
                d: 100.0,
                medium: Box::new(glass(0.0)),
                particle: Particle {
                    radius: None,
                    kind: ParticleKind::Drude { w: 9.0, g: 0.1, eps_inf: 1.0 },
                },
            },
            f: 0.1,
        };
        // d, medium (d, eps.re, eps.im), particle (w, g, eps_inf), f
        assert_eq!(layer.slots().len(), 8);
    }
}

/// Permittivity model of a GaAs or AlGaAs layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdachiModel {
    /// Adachi 1985 with the imaginary part scaled by `df`.
    Simple,
    /// Adachi 1989 with broadening `g`.
    Adachi1989,
    /// Djurisic Gaussian broadening.
    Gaussian,
    /// Djurisic with the imaginary part below the gap scaled by `df`.
    ModifiedGaussian,
    /// Temperature dependent AlGaAsSb model with all of the group V sites As.
    Temperature,
}

impl AdachiModel {
    pub const ALL: [AdachiModel; 5] = [
        AdachiModel::Simple,
        AdachiModel::Adachi1989,
        AdachiModel::Gaussian,
        AdachiModel::ModifiedGaussian,
        AdachiModel::Temperature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AdachiModel::Simple => "adachi_simple",
            AdachiModel::Adachi1989 => "adachi_1989",
            AdachiModel::Gaussian => "adachi_gauss",
            AdachiModel::ModifiedGaussian => "adachi_mod_gauss",
            AdachiModel::Temperature => "adachi_t",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// `(needs df, needs g)`
    pub fn requirements(&self) -> (bool, bool) {
        match self {
            AdachiModel::Simple | AdachiModel::ModifiedGaussian => (true, false),
            AdachiModel::Adachi1989 => (false, true),
            AdachiModel::Gaussian | AdachiModel::Temperature => (false, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer<S> {
    ConstPermittivity {
        d: S,
        eps: ComplexSlot<S>,
    },
    Expression {
        d: S,
        expression: Expression,
    },
    Tabulated {
        d: S,
        table: NamedTable,
    },
    Tanguy {
        d: S,
        model: Tanguy95Params<S>,
    },
    Adachi {
        d: S,
        c_al: S,
        df: Option<S>,
        g: Option<S>,
        model: AdachiModel,
    },
    AlGaAsSb {
        d: S,
        c_al: S,
        c_as: S,
    },
    AlGaN {
        d: S,
        c_al: S,
    },
    Excitonic {
        d: S,
        medium: Box<Layer<S>>,
        exciton: Exciton<S>,
    },
    EffectiveMedium {
        composite: Composite<S>,
        f: S,
    },
    Mie {
        composite: Composite<S>,
        f: S,
        orders: MieOrders,
        include_medium_absorption: bool,
    },
    SpheresLattice {
        composite: Composite<S>,
        lattice_factor: S,
    },
}

impl<S: Slot> Layer<S> {
    fn thickness_slot(&self) -> &S {
        match self {
            Layer::ConstPermittivity { d, .. }
            | Layer::Expression { d, .. }
            | Layer::Tabulated { d, .. }
            | Layer::Tanguy { d, .. }
            | Layer::Adachi { d, .. }
            | Layer::AlGaAsSb { d, .. }
            | Layer::AlGaN { d, .. }
            | Layer::Excitonic { d, .. } => d,
            Layer::EffectiveMedium { composite, .. }
            | Layer::Mie { composite, .. }
            | Layer::SpheresLattice { composite, .. } => &composite.d,
        }
    }

    /// Thickness in nm.
    pub fn thickness(&self) -> Result<f64> {
        self.thickness_slot().value()
    }

    /// Permittivity at wavelength `wl` (nm) and temperature `temperature` (K).
    pub fn permittivity(&self, wl: f64, temperature: f64) -> Result<Complex64> {
        let w = to_energy(wl);
        let eps = match self {
            Layer::ConstPermittivity { eps, .. } => eps.value()?,
            Layer::Expression { expression, .. } => expression.evaluate(wl),
            Layer::Tabulated { table, .. } => table.permittivity(wl),
            Layer::Tanguy { model, .. } => model.model()?.permittivity(w),
            Layer::Adachi {
                c_al, df, g, model, ..
            } => {
                let c_al = c_al.value()?;
                match model {
                    AdachiModel::Simple => {
                        adachi::simple_permittivity_scaled(w, c_al, required(df, "df", *model)?)
                    }
                    AdachiModel::Adachi1989 => {
                        adachi::permittivity_1989(w, c_al, required(g, "g", *model)?)
                    }
                    AdachiModel::Gaussian => adachi::gaussian_permittivity(w, c_al),
                    AdachiModel::ModifiedGaussian => {
                        adachi::modified_gaussian_permittivity(w, c_al, required(df, "df", *model)?)
                    }
                    AdachiModel::Temperature => algaassb::permittivity(w, c_al, 1.0, temperature),
                }
            }
            Layer::AlGaAsSb { c_al, c_as, .. } => {
                algaassb::permittivity(w, c_al.value()?, c_as.value()?, temperature)
            }
            Layer::AlGaN { c_al, .. } => tisch::permittivity(w, c_al.value()?, temperature),
            Layer::Excitonic { d, medium, exciton } => {
                let eps_medium = medium.permittivity(wl, temperature)?;
                let contribution =
                    exciton.contribution(wl, d.value()?, to_refractive_index(eps_medium))?;
                eps_medium * (contribution + 1.0 + exciton.c.value()?)
            }
            Layer::EffectiveMedium { composite, f } => composite::effective_medium_permittivity(
                composite.medium_permittivity(wl, temperature)?,
                composite.particle_permittivity(wl)?,
                f.value()?,
            ),
            Layer::Mie { composite, .. } | Layer::SpheresLattice { composite, .. } => {
                composite.medium_permittivity(wl, temperature)?
            }
        };
        Ok(eps)
    }

    pub fn refractive_index(&self, wl: f64, temperature: f64) -> Result<Complex64> {
        self.permittivity(wl, temperature).map(to_refractive_index)
    }

    /// Extinction coefficient in cm⁻¹. Mie layers report the extinction of
    /// their particles, every other layer the absorption of its material.
    pub fn extinction_coefficient(&self, wl: f64, temperature: f64) -> Result<f64> {
        match self {
            Layer::Mie {
                f,
                orders,
                include_medium_absorption,
                ..
            } => Ok(orders.extinction(&self.mie_input(wl, temperature, f)?, *include_medium_absorption)),
            _ => Ok(optics::extinction_coefficient(
                self.refractive_index(wl, temperature)?,
                wl,
            )),
        }
    }

    /// Scattering coefficient in cm⁻¹, defined for Mie layers only.
    pub fn scattering_coefficient(&self, wl: f64, temperature: f64) -> Result<f64> {
        match self {
            Layer::Mie { f, orders, .. } => Ok(orders.scattering(&self.mie_input(wl, temperature, f)?)),
            other => Err(Error::structural(
                "Scattering coefficient unavailable",
                format!("the first layer must be a Mie layer, found {}", other),
            )),
        }
    }

    fn mie_input(&self, wl: f64, temperature: f64, f: &S) -> Result<MieInput> {
        let composite = match self {
            Layer::Mie { composite, .. } => composite,
            other => {
                return Err(Error::structural(
                    "Not a Mie layer",
                    format!("{} has no Mie particles", other),
                ))
            }
        };
        Ok(MieInput {
            wl,
            eps_medium: composite.medium_permittivity(wl, temperature)?,
            eps_particle: composite.particle_permittivity(wl)?,
            f: f.value()?,
            r: composite.particle.radius()?,
        })
    }

    /// Transfer matrix at wavelength `wl` (nm) for the polarization, angle
    /// and temperature in `params`.
    pub fn matrix(&self, wl: f64, params: &OpticalParams) -> Result<TransferMatrix> {
        let temperature = params.temperature;
        match self {
            Layer::Excitonic { exciton, .. } => {
                let n = self.refractive_index(wl, temperature)?;
                let cos = cos_theta_in_layer(n, wl, params);
                let phi = phase(self.thickness()?, n, cos, wl);
                let s = exciton.resonance(wl, cos, params.polarization)?;
                Ok(exciton::resonant_matrix(phi, s))
            }
            Layer::SpheresLattice {
                composite,
                lattice_factor,
            } => {
                let (r, t) = composite::spheres_lattice_rt(
                    wl,
                    params,
                    composite.d.value()?,
                    lattice_factor.value()?,
                    composite.medium_permittivity(wl, temperature)?,
                    composite.particle_permittivity(wl)?,
                );
                Ok(composite::lattice_matrix(r, t))
            }
            _ => Ok(layer_matrix(
                self.thickness()?,
                self.refractive_index(wl, temperature)?,
                wl,
                params,
            )),
        }
    }

    /// Every real slot of the layer, nested media and particles included.
    pub fn slots(&self) -> Vec<&S> {
        match self {
            Layer::ConstPermittivity { d, eps } => {
                let mut slots = vec![d];
                slots.extend(eps.slots());
                slots
            }
            Layer::Expression { d, .. } | Layer::Tabulated { d, .. } => vec![d],
            Layer::Tanguy { d, model } => {
                let mut slots = vec![d];
                slots.extend(model.slots());
                slots
            }
            Layer::Adachi { d, c_al, df, g, .. } => {
                let mut slots = vec![d, c_al];
                slots.extend(df.iter().chain(g.iter()));
                slots
            }
            Layer::AlGaAsSb { d, c_al, c_as } => vec![d, c_al, c_as],
            Layer::AlGaN { d, c_al } => vec![d, c_al],
            Layer::Excitonic { d, medium, exciton } => {
                let mut slots = vec![d];
                slots.extend(medium.slots());
                slots.extend(exciton.slots());
                slots
            }
            Layer::EffectiveMedium { composite, f } | Layer::Mie { composite, f, .. } => {
                let mut slots = composite.slots();
                slots.push(f);
                slots
            }
            Layer::SpheresLattice {
                composite,
                lattice_factor,
            } => {
                let mut slots = composite.slots();
                slots.push(lattice_factor);
                slots
            }
        }
    }

    pub fn slots_mut(&mut self) -> Vec<&mut S> {
        match self {
            Layer::ConstPermittivity { d, eps } => {
                let mut slots = vec![d];
                slots.extend(eps.slots_mut());
                slots
            }
            Layer::Expression { d, .. } | Layer::Tabulated { d, .. } => vec![d],
            Layer::Tanguy { d, model } => {
                let mut slots = vec![d];
                slots.extend(model.slots_mut());
                slots
            }
            Layer::Adachi { d, c_al, df, g, .. } => {
                let mut slots = vec![d, c_al];
                slots.extend(df.iter_mut().chain(g.iter_mut()));
                slots
            }
            Layer::AlGaAsSb { d, c_al, c_as } => vec![d, c_al, c_as],
            Layer::AlGaN { d, c_al } => vec![d, c_al],
            Layer::Excitonic { d, medium, exciton } => {
                let mut slots = vec![d];
                slots.extend(medium.slots_mut());
                slots.extend(exciton.slots_mut());
                slots
            }
            Layer::EffectiveMedium { composite, f } | Layer::Mie { composite, f, .. } => {
                let mut slots = composite.slots_mut();
                slots.push(f);
                slots
            }
            Layer::SpheresLattice {
                composite,
                lattice_factor,
            } => {
                let mut slots = composite.slots_mut();
                slots.push(lattice_factor);
                slots
            }
        }
    }

    /// Independent copy: nested media, particles and slots are all owned,
    /// only read-only tabulated data stays shared.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Layer::ConstPermittivity { .. } => "custom (constant)",
            Layer::Expression { .. } => "custom (expression)",
            Layer::Tabulated { .. } => "custom (tabulated)",
            Layer::Tanguy { .. } => "custom (tanguy95)",
            Layer::Adachi { .. } => "algaas",
            Layer::AlGaAsSb { .. } => "algaassb",
            Layer::AlGaN { .. } => "algan",
            Layer::Excitonic { .. } => "excitonic",
            Layer::EffectiveMedium { .. } => "eff_medium",
            Layer::Mie { .. } => "mie",
            Layer::SpheresLattice { .. } => "spheres_lattice",
        }
    }
}

impl<S: Slot> fmt::Display for Layer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thickness() {
            Ok(d) => write!(f, "{} layer (d = {} nm)", self.kind_name(), d),
            Err(_) => write!(f, "{} layer (d unset)", self.kind_name()),
        }
    }
}

fn required<S: Slot>(slot: &Option<S>, name: &str, model: AdachiModel) -> Result<f64> {
    match slot {
        Some(slot) => slot.value(),
        None => Err(Error::structural(
            "Missing parameter",
            format!("\"{}\" is required by the {} permittivity model", name, model.name()),
        )),
    }
}

/// Phase thickness `2π·d·n·cosθ/λ`, negated when its imaginary part is
/// negative so that `exp(iφ)` always decays.
pub fn phase(d: f64, n: Complex64, cos: Complex64, wl: f64) -> Complex64 {
    let phi = n * cos * (2.0 * PI * d / wl);
    if phi.im < 0.0 {
        -phi
    } else {
        phi
    }
}

/// Transfer matrix `diag(e^{iφ}, e^{−iφ})` of a homogeneous layer of
/// thickness `d` (nm) and refractive index `n`.
pub fn layer_matrix(d: f64, n: Complex64, wl: f64, params: &OpticalParams) -> TransferMatrix {
    let cos = cos_theta_in_layer(n, wl, params);
    let phi = phase(d, n, cos, wl);
    TransferMatrix::diagonal((I * phi).exp(), (-I * phi).exp())
}
