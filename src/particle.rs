//! Particles embedded in composite layers.
//!
//! A particle only knows its permittivity as a function of wavelength and,
//! for Mie layers, its radius. Temperature never enters particle models.
//!
//! - Drude and Drude-Lorentz free-carrier response
//! - constant or expression based permittivity
//! - tabulated data, either named directly or through a fixed material
//!   selector for Sb and Bi datasets

use std::fmt;

use num_complex::Complex64;

use crate::drude::{self, LorentzOscillator};
use crate::error::{Error, Result};
use crate::expression::Expression;
use crate::params::{ComplexSlot, Slot};
use crate::tabulated::NamedTable;


/// Tabulated particle datasets selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleMaterial {
    SbCardona,
    SbPallik,
    BiCardonaAdachiOrthogonal,
    BiCardonaAdachiParallel,
}

impl ParticleMaterial {
    pub const ALL: [ParticleMaterial; 4] = [
        ParticleMaterial::SbCardona,
        ParticleMaterial::SbPallik,
        ParticleMaterial::BiCardonaAdachiOrthogonal,
        ParticleMaterial::BiCardonaAdachiParallel,
    ];

    /// Name used in structure descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            ParticleMaterial::SbCardona => "sb_cardona",
            ParticleMaterial::SbPallik => "sb_pallik",
            ParticleMaterial::BiCardonaAdachiOrthogonal => "bi_cardona_adachi_orthogonal",
            ParticleMaterial::BiCardonaAdachiParallel => "bi_cardona_adachi_parallel",
        }
    }

    /// Registry entry holding the dataset.
    pub fn table_name(&self) -> &'static str {
        match self {
            ParticleMaterial::SbCardona => "sb_cardona_adachi",
            ParticleMaterial::SbPallik => "sb_pallik",
            ParticleMaterial::BiCardonaAdachiOrthogonal => "bi_cardona_adachi_orthogonal",
            ParticleMaterial::BiCardonaAdachiParallel => "bi_cardona_adachi_parallel",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for ParticleMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lorentz oscillator whose parameters may vary.
#[derive(Debug, Clone, PartialEq)]
pub struct Oscillator<S> {
    pub f: S,
    pub g: S,
    pub w: S,
}

impl<S: Slot> Oscillator<S> {
    fn value(&self) -> Result<LorentzOscillator> {
        Ok(LorentzOscillator {
            f: self.f.value()?,
            g: self.g.value()?,
            w: self.w.value()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleKind<S> {
    Drude {
        w: S,
        g: S,
        eps_inf: S,
    },
    DrudeLorentz {
        w: S,
        g: S,
        eps_inf: S,
        /// Ordered by the key given in the description.
        oscillators: Vec<Oscillator<S>>,
    },
    Const(ComplexSlot<S>),
    Expression(Expression),
    Tabulated(NamedTable),
    Material {
        material: ParticleMaterial,
        table: NamedTable,
    },
}

/// Particle of a composite layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle<S> {
    /// Radius in nm, present only for particles of Mie layers.
    pub radius: Option<S>,
    pub kind: ParticleKind<S>,
}

impl<S: Slot> Particle<S> {
    /// Permittivity at wavelength `wl` (nm).
    pub fn permittivity(&self, wl: f64) -> Result<Complex64> {
        let eps = match &self.kind {
            ParticleKind::Drude { w, g, eps_inf } => {
                drude::drude(wl, w.value()?, g.value()?, eps_inf.value()?)
            }
            ParticleKind::DrudeLorentz {
                w,
                g,
                eps_inf,
                oscillators,
            } => {
                let oscillators = oscillators
                    .iter()
                    .map(Oscillator::value)
                    .collect::<Result<Vec<_>>>()?;
                drude::drude_lorentz(wl, w.value()?, g.value()?, eps_inf.value()?, &oscillators)
            }
            ParticleKind::Const(eps) => eps.value()?,
            ParticleKind::Expression(expression) => expression.evaluate(wl),
            ParticleKind::Tabulated(table) | ParticleKind::Material { table, .. } => {
                table.permittivity(wl)
            }
        };
        Ok(eps)
    }

    /// Radius in nm; a structural error if the particle has none.
    pub fn radius(&self) -> Result<f64> {
        match &self.radius {
            Some(r) => r.value(),
            None => Err(Error::structural(
                "Missing particle radius",
                "particle radius \"r\" is required for this layer type",
            )),
        }
    }

    pub fn slots(&self) -> Vec<&S> {
        let mut slots: Vec<&S> = self.radius.iter().collect();
        match &self.kind {
            ParticleKind::Drude { w, g, eps_inf } => slots.extend([w, g, eps_inf]),
            ParticleKind::DrudeLorentz {
                w,
                g,
                eps_inf,
                oscillators,
            } => {
                slots.extend([w, g, eps_inf]);
                for osc in oscillators {
                    slots.extend([&osc.f, &osc.g, &osc.w]);
                }
            }
            ParticleKind::Const(eps) => slots.extend(eps.slots()),
            ParticleKind::Expression(_)
            | ParticleKind::Tabulated(_)
            | ParticleKind::Material { .. } => {}
        }
        slots
    }

    pub fn slots_mut(&mut self) -> Vec<&mut S> {
        let mut slots: Vec<&mut S> = self.radius.iter_mut().collect();
        match &mut self.kind {
            ParticleKind::Drude { w, g, eps_inf } => slots.extend([w, g, eps_inf]),
            ParticleKind::DrudeLorentz {
                w,
                g,
                eps_inf,
                oscillators,
            } => {
                slots.extend([w, g, eps_inf]);
                for osc in oscillators.iter_mut() {
                    slots.extend([&mut osc.f, &mut osc.g, &mut osc.w]);
                }
            }
            ParticleKind::Const(eps) => slots.extend(eps.slots_mut()),
            ParticleKind::Expression(_)
            | ParticleKind::Tabulated(_)
            | ParticleKind::Material { .. } => {}
        }
        slots
    }
}
