//! Transfer-matrix optics of layered structures.
//!
//! - Dispersion models for semiconductor alloys, particles and excitons
//! - Layers, composites and repeated blocks assembled from a JSON description
//! - Whole-stack reflectance, transmittance and absorbance
//! - Sweeps and randomized averages over a single variable parameter

pub mod adachi;
pub mod algaassb;
pub mod builder;
pub mod complex;
pub mod composite;
pub mod computation;
pub mod drude;
pub mod error;
pub mod exciton;
pub mod expression;
pub mod fresnel;
pub mod layer;
pub mod matrix;
pub mod mie;
pub mod mirror;
pub mod optics;
pub mod output;
pub mod params;
pub mod particle;
pub mod randomizer;
pub mod result;
pub mod settings;
pub mod snell;
pub mod structure;
pub mod sweep;
pub mod tabulated;
pub mod tanguy;
pub mod tisch;
