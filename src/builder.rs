//! Structure descriptions to structures.
//!
//! A description is a JSON array of nodes, or an object `{"layers": [...]}`.
//! - `{"repeat": n}` (the only field) starts a block repeated `n` times
//! - layers before the first repeat descriptor form a block repeated once
//! - `{"definition": {"name": ..., ...}}` declares a user layer type whose
//!   fields are merged over every layer naming it in `material` or `type`
//!
//! Layers dispatch on `material` (gaas, algaas, algaassb, gan, algan,
//! custom) or `type` (excitonic, eff_medium, mie, spheres_lattice).
//! [`build_structure`] rejects variable parameters, [`build_mutable_structure`]
//! accepts them.

use std::collections::HashMap;

use itertools::Itertools;
use serde_json::{Map, Value};
use tracing::debug;

use crate::complex::is_complex_literal;
use crate::composite::Composite;
use crate::error::{Error, Result};
use crate::exciton::Exciton;
use crate::expression::Expression;
use crate::layer::{AdachiModel, Layer};
use crate::mie::MieOrders;
use crate::params::{ComplexSlot, Slot, VarParameter, Variation};
use crate::particle::{Oscillator, Particle, ParticleKind, ParticleMaterial};
use crate::structure::{Block, Structure};
use crate::tabulated::DispersionRegistry;
use crate::tanguy::Tanguy95Params;


/// Names and data available while building a structure.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub registry: DispersionRegistry,
    /// User layer types, keyed by lower case name.
    pub definitions: HashMap<String, Map<String, Value>>,
}

impl BuildContext {
    pub fn new(registry: DispersionRegistry) -> Self {
        Self {
            registry,
            definitions: HashMap::new(),
        }
    }
}

const MAX_DEFINITION_DEPTH: usize = 16;
const TANGUY95_GENERAL: &str = "tanguy95_general";

/// Builds a structure whose parameters are all fixed.
pub fn build_structure(description: &Value, ctx: &BuildContext) -> Result<Structure<f64>> {
    build(description, ctx)
}

/// Builds a structure whose parameters may be variable.
pub fn build_mutable_structure(description: &Value, ctx: &BuildContext) -> Result<Structure<VarParameter>> {
    build(description, ctx)
}

fn build<S: Slot>(description: &Value, ctx: &BuildContext) -> Result<Structure<S>> {
    let nodes = match description {
        Value::Array(nodes) => nodes,
        Value::Object(fields) => match fields.get("layers") {
            Some(Value::Array(nodes)) => nodes,
            _ => return Err(malformed("expected an array of nodes or {\"layers\": [...]}")),
        },
        _ => return Err(malformed("expected an array of nodes or {\"layers\": [...]}")),
    };

    let mut definitions = ctx.definitions.clone();
    let mut body = Vec::with_capacity(nodes.len());
    for node in nodes {
        let fields = node
            .as_object()
            .ok_or_else(|| malformed(format!("every node must be an object, got {}", node)))?;
        match fields.get("definition") {
            Some(definition) => {
                let (name, definition) = parse_definition(definition)?;
                debug!("user definition \"{}\"", name);
                definitions.insert(name, definition);
            }
            None => body.push(fields),
        }
    }

    let builder = Builder {
        registry: &ctx.registry,
        definitions: &definitions,
    };

    let mut blocks = Vec::new();
    let mut current: Option<(usize, Vec<Layer<S>>)> = None;
    for (index, fields) in body.iter().enumerate() {
        if is_repeat_descriptor(fields) {
            if let Some((repeat, layers)) = current.take() {
                if layers.is_empty() {
                    return Err(Error::structural(
                        "Invalid repeat descriptor",
                        format!("node {} follows another repeat descriptor without layers in between", index),
                    ));
                }
                blocks.push(Block::new(repeat, layers));
            }
            current = Some((repeat_count(&fields["repeat"])?, Vec::new()));
        } else {
            let layer = builder.layer(Fields::new(fields, ""), 0)?;
            current.get_or_insert_with(|| (1, Vec::new())).1.push(layer);
        }
    }
    if let Some((repeat, layers)) = current {
        if layers.is_empty() {
            return Err(Error::structural(
                "Invalid repeat descriptor",
                "the description ends with a repeat descriptor that has no layers",
            ));
        }
        blocks.push(Block::new(repeat, layers));
    }

    let blocks = blocks.into_iter().filter(|b| b.repeat > 0).collect_vec();
    debug!(
        "built {} block(s) with {} layer(s) in total",
        blocks.len(),
        blocks.iter().map(|b| b.repeat * b.layers.len()).sum::<usize>()
    );
    Ok(Structure::new(blocks))
}

fn malformed(detail: impl Into<String>) -> Error {
    Error::structural("Malformed description", detail)
}

fn is_repeat_descriptor(fields: &Map<String, Value>) -> bool {
    fields.len() == 1 && fields.contains_key("repeat")
}

fn repeat_count(value: &Value) -> Result<usize> {
    let invalid = || {
        Error::structural(
            "Invalid repeat descriptor",
            format!("repeat must be a non-negative integer, got {}", value),
        )
    };
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize).ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<usize>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn parse_definition(node: &Value) -> Result<(String, Map<String, Value>)> {
    let mut fields = node
        .as_object()
        .cloned()
        .ok_or_else(|| malformed("\"definition\" must be an object"))?;
    let name = match fields.remove("name") {
        Some(Value::String(name)) => name.to_lowercase(),
        _ => return Err(malformed("a definition needs a \"name\" string")),
    };
    Ok((name, fields))
}

/// Object node with the dotted path used to name its slots.
#[derive(Clone, Copy)]
struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, path: &'a str) -> Self {
        Self { map, path }
    }

    fn name(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn require(&self, key: &str) -> Result<&'a Value> {
        self.get(key).ok_or_else(|| {
            Error::structural(
                "Missing parameter",
                format!("\"{}\" is required", self.name(key)),
            )
        })
    }

    fn slot<S: Slot>(&self, key: &str) -> Result<S> {
        S::from_node(self.require(key)?, &self.name(key))
    }

    fn optional_slot<S: Slot>(&self, key: &str) -> Result<Option<S>> {
        self.get(key)
            .map(|node| S::from_node(node, &self.name(key)))
            .transpose()
    }

    fn non_negative<S: Slot>(&self, key: &str) -> Result<S> {
        let slot = self.slot(key)?;
        check_range(&slot, &self.name(key), 0.0, f64::INFINITY)?;
        Ok(slot)
    }

    fn fraction<S: Slot>(&self, key: &str) -> Result<S> {
        let slot = self.slot(key)?;
        check_range(&slot, &self.name(key), 0.0, 1.0)?;
        Ok(slot)
    }

    fn complex<S: Slot>(&self, key: &str) -> Result<ComplexSlot<S>> {
        ComplexSlot::from_node(self.require(key)?, &self.name(key))
    }

    fn text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_lowercase())),
            Some(other) => Err(Error::structural(
                "Invalid parameter",
                format!("\"{}\" must be a string, got {}", self.name(key), other),
            )),
        }
    }

    fn object(&self, key: &str) -> Result<&'a Map<String, Value>> {
        self.require(key)?.as_object().ok_or_else(|| {
            Error::structural(
                "Invalid parameter",
                format!("\"{}\" must be an object", self.name(key)),
            )
        })
    }
}

/// Checks constants and the known bounds of variations against `[lo, hi]`.
fn check_range<S: Slot>(slot: &S, name: &str, lo: f64, hi: f64) -> Result<()> {
    let bounds: Vec<f64> = match slot.as_var().map(VarParameter::variation) {
        Some(Variation::Random { mean, .. }) => vec![*mean],
        Some(Variation::Range { start, end, .. }) => vec![*start, *end],
        Some(Variation::File(_)) => vec![],
        Some(Variation::Constant) | None => vec![slot.value()?],
    };
    match bounds.into_iter().find(|v| !(lo..=hi).contains(v)) {
        Some(value) => Err(Error::structural(
            "Invalid parameter",
            format!("\"{}\" = {} is outside [{}, {}]", name, value, lo, hi),
        )),
        None => Ok(()),
    }
}

enum LayerType {
    GaAs,
    AlGaAs,
    AlGaAsSb,
    GaN,
    AlGaN,
    Custom,
    Excitonic,
    EffectiveMedium,
    Mie,
    SpheresLattice,
    UserDefined(String),
}

struct Builder<'a> {
    registry: &'a DispersionRegistry,
    definitions: &'a HashMap<String, Map<String, Value>>,
}

impl Builder<'_> {
    fn layer_type(&self, fields: Fields) -> Result<LayerType> {
        if let Some(material) = fields.text("material")? {
            if self.definitions.contains_key(&material) {
                return Ok(LayerType::UserDefined(material));
            }
            return match material.as_str() {
                "gaas" => Ok(LayerType::GaAs),
                "algaas" => Ok(LayerType::AlGaAs),
                "algaassb" => Ok(LayerType::AlGaAsSb),
                "gan" => Ok(LayerType::GaN),
                "algan" => Ok(LayerType::AlGaN),
                "custom" => Ok(LayerType::Custom),
                other => Err(Error::structural(
                    "Unknown material",
                    format!("unknown material \"{}\"", other),
                )),
            };
        }
        if let Some(kind) = fields.text("type")? {
            if self.definitions.contains_key(&kind) {
                return Ok(LayerType::UserDefined(kind));
            }
            return match kind.as_str() {
                "excitonic" => Ok(LayerType::Excitonic),
                "eff_medium" => Ok(LayerType::EffectiveMedium),
                "mie" => Ok(LayerType::Mie),
                "spheres_lattice" => Ok(LayerType::SpheresLattice),
                other => Err(Error::structural(
                    "Unknown layer type",
                    format!("unknown layer type \"{}\"", other),
                )),
            };
        }
        Err(Error::structural(
            "Unknown layer",
            format!(
                "missing \"material\" or \"type\" parameter in {}",
                Value::Object(fields.map.clone())
            ),
        ))
    }

    /// Builds a layer. Media nested in composites may omit `d`.
    fn layer<S: Slot>(&self, fields: Fields, depth: usize) -> Result<Layer<S>> {
        let layer_type = self.layer_type(fields)?;
        if let LayerType::UserDefined(name) = layer_type {
            if depth >= MAX_DEFINITION_DEPTH {
                return Err(Error::structural(
                    "Recursive definition",
                    format!("definition \"{}\" refers to itself", name),
                ));
            }
            let mut merged = fields.map.clone();
            merged.remove("material");
            merged.remove("type");
            for (key, value) in &self.definitions[&name] {
                merged.insert(key.clone(), value.clone());
            }
            return self.layer(Fields::new(&merged, fields.path), depth + 1);
        }

        let d: S = if fields.path.is_empty() || fields.get("d").is_some() {
            fields.non_negative("d")?
        } else {
            S::constant(&fields.name("d"), 0.0)
        };

        let layer = match layer_type {
            LayerType::GaAs => self.adachi(fields, d, S::constant(&fields.name("cal"), 0.0))?,
            LayerType::AlGaAs => self.adachi(fields, d, fields.fraction("cal")?)?,
            LayerType::AlGaAsSb => Layer::AlGaAsSb {
                d,
                c_al: fields.fraction("cal")?,
                c_as: fields.fraction("cas")?,
            },
            LayerType::GaN => Layer::AlGaN {
                d,
                c_al: S::constant(&fields.name("cal"), 0.0),
            },
            LayerType::AlGaN => Layer::AlGaN {
                d,
                c_al: fields.fraction("cal")?,
            },
            LayerType::Custom => self.custom(fields, d)?,
            LayerType::Excitonic => Layer::Excitonic {
                d,
                medium: Box::new(self.medium(fields)?),
                exciton: self.exciton(fields)?,
            },
            LayerType::EffectiveMedium => Layer::EffectiveMedium {
                composite: self.composite(fields, d, false)?,
                f: fields.fraction("f")?,
            },
            LayerType::Mie => Layer::Mie {
                composite: self.composite(fields, d, true)?,
                f: fields.fraction("f")?,
                orders: orders(fields)?,
                include_medium_absorption: match fields.get("include_medium_absorption") {
                    None => false,
                    Some(Value::Bool(flag)) => *flag,
                    Some(other) => {
                        return Err(Error::structural(
                            "Invalid parameter",
                            format!("\"include_medium_absorption\" must be true or false, got {}", other),
                        ))
                    }
                },
            },
            LayerType::SpheresLattice => Layer::SpheresLattice {
                composite: self.composite(fields, d, false)?,
                lattice_factor: fields.non_negative("lattice_factor")?,
            },
            LayerType::UserDefined(name) => {
                return Err(Error::structural(
                    "Unknown layer",
                    format!("definition \"{}\" was not expanded", name),
                ))
            }
        };
        Ok(layer)
    }

    fn adachi<S: Slot>(&self, fields: Fields, d: S, c_al: S) -> Result<Layer<S>> {
        let name = fields.text("eps")?.ok_or_else(|| {
            Error::structural(
                "Missing parameter",
                format!("\"{}\" must name a permittivity model", fields.name("eps")),
            )
        })?;
        let model = AdachiModel::from_name(&name).ok_or_else(|| {
            Error::structural(
                "Unknown permittivity model",
                format!(
                    "\"{}\" is not one of {}",
                    name,
                    AdachiModel::ALL.iter().map(AdachiModel::name).join(", ")
                ),
            )
        })?;
        let (needs_df, needs_g) = model.requirements();
        let df = if needs_df { Some(fields.slot("df")?) } else { fields.optional_slot("df")? };
        let g = if needs_g { Some(fields.slot("g")?) } else { fields.optional_slot("g")? };
        Ok(Layer::Adachi {
            d,
            c_al,
            df,
            g,
            model,
        })
    }

    fn custom<S: Slot>(&self, fields: Fields, d: S) -> Result<Layer<S>> {
        let eps = fields.require("eps")?;
        if let Some(source) = eps.get("expr") {
            let source = source.as_str().ok_or_else(|| {
                Error::structural("Invalid parameter", "\"eps.expr\" must be a string")
            })?;
            return Ok(Layer::Expression {
                d,
                expression: Expression::parse(source)?,
            });
        }
        if let Value::String(text) = eps {
            if !is_complex_literal(text) {
                let name = text.trim().to_lowercase();
                if name == TANGUY95_GENERAL {
                    return Ok(Layer::Tanguy {
                        d,
                        model: Tanguy95Params {
                            m_e: fields.slot("m_e")?,
                            m_hh: fields.slot("m_hh")?,
                            exciton_rydberg: fields.slot("exciton_rydberg")?,
                            eg: fields.slot("eg")?,
                            gamma: fields.slot("g")?,
                            matrix_element: fields.slot("matr_el")?,
                            eps_infrared: fields.slot("eps_infra")?,
                        },
                    });
                }
                return Ok(Layer::Tabulated {
                    d,
                    table: self.registry.resolve(&name)?,
                });
            }
        }
        Ok(Layer::ConstPermittivity {
            d,
            eps: fields.complex("eps")?,
        })
    }

    fn medium<S: Slot>(&self, fields: Fields) -> Result<Layer<S>> {
        let medium = fields.object("medium")?;
        let path = fields.name("medium");
        self.layer(Fields::new(medium, &path), 0)
    }

    fn composite<S: Slot>(&self, fields: Fields, d: S, is_mie: bool) -> Result<Composite<S>> {
        Ok(Composite {
            d,
            medium: Box::new(self.medium(fields)?),
            particle: self.particle(fields, is_mie)?,
        })
    }

    fn exciton<S: Slot>(&self, fields: Fields) -> Result<Exciton<S>> {
        let path = fields.name("exciton");
        let ex = Fields::new(fields.object("exciton")?, &path);
        Ok(Exciton {
            w0: ex.non_negative("w0")?,
            g0: ex.slot("g0")?,
            g: ex.slot("g")?,
            wb: ex.slot("wb")?,
            gb: ex.slot("gb")?,
            b: ex.slot("b")?,
            c: ex.complex("c")?,
        })
    }

    fn particle<S: Slot>(&self, fields: Fields, is_mie: bool) -> Result<Particle<S>> {
        let path = fields.name("particles");
        let p = Fields::new(fields.object("particles")?, &path);

        let radius = match (is_mie, p.get("r")) {
            (true, _) => Some(p.non_negative("r")?),
            (false, None) => None,
            (false, Some(_)) => {
                return Err(Error::structural(
                    "Unexpected parameter",
                    format!("\"{}\" can be given only for Mie layers", p.name("r")),
                ))
            }
        };

        let material = p.text("material")?.ok_or_else(|| {
            Error::structural(
                "Missing parameter",
                format!("\"{}\" must name the particle material", p.name("material")),
            )
        })?;
        let kind = match material.as_str() {
            "drude" => ParticleKind::Drude {
                w: p.non_negative("w")?,
                g: p.slot("g")?,
                eps_inf: p.slot("epsinf")?,
            },
            "drude_lorentz" => ParticleKind::DrudeLorentz {
                w: p.non_negative("w")?,
                g: p.slot("g")?,
                eps_inf: p.slot("epsinf")?,
                oscillators: oscillators(p)?,
            },
            "custom" => {
                let eps = p.require("eps")?;
                match eps {
                    Value::Object(e) if e.contains_key("expr") => {
                        let source = e["expr"].as_str().ok_or_else(|| {
                            Error::structural("Invalid parameter", "\"eps.expr\" must be a string")
                        })?;
                        ParticleKind::Expression(Expression::parse(source)?)
                    }
                    Value::String(text) if !is_complex_literal(text) => {
                        ParticleKind::Tabulated(self.registry.resolve(&text.trim().to_lowercase())?)
                    }
                    _ => ParticleKind::Const(p.complex("eps")?),
                }
            }
            other => match ParticleMaterial::from_name(other) {
                Some(material) => ParticleKind::Material {
                    material,
                    table: self.registry.resolve(material.table_name())?,
                },
                None => {
                    return Err(Error::structural(
                        "Unknown particle material",
                        format!("unknown particle material \"{}\"", other),
                    ))
                }
            },
        };
        Ok(Particle { radius, kind })
    }
}

fn orders(fields: Fields) -> Result<MieOrders> {
    let text = match fields.require("orders")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.parse::<MieOrders>()
        .map_err(|detail| Error::structural("Invalid parameter", detail))
}

/// Oscillators given as an array or as an object keyed by order.
fn oscillators<S: Slot>(fields: Fields) -> Result<Vec<Oscillator<S>>> {
    let entries: Vec<(String, &Value)> = match fields.require("oscillators")? {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| ((i + 1).to_string(), item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| (key.clone(), item))
            .sorted_by(|(a, _), (b, _)| match (a.parse::<f64>(), b.parse::<f64>()) {
                (Ok(x), Ok(y)) => x.total_cmp(&y),
                _ => a.cmp(b),
            })
            .collect(),
        other => {
            return Err(Error::structural(
                "Invalid parameter",
                format!("\"{}\" must be an array or an object, got {}", fields.name("oscillators"), other),
            ))
        }
    };

    entries
        .into_iter()
        .map(|(order, item)| {
            let path = fields.name(&format!("oscillators.{}", order));
            let map = item.as_object().ok_or_else(|| {
                Error::structural("Invalid parameter", format!("\"{}\" must be an object", path))
            })?;
            let osc = Fields::new(map, &path);
            Ok(Oscillator {
                f: osc.slot("f")?,
                g: osc.slot("g")?,
                w: osc.slot("w")?,
            })
        })
        .collect()
}
