//! Blocks of repeated layers and their flattening.
//!
//! A structure is an ordered list of blocks, each a layer sequence with a
//! repeat count. Flattening expands every block into `repeat` literal copies
//! of its layers, concatenated in block order. Zero repeat blocks vanish,
//! which is how a description comments sections out.

use std::iter;

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::params::{Slot, VarParameter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::real;
    use crate::params::{ComplexSlot, Variation};

    fn layer(eps: f64) -> Layer<f64> {
        Layer::ConstPermittivity {
            d: 10.0,
            eps: ComplexSlot::constant("eps", real(eps)),
        }
    }

    fn var_layer(variable: bool) -> Layer<VarParameter> {
        let d = if variable {
            VarParameter::variable("d", Variation::Range { start: 1.0, end: 2.0, step: 1.0 })
        } else {
            VarParameter::constant("d", 10.0)
        };
        Layer::AlGaN {
            d,
            c_al: VarParameter::constant("cal", 0.1),
        }
    }

    #[test]
    fn repeated_block_expands_in_order() {
        let structure = Structure::new(vec![Block::new(3, vec![layer(1.0)])]);
        let flat = structure.flatten();
        assert_eq!(flat.layer_count(), 3);
        assert!(flat.layers().all(|l| *l == layer(1.0)));
    }

    #[test]
    fn blocks_concatenate_in_block_order() {
        let (a, b, c) = (layer(1.0), layer(2.0), layer(3.0));
        let structure = Structure::new(vec![
            Block::new(1, vec![a.clone()]),
            Block::new(2, vec![b.clone(), c.clone()]),
        ]);
        let flat: Vec<Layer<f64>> = structure.flatten().layers().cloned().collect();
        assert_eq!(flat, vec![a, b.clone(), c.clone(), b, c]);
    }

    #[test]
    fn zero_repeat_block_vanishes() {
        let structure = Structure::new(vec![Block::new(0, vec![layer(1.0), layer(2.0)])]);
        assert!(structure.flatten().is_empty());
        assert_eq!(structure.layers().count(), 0);
    }

    #[test]
    fn flatten_is_idempotent() {
        let structure = Structure::new(vec![
            Block::new(2, vec![layer(1.0)]),
            Block::new(0, vec![layer(5.0)]),
            Block::new(3, vec![layer(2.0), layer(3.0)]),
        ]);
        let once = structure.flatten();
        assert_eq!(once.flatten(), once);
        assert_eq!(once.layer_count(), 8);
    }

    #[test]
    fn exactly_one_variable_passes() {
        let structure = Structure::new(vec![Block::new(1, vec![var_layer(false), var_layer(true)])]);
        let slot = structure.validate_single_variable().unwrap();
        assert_eq!(slot.name(), "d");
    }

    #[test]
    fn no_variable_fails() {
        let structure = Structure::new(vec![Block::new(1, vec![var_layer(false)])]);
        let err = structure.validate_single_variable().unwrap_err();
        assert_eq!(err.header(), "Non-variable structure");
    }

    #[test]
    fn repeated_variable_counts_per_copy() {
        let structure = Structure::new(vec![Block::new(2, vec![var_layer(true)])]);
        let err = structure.validate_single_variable().unwrap_err();
        assert_eq!(err.header(), "Incorrect number of variable parameters");
    }

    #[test]
    fn variable_slot_is_mutable_in_place() {
        let mut structure = Structure::new(vec![Block::new(1, vec![var_layer(false), var_layer(true)])]);
        structure.variable_slot_mut().unwrap().set(7.0).unwrap();
        let thicknesses: Vec<f64> = structure.layers().map(|l| l.thickness().unwrap()).collect();
        assert_eq!(thicknesses, vec![10.0, 7.0]);

        structure.clear_variables();
        assert!(structure.layers().nth(1).unwrap().thickness().is_err());
    }
}

/// Layer sequence repeated `repeat` times.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<S> {
    pub repeat: usize,
    pub layers: Vec<Layer<S>>,
}

impl<S: Slot> Block<S> {
    pub fn new(repeat: usize, layers: Vec<Layer<S>>) -> Self {
        Self { repeat, layers }
    }

    /// Layers of the block expanded lazily, `repeat` times over.
    pub fn layers(&self) -> impl Iterator<Item = &Layer<S>> + Clone + '_ {
        iter::repeat_n(self.layers.iter(), self.repeat).flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure<S> {
    pub blocks: Vec<Block<S>>,
}

impl<S: Slot> Structure<S> {
    pub fn new(blocks: Vec<Block<S>>) -> Self {
        Self { blocks }
    }

    /// Every layer in traversal order, with repeats expanded.
    pub fn layers(&self) -> impl Iterator<Item = &Layer<S>> + Clone + '_ {
        self.blocks.iter().flat_map(|b| b.layers())
    }

    pub fn layer_count(&self) -> usize {
        self.blocks.iter().map(|b| b.repeat * b.layers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layer_count() == 0
    }

    pub fn first_layer(&self) -> Option<&Layer<S>> {
        self.layers().next()
    }

    /// Single block with repeat 1 holding every layer, or no block at all
    /// when nothing is left.
    pub fn flatten(&self) -> Self {
        let layers = self.layers().cloned().collect_vec();
        if layers.is_empty() {
            return Self { blocks: vec![] };
        }
        Self {
            blocks: vec![Block::new(1, layers)],
        }
    }

    /// Independent copy sharing no mutable state with `self`.
    pub fn deep_copy(&self) -> Self {
        Self {
            blocks: self
                .blocks
                .iter()
                .map(|b| Block::new(b.repeat, b.layers.iter().map(Layer::deep_copy).collect()))
                .collect(),
        }
    }

    /// Variable slots of the flattened structure. A slot inside a repeated
    /// block appears once per copy.
    pub fn variable_slots(&self) -> Vec<&VarParameter> {
        self.layers()
            .flat_map(|layer| layer.slots())
            .filter_map(|slot| slot.as_var())
            .filter(|var| var.is_variable())
            .collect()
    }

    /// The single variable slot, or a structural error when the flattened
    /// structure holds none or several.
    pub fn validate_single_variable(&self) -> Result<&VarParameter> {
        let variables = self.variable_slots();
        match variables.as_slice() {
            [single] => Ok(*single),
            [] => Err(Error::structural(
                "Non-variable structure",
                "the structure must contain exactly one variable parameter, none was found",
            )),
            several => Err(Error::structural(
                "Incorrect number of variable parameters",
                format!(
                    "the structure must contain exactly one variable parameter, found {}: {}",
                    several.len(),
                    several.iter().map(|v| v.name()).join(", ")
                ),
            )),
        }
    }

    /// Mutable access to the first variable slot of a non-empty block.
    pub fn variable_slot_mut(&mut self) -> Option<&mut VarParameter> {
        self.blocks
            .iter_mut()
            .filter(|b| b.repeat > 0)
            .flat_map(|b| b.layers.iter_mut())
            .flat_map(|layer| layer.slots_mut())
            .filter_map(|slot| slot.as_var_mut())
            .find(|var| var.is_variable())
    }

    /// Forgets the values of every variable slot.
    pub fn clear_variables(&mut self) {
        for layer in self.blocks.iter_mut().flat_map(|b| b.layers.iter_mut()) {
            for slot in layer.slots_mut() {
                if let Some(var) = slot.as_var_mut() {
                    var.clear();
                }
            }
        }
    }
}
