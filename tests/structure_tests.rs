use num_complex::Complex64;
use serde_json::json;

use tmstack::builder::{build_mutable_structure, build_structure, BuildContext};
use tmstack::layer::Layer;
use tmstack::matrix::TransferMatrix;
use tmstack::optics::OpticalParams;

#[test]
fn flattening_preserves_order_and_drops_empty_blocks() {
    let description = json!([
        {"repeat": 2},
        {"material": "custom", "d": 1, "eps": 1.0},
        {"material": "custom", "d": 2, "eps": 2.0},
        {"repeat": 0},
        {"material": "custom", "d": 99, "eps": 9.0},
        {"repeat": 1},
        {"material": "gan", "d": 3}
    ]);
    let structure = build_structure(&description, &BuildContext::default()).unwrap();
    let flat = structure.flatten();
    assert_eq!(flat.blocks.len(), 1);
    assert_eq!(flat.blocks[0].repeat, 1);

    let thicknesses: Vec<f64> = flat.layers().map(|l| l.thickness().unwrap()).collect();
    assert_eq!(thicknesses, vec![1.0, 2.0, 1.0, 2.0, 3.0]);
    assert_eq!(flat.flatten(), flat);
}

#[test]
fn effective_medium_without_particles_equals_host() {
    let description = json!([{
        "type": "eff_medium", "d": 10, "f": 0,
        "medium": {"material": "custom", "eps": [12.25, 0.5]},
        "particles": {"material": "custom", "eps": [-20.0, 1.5]}
    }]);
    let structure = build_structure(&description, &BuildContext::default()).unwrap();
    let layer = structure.first_layer().unwrap();
    for wl in [400.0, 650.0, 900.0] {
        assert_eq!(layer.permittivity(wl, 300.0).unwrap(), Complex64::new(12.25, 0.5));
    }
}

#[test]
fn mutable_structure_needs_exactly_one_variable() {
    let ctx = BuildContext::default();
    let none = json!([{"material": "gan", "d": 5}]);
    let err = build_mutable_structure(&none, &ctx)
        .unwrap()
        .flatten()
        .validate_single_variable()
        .unwrap_err();
    assert_eq!(err.header(), "Non-variable structure");

    let two = json!([
        {"material": "gan", "d": {"var": true, "mean": 5, "deviation": 1}},
        {"material": "algan", "d": 5, "cal": {"var": true, "start": 0.1, "end": 0.2, "step": 0.05}}
    ]);
    let err = build_mutable_structure(&two, &ctx)
        .unwrap()
        .flatten()
        .validate_single_variable()
        .unwrap_err();
    assert_eq!(err.header(), "Incorrect number of variable parameters");

    let repeated = json!([
        {"repeat": 3},
        {"material": "gan", "d": {"var": true, "mean": 5, "deviation": 1}}
    ]);
    let flat = build_mutable_structure(&repeated, &ctx).unwrap().flatten();
    assert_eq!(flat.variable_slots().len(), 3);
    assert!(flat.validate_single_variable().is_err());
}

#[test]
fn fixed_structure_rejects_variables() {
    let description = json!([{"material": "gan", "d": {"var": true, "mean": 5, "deviation": 1}}]);
    let err = build_structure(&description, &BuildContext::default()).unwrap_err();
    assert_eq!(err.header(), "Unexpected variable parameter");
}

#[test]
fn deep_copies_are_independent() {
    let description = json!([
        {"material": "custom", "d": {"var": true, "mean": 50, "deviation": 2}, "eps": 4.0}
    ]);
    let original = build_mutable_structure(&description, &BuildContext::default())
        .unwrap()
        .flatten();
    let mut copy = original.deep_copy();
    copy.variable_slot_mut().unwrap().set(51.0).unwrap();

    assert_eq!(copy.first_layer().unwrap().thickness().unwrap(), 51.0);
    assert!(original.first_layer().unwrap().thickness().is_err());
}

#[test]
fn stack_matrix_composes_in_traversal_order() {
    let description = json!([
        {"type": "spheres_lattice", "d": 20, "lattice_factor": 3,
         "medium": {"material": "custom", "eps": 2.25},
         "particles": {"material": "custom", "eps": [-15.0, 1.0]}},
        {"material": "custom", "d": 80, "eps": 6.0}
    ]);
    let structure = build_structure(&description, &BuildContext::default()).unwrap();
    let params = OpticalParams::default();
    let matrices: Vec<TransferMatrix> = structure
        .layers()
        .map(|l: &Layer<f64>| l.matrix(600.0, &params).unwrap())
        .collect();

    let composed = TransferMatrix::compose(matrices.clone());
    let forward = matrices[1] * matrices[0];
    let backward = matrices[0] * matrices[1];
    assert!((composed.0 - forward.0).norm() < 1e-12);
    assert!((composed.0 - backward.0).norm() > 1e-6);
}
