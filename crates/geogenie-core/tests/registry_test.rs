//! Registry contract tests

use geogenie_core::models::{OpName, ParamDefault, ParamKind};
use geogenie_core::AlgorithmRegistry;
use proptest::prelude::*;

#[test]
fn test_every_operation_has_required_parameters() {
    for op in OpName::ALL {
        let spec = AlgorithmRegistry::lookup(op.as_str()).unwrap();
        let required: Vec<_> = spec.required_params().map(|p| p.name).collect();
        assert!(!required.is_empty(), "{} has no required parameters", op);
        assert_eq!(required[0], "input");

        // stable across lookups
        let again: Vec<_> = AlgorithmRegistry::lookup(op.as_str()).unwrap().required_params().map(|p| p.name).collect();
        assert_eq!(required, again);
    }
}

#[test]
fn test_required_sets() {
    let required = |name: &str| -> Vec<&str> {
        AlgorithmRegistry::lookup(name).unwrap().required_params().map(|p| p.name).collect()
    };

    assert_eq!(required("buffer"), vec!["input", "distance"]);
    assert_eq!(required("clip"), vec!["input", "overlay"]);
    assert_eq!(required("reproject"), vec!["input", "target_crs"]);
    assert_eq!(required("dissolve"), vec!["input"]);
    assert_eq!(required("intersect"), vec!["input", "overlay"]);
}

#[test]
fn test_buffer_schema() {
    let buffer = AlgorithmRegistry::spec(OpName::Buffer);
    assert_eq!(buffer.backend_id, "native:buffer");

    let distance = buffer.param("distance").unwrap();
    assert_eq!(distance.kind, ParamKind::Numeric);
    assert!(distance.range.unwrap().contains(1_000_000.0));
    assert!(!distance.range.unwrap().contains(0.0));

    let segments = buffer.param("segments").unwrap();
    assert!(segments.whole);
    assert_eq!(segments.default, Some(ParamDefault::Number(5.0)));

    let end_cap = buffer.param("end_cap_style").unwrap();
    assert_eq!(end_cap.options, &["round", "flat", "square"]);
    assert_eq!(end_cap.default, Some(ParamDefault::Text("round")));
}

#[test]
fn test_dissolve_field_belongs_to_input() {
    let field = AlgorithmRegistry::spec(OpName::Dissolve).param("field").unwrap();
    assert_eq!(field.kind, ParamKind::FieldRef);
    assert_eq!(field.layer_param, Some("input"));
    assert!(!field.required);
}

#[test]
fn test_alias_canonicalization() {
    let buffer = AlgorithmRegistry::spec(OpName::Buffer);
    assert_eq!(buffer.canonical_param_name("input_layer"), Some("input"));
    assert_eq!(buffer.canonical_param_name("buffer_distance"), Some("distance"));
    assert_eq!(buffer.canonical_param_name("DISTANCE"), Some("distance"));
    assert_eq!(buffer.canonical_param_name("overlay"), None);

    let reproject = AlgorithmRegistry::spec(OpName::Reproject);
    assert_eq!(reproject.canonical_param_name("crs"), Some("target_crs"));
}

proptest! {
    #[test]
    fn prop_unknown_names_fail(name in "[a-z]{1,12}") {
        let known = ["buffer", "clip", "reproject", "dissolve", "intersect", "intersection"];
        prop_assume!(!known.contains(&name.as_str()));
        prop_assert!(AlgorithmRegistry::lookup(&name).is_err());
    }
}
