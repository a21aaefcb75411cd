//! Property tests over prompt building, response decoding and validation

use geogenie_core::config::SessionConfig;
use geogenie_core::models::{
    CrsCode, FieldType, GeometryKind, LayerCatalog, LayerDescriptor, LayerField, LayerId, OpName, OperationRequest,
};
use geogenie_intent::{IntentResolver, ParameterValidator, PromptBuilder};
use proptest::prelude::*;
use serde_json::json;

fn catalog(names: &[String]) -> LayerCatalog {
    LayerCatalog::new(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| LayerDescriptor {
                id: LayerId::new((i + 1).to_string()),
                name: name.clone(),
                geometry_kind: if i % 2 == 0 { GeometryKind::Polygon } else { GeometryKind::Point },
                crs: Some(if i % 3 == 0 { CrsCode::wgs84() } else { CrsCode::web_mercator() }),
                fields: vec![LayerField::new("zone", FieldType::Text)],
                feature_count: i * 7,
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn prop_prompt_is_deterministic(
        text in "[a-z ]{0,40}",
        names in prop::collection::vec("[a-z_]{1,12}", 0..8),
    ) {
        let config = SessionConfig::default();
        let first = PromptBuilder::build(&text, &catalog(&names), &config);
        let second = PromptBuilder::build(&text, &catalog(&names), &config);
        prop_assert_eq!(first.render(), second.render());
        prop_assert_eq!(&first.user, &text);
    }

    #[test]
    fn prop_resolver_only_yields_registered_operations(name in "[a-zA-Z_:]{1,20}") {
        let answer = json!({"operation": name, "parameters": {}}).to_string();
        match IntentResolver::parse_response(&answer) {
            Ok(request) => prop_assert!(OpName::ALL.contains(&request.op)),
            Err(_) => prop_assert!(OpName::parse(&name).is_none()),
        }
    }

    #[test]
    fn prop_resolver_never_panics_on_noise(text in ".{0,200}") {
        let _ = IntentResolver::parse_response(&text);
    }

    #[test]
    fn prop_buffer_validation_is_idempotent(distance in 0.5f64..5_000.0, km in any::<bool>()) {
        let names = vec!["parks".to_string(), "wells".to_string()];
        let catalog = catalog(&names);
        let value = if km { json!(format!("{} km", distance / 1000.0)) } else { json!(distance) };
        let request = OperationRequest::new(OpName::Buffer).with_param("input", "wells").with_param("distance", value);

        let first = ParameterValidator::validate(&request, &catalog, &|_| true);
        let second = ParameterValidator::validate(&request, &catalog, &|_| true);
        prop_assert_eq!(first, second);
    }
}
