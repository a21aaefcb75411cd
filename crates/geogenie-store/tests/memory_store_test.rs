use geo::{point, polygon, Area, MultiPolygon};
use geogenie_core::error::ExecutionError;
use geogenie_core::models::{CrsCode, DistanceUnit, LayerId, OpName, ParamValue};
use geogenie_core::ports::{AlgorithmCall, CancelFlag, ExecutionBackend, LayerSource, ProgressReporter};
use geogenie_geo::{Feature, FeatureLayer};
use geogenie_store::MemoryLayerStore;
use std::collections::BTreeMap;
use std::io::Write;

fn call(op: OpName, algorithm_id: &'static str, params: Vec<(&'static str, ParamValue)>) -> AlgorithmCall {
    AlgorithmCall {
        op,
        algorithm_id,
        parameters: params.into_iter().collect::<BTreeMap<_, _>>(),
        output_name: format!("{}_out", op),
    }
}

fn layer(id: &str) -> ParamValue {
    ParamValue::Layer(LayerId::new(id))
}

fn store_with_wells() -> MemoryLayerStore {
    let store = MemoryLayerStore::new();
    store.insert_layer(
        LayerId::new("wells"),
        FeatureLayer::new(
            "wells",
            Some(CrsCode::web_mercator()),
            vec![
                Feature::with_geometry(point!(x: 0.0, y: 0.0)).with_property("id", 1),
                Feature::with_geometry(point!(x: 500.0, y: 0.0)).with_property("id", 2),
            ],
        ),
    );
    store
}

#[tokio::test]
async fn test_buffer_run_and_register() {
    let store = store_with_wells();
    let progress = ProgressReporter::new();
    let buffer = call(
        OpName::Buffer,
        "native:buffer",
        vec![
            ("INPUT", layer("wells")),
            ("DISTANCE", ParamValue::Number { value: 50.0, unit: Some(DistanceUnit::Meters) }),
            ("SEGMENTS", ParamValue::Number { value: 8.0, unit: None }),
            ("END_CAP_STYLE", ParamValue::Choice("round")),
        ],
    );

    let source = store.run_algorithm(&buffer, &progress, &CancelFlag::new()).await.unwrap();
    assert_eq!(source.feature_count, 2);
    assert_eq!(store.pending_outputs(), 1);

    let percents: Vec<u8> = progress.events().iter().map(|e| e.percent).collect();
    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    assert!(percents.windows(2).all(|w| w[0] < w[1]));

    let id = store.add_memory_layer("buffer_wells_1", source).await.unwrap();
    assert_eq!(store.pending_outputs(), 0);

    let catalog = store.catalog().await.unwrap();
    let output = catalog.get(id.as_str()).unwrap();
    assert_eq!(output.name, "buffer_wells_1");
    assert_eq!(output.crs, Some(CrsCode::web_mercator()));
    assert_eq!(output.feature_count, 2);
}

#[tokio::test]
async fn test_clip_transforms_overlay_crs() {
    let store = MemoryLayerStore::new();
    store.insert_layer(
        LayerId::new("buildings"),
        FeatureLayer::new(
            "buildings",
            Some(CrsCode::web_mercator()),
            vec![
                Feature::with_geometry(point!(x: 1000.0, y: 1000.0)),
                Feature::with_geometry(point!(x: 5_000_000.0, y: 1000.0)),
            ],
        ),
    );
    // roughly 0.1 degrees around the origin, in WGS 84
    store.insert_layer(
        LayerId::new("boundary"),
        FeatureLayer::new(
            "boundary",
            Some(CrsCode::wgs84()),
            vec![Feature::with_geometry(polygon![
                (x: -0.1, y: -0.1), (x: 0.1, y: -0.1), (x: 0.1, y: 0.1), (x: -0.1, y: 0.1)
            ])],
        ),
    );

    let clip = call(OpName::Clip, "native:clip", vec![("INPUT", layer("buildings")), ("OVERLAY", layer("boundary"))]);
    let source = store
        .run_algorithm(&clip, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(source.feature_count, 1);
}

#[tokio::test]
async fn test_dissolve_by_field() {
    let store = MemoryLayerStore::new();
    let square = |x: f64| polygon![(x: x, y: 0.0), (x: x + 2.0, y: 0.0), (x: x + 2.0, y: 2.0), (x: x, y: 2.0)];
    store.insert_layer(
        LayerId::new("parcels"),
        FeatureLayer::new(
            "parcels",
            None,
            vec![
                Feature::with_geometry(square(0.0)).with_property("zone", "R"),
                Feature::with_geometry(square(2.0)).with_property("zone", "R"),
            ],
        ),
    );

    let dissolve = call(
        OpName::Dissolve,
        "native:dissolve",
        vec![("INPUT", layer("parcels")), ("FIELD", ParamValue::Field("zone".to_string()))],
    );
    let source = store
        .run_algorithm(&dissolve, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(source.feature_count, 1);

    let id = store.add_memory_layer("dissolve_parcels_1", source).await.unwrap();
    let merged = store.get_layer(&id).unwrap();
    let area = MultiPolygon::try_from(merged.features[0].geometry.clone().unwrap())
        .unwrap()
        .unsigned_area();
    assert!((area - 8.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_reproject_sets_target_crs() {
    let store = MemoryLayerStore::new();
    store.insert_layer(
        LayerId::new("pois"),
        FeatureLayer::new("pois", Some(CrsCode::wgs84()), vec![Feature::with_geometry(point!(x: 10.0, y: 10.0))]),
    );

    let reproject = call(
        OpName::Reproject,
        "native:reprojectlayer",
        vec![("INPUT", layer("pois")), ("TARGET_CRS", ParamValue::Crs(CrsCode::web_mercator()))],
    );
    let source = store
        .run_algorithm(&reproject, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap();
    let id = store.add_memory_layer("reproject_pois_1", source).await.unwrap();
    assert_eq!(store.get_layer(&id).unwrap().crs, Some(CrsCode::web_mercator()));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let store = store_with_wells();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let buffer = call(
        OpName::Buffer,
        "native:buffer",
        vec![("INPUT", layer("wells")), ("DISTANCE", ParamValue::Number { value: 10.0, unit: None })],
    );
    let err = store.run_algorithm(&buffer, &ProgressReporter::new(), &cancel).await.unwrap_err();
    assert_eq!(err, ExecutionError::Cancelled);
    assert_eq!(store.pending_outputs(), 0);
}

#[tokio::test]
async fn test_algorithm_errors() {
    let store = store_with_wells();

    let missing = call(OpName::Buffer, "native:buffer", vec![("INPUT", layer("gone"))]);
    let err = store
        .run_algorithm(&missing, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::AlgorithmError { .. }));

    let unknown = call(OpName::Buffer, "native:voronoi", vec![("INPUT", layer("wells"))]);
    let err = store
        .run_algorithm(&unknown, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("native:voronoi"));
    assert_eq!(store.pending_outputs(), 0);
}

#[tokio::test]
async fn test_discard_output() {
    let store = store_with_wells();
    let buffer = call(
        OpName::Buffer,
        "native:buffer",
        vec![("INPUT", layer("wells")), ("DISTANCE", ParamValue::Number { value: 10.0, unit: None })],
    );
    let source = store
        .run_algorithm(&buffer, &ProgressReporter::new(), &CancelFlag::new())
        .await
        .unwrap();

    store.discard_output(source).await.unwrap();
    assert_eq!(store.pending_outputs(), 0);
    assert_eq!(store.layer_count(), 1);
}

#[tokio::test]
async fn test_load_geojson_file() {
    let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
    let content = serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [106.8, -6.2]}, "properties": {"name": "SD 1"}}
        ]
    });
    write!(file, "{}", content).unwrap();

    let store = MemoryLayerStore::new();
    let id = store.load_geojson(file.path()).unwrap();
    let catalog = store.catalog().await.unwrap();
    let descriptor = catalog.get(id.as_str()).unwrap();
    assert_eq!(descriptor.crs, Some(CrsCode::wgs84()));
    assert_eq!(descriptor.feature_count, 1);
}
