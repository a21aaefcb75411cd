//! GeoJSON reading and writing
//!
//! A `crs` foreign member (the pre-RFC 7946 convention) is honoured when present.
//! Without one the layer is WGS 84; `"crs": null` or an unrecognizable value
//! leaves the layer without a defined CRS.

use geo::Geometry;
use geogenie_core::error::{GeogenieError, Result};
use geogenie_core::models::CrsCode;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

use crate::models::{Feature, FeatureLayer};

/// Read a GeoJSON file as a layer named after the file stem
pub fn read_layer(path: &Path) -> Result<FeatureLayer> {
    let content = fs::read_to_string(path)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string();

    let layer = parse_layer(name, &content)?;
    tracing::debug!(
        "Read {} features from {} ({})",
        layer.features.len(),
        path.display(),
        layer.crs.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "no CRS".to_string())
    );
    Ok(layer)
}

/// Parse GeoJSON text into a layer
pub fn parse_layer(name: impl Into<String>, content: &str) -> Result<FeatureLayer> {
    let geojson: GeoJson = content.parse().map_err(|e| GeogenieError::FormatValidation {
        format: "GeoJSON".to_string(),
        reason: format!("Failed to parse GeoJSON: {}", e),
    })?;

    let (features, crs) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = match fc.foreign_members.as_ref().and_then(|fm| fm.get("crs")) {
                None => Some(CrsCode::wgs84()),
                Some(crs_obj) => extract_crs(crs_obj),
            };
            let features = fc
                .features
                .into_iter()
                .map(convert_feature)
                .collect::<Result<Vec<_>>>()?;
            (features, crs)
        }
        GeoJson::Feature(feature) => (vec![convert_feature(feature)?], Some(CrsCode::wgs84())),
        GeoJson::Geometry(geometry) => {
            let geometry = convert_geometry(geometry)?;
            (vec![Feature::new(Some(geometry), Map::new())], Some(CrsCode::wgs84()))
        }
    };

    Ok(FeatureLayer::new(name, crs, features))
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature.geometry.map(convert_geometry).transpose()?;
    Ok(Feature::new(geometry, feature.properties.unwrap_or_default()))
}

fn convert_geometry(geometry: geojson::Geometry) -> Result<Geometry<f64>> {
    Geometry::<f64>::try_from(geometry).map_err(|e| GeogenieError::FormatValidation {
        format: "GeoJSON".to_string(),
        reason: format!("Unsupported geometry: {}", e),
    })
}

/// Extract a CRS from a GeoJSON `crs` object
fn extract_crs(crs: &Value) -> Option<CrsCode> {
    // Parse "EPSG:4326" or "urn:ogc:def:crs:EPSG::4326"
    crs.get("properties")
        .and_then(|props| props.get("name"))
        .and_then(Value::as_str)
        .and_then(|name| {
            if name.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84") {
                Some(CrsCode::wgs84())
            } else {
                CrsCode::parse(name)
            }
        })
}

/// Serialize a layer as a GeoJSON FeatureCollection
pub fn to_geojson(layer: &FeatureLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .map(|feature| geojson::Feature {
            bbox: None,
            geometry: feature.geometry.as_ref().map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: None,
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let mut foreign_members = JsonObject::new();
    foreign_members.insert("name".to_string(), Value::String(layer.name.clone()));
    match &layer.crs {
        Some(crs) if *crs != CrsCode::wgs84() => {
            foreign_members.insert(
                "crs".to_string(),
                json!({"type": "name", "properties": {"name": crs.to_string()}}),
            );
        }
        Some(_) => {}
        None => {
            foreign_members.insert("crs".to_string(), Value::Null);
        }
    }

    FeatureCollection { bbox: None, features, foreign_members: Some(foreign_members) }
}

pub fn to_geojson_string(layer: &FeatureLayer) -> Result<String> {
    serde_json::to_string_pretty(&to_geojson(layer)).map_err(|e| GeogenieError::Serialization(e.to_string()))
}

/// Write a layer to a GeoJSON file
pub fn write_layer(path: &Path, layer: &FeatureLayer) -> Result<()> {
    fs::write(path, to_geojson_string(layer)?)?;
    tracing::info!("Wrote {} features to {}", layer.features.len(), path.display());
    Ok(())
}
