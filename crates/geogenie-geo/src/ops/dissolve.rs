use geo::{BooleanOps, Geometry, MultiLineString, MultiPoint, MultiPolygon, Point};
use geogenie_core::error::ExecutionError;
use geogenie_core::models::GeometryKind;
use serde_json::{Map, Value};

use super::overlay::{as_multi_line, as_multi_polygon};
use super::Step;
use crate::models::{geometry_kind_of, Feature, FeatureLayer};

struct Group {
    key: Value,
    properties: Map<String, Value>,
    geometries: Vec<Geometry<f64>>,
}

/// Merge features into one per distinct value of `field`, or one overall
///
/// Each output feature keeps the attributes of the first feature in its group.
pub fn dissolve(layer: &FeatureLayer, field: Option<&str>, step: Step<'_>) -> Result<Vec<Feature>, ExecutionError> {
    let kind = layer.geometry_kind();
    let total = layer.features.len();
    let mut groups: Vec<Group> = Vec::new();

    for (idx, feature) in layer.features.iter().enumerate() {
        let key = match field {
            Some(name) => feature.properties.get(name).cloned().unwrap_or(Value::Null),
            None => Value::Null,
        };

        let group = match groups.iter().position(|g| g.key == key) {
            Some(pos) => &mut groups[pos],
            None => {
                groups.push(Group { key, properties: feature.properties.clone(), geometries: Vec::new() });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        if let Some(geometry) = &feature.geometry {
            group.geometries.push(geometry.clone());
        }

        step(idx + 1, total)?;
    }

    Ok(groups
        .into_iter()
        .map(|group| Feature::new(merge(kind, &group.geometries), group.properties))
        .collect())
}

fn merge(kind: GeometryKind, geometries: &[Geometry<f64>]) -> Option<Geometry<f64>> {
    let same_kind = geometries.iter().filter(|g| geometry_kind_of(g) == kind);

    match kind {
        GeometryKind::Polygon => {
            let merged = same_kind
                .filter_map(as_multi_polygon)
                .fold(MultiPolygon::new(vec![]), |acc, mp| acc.union(&mp));
            (!merged.0.is_empty()).then(|| Geometry::MultiPolygon(merged))
        }
        GeometryKind::Line => {
            let lines: Vec<_> = same_kind.filter_map(as_multi_line).flat_map(|mls| mls.0).collect();
            (!lines.is_empty()).then(|| Geometry::MultiLineString(MultiLineString::new(lines)))
        }
        GeometryKind::Point => {
            let points: Vec<Point<f64>> = same_kind
                .flat_map(|g| match g {
                    Geometry::Point(p) => vec![*p],
                    Geometry::MultiPoint(mp) => mp.0.clone(),
                    _ => Vec::new(),
                })
                .collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(points)))
        }
        GeometryKind::None => None,
    }
}
