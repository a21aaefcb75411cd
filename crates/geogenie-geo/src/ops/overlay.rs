//! Clip and intersection against a polygon overlay

use geo::{BooleanOps, Geometry, Intersects, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use geogenie_core::error::ExecutionError;
use serde_json::{Map, Value};

use super::Step;
use crate::models::{Feature, FeatureLayer};

/// Polygonal part of a geometry, if any
pub(crate) fn as_multi_polygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<Polygon<f64>> =
                gc.iter().filter_map(as_multi_polygon).flat_map(|mp| mp.0).collect();
            (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
        }
        _ => None,
    }
}

pub(crate) fn as_multi_line(geometry: &Geometry<f64>) -> Option<MultiLineString<f64>> {
    match geometry {
        Geometry::Line(l) => Some(MultiLineString::new(vec![LineString::from(vec![l.start, l.end])])),
        Geometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => Some(mls.clone()),
        _ => None,
    }
}

/// Part of `geometry` inside `mask`, or `None` when nothing remains
fn overlay_geometry(geometry: &Geometry<f64>, mask: &MultiPolygon<f64>) -> Option<Geometry<f64>> {
    if !geometry.intersects(mask) {
        return None;
    }

    match geometry {
        Geometry::Point(p) => Some(Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => {
            let inside: Vec<_> = mp.iter().filter(|p| mask.intersects(*p)).copied().collect();
            (!inside.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(inside)))
        }
        other => {
            if let Some(lines) = as_multi_line(other) {
                let clipped = mask.clip(&lines, false);
                return (!clipped.0.is_empty()).then(|| Geometry::MultiLineString(clipped));
            }
            let polygons = as_multi_polygon(other)?;
            let clipped = polygons.intersection(mask);
            (!clipped.0.is_empty()).then(|| Geometry::MultiPolygon(clipped))
        }
    }
}

fn overlay_polygons(overlay: &FeatureLayer) -> Vec<(MultiPolygon<f64>, &Map<String, Value>)> {
    overlay
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref().and_then(as_multi_polygon).map(|mp| (mp, &f.properties)))
        .collect()
}

/// Cut `input` to the area covered by `overlay`, keeping input attributes
///
/// Both layers must already be in the same CRS.
pub fn clip(input: &FeatureLayer, overlay: &FeatureLayer, step: Step<'_>) -> Result<Vec<Feature>, ExecutionError> {
    let mask = overlay_polygons(overlay)
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, (mp, _)| acc.union(&mp));

    let total = input.features.len();
    let mut output = Vec::new();
    for (idx, feature) in input.features.iter().enumerate() {
        if let Some(clipped) = feature.geometry.as_ref().and_then(|g| overlay_geometry(g, &mask)) {
            output.push(Feature::new(Some(clipped), feature.properties.clone()));
        }
        step(idx + 1, total)?;
    }

    Ok(output)
}

/// Pairwise intersection of `input` with each overlay polygon, merging attributes
///
/// Overlay attributes whose names collide with input attributes get a `_2` suffix.
pub fn intersect(
    input: &FeatureLayer,
    overlay: &FeatureLayer,
    step: Step<'_>,
) -> Result<Vec<Feature>, ExecutionError> {
    let polygons = overlay_polygons(overlay);

    let total = input.features.len();
    let mut output = Vec::new();
    for (idx, feature) in input.features.iter().enumerate() {
        if let Some(geometry) = &feature.geometry {
            for (mask, overlay_properties) in &polygons {
                if let Some(part) = overlay_geometry(geometry, mask) {
                    let properties = merge_properties(&feature.properties, overlay_properties);
                    output.push(Feature::new(Some(part), properties));
                }
            }
        }
        step(idx + 1, total)?;
    }

    Ok(output)
}

fn merge_properties(input: &Map<String, Value>, overlay: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = input.clone();
    for (name, value) in overlay {
        let key = if merged.contains_key(name) { format!("{}_2", name) } else { name.clone() };
        merged.insert(key, value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::no_step;
    use geo::{line_string, point, polygon, Area};
    use geogenie_core::models::CrsCode;

    fn square(min: f64, max: f64) -> Polygon<f64> {
        polygon![(x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max)]
    }

    fn boundary() -> FeatureLayer {
        FeatureLayer::new(
            "boundary",
            Some(CrsCode::web_mercator()),
            vec![Feature::with_geometry(square(0.0, 10.0)).with_property("name", "district")],
        )
    }

    #[test]
    fn test_clip_polygons() {
        let input = FeatureLayer::new(
            "buildings",
            Some(CrsCode::web_mercator()),
            vec![
                Feature::with_geometry(square(5.0, 15.0)).with_property("name", "hall"),
                Feature::with_geometry(square(20.0, 30.0)).with_property("name", "outside"),
            ],
        );

        let output = clip(&input, &boundary(), &no_step).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].properties["name"], "hall");

        let mp = MultiPolygon::try_from(output[0].geometry.clone().unwrap()).unwrap();
        assert!((mp.unsigned_area() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_lines_and_points() {
        let input = FeatureLayer::new(
            "mixed",
            None,
            vec![
                Feature::with_geometry(line_string![(x: -5.0, y: 5.0), (x: 15.0, y: 5.0)]),
                Feature::with_geometry(point!(x: 2.0, y: 2.0)),
                Feature::with_geometry(point!(x: 12.0, y: 2.0)),
            ],
        );

        let output = clip(&input, &boundary(), &no_step).unwrap();
        assert_eq!(output.len(), 2);

        let line = MultiLineString::try_from(output[0].geometry.clone().unwrap()).unwrap();
        let length: f64 = line.iter().flat_map(|ls| ls.lines()).map(|l| l.dx().hypot(l.dy())).sum();
        assert!((length - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_intersect_merges_attributes() {
        let input = FeatureLayer::new(
            "parcels",
            None,
            vec![Feature::with_geometry(square(8.0, 12.0)).with_property("name", "lot 4")],
        );
        let overlay = FeatureLayer::new(
            "zones",
            None,
            vec![
                Feature::with_geometry(square(0.0, 10.0)).with_property("name", "A"),
                Feature::with_geometry(square(10.0, 20.0)).with_property("name", "B"),
                Feature::with_geometry(square(50.0, 60.0)).with_property("name", "C"),
            ],
        );

        let output = intersect(&input, &overlay, &no_step).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].properties["name"], "lot 4");
        assert_eq!(output[0].properties["name_2"], "A");
        assert_eq!(output[1].properties["name_2"], "B");
    }

    #[test]
    fn test_empty_overlay_yields_nothing() {
        let input = FeatureLayer::new("buildings", None, vec![Feature::with_geometry(square(0.0, 1.0))]);
        let overlay = FeatureLayer::new("empty", None, vec![]);
        assert!(clip(&input, &overlay, &no_step).unwrap().is_empty());
    }
}
