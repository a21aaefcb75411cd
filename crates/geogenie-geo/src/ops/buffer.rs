use geo::algorithm::buffer::{Buffer, BufferStyle, LineCap, LineJoin};
use geo::{Centroid, Geometry};
use geogenie_core::error::ExecutionError;
use geogenie_core::models::CrsCode;

use super::Step;
use crate::models::{Feature, FeatureLayer};
use crate::transform::Transformer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndCapStyle {
    #[default]
    Round,
    Flat,
    Square,
}

impl EndCapStyle {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "round" => Some(EndCapStyle::Round),
            "flat" => Some(EndCapStyle::Flat),
            "square" => Some(EndCapStyle::Square),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinStyle {
    #[default]
    Round,
    Miter,
    Bevel,
}

impl JoinStyle {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "round" => Some(JoinStyle::Round),
            "miter" => Some(JoinStyle::Miter),
            "bevel" => Some(JoinStyle::Bevel),
            _ => None,
        }
    }
}

/// Buffer parameters; `distance` is in meters for projected or WGS 84 layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferOptions {
    pub distance: f64,
    /// Segments per quarter circle
    pub segments: u32,
    pub end_cap: EndCapStyle,
    pub join: JoinStyle,
    pub miter_limit: f64,
}

impl BufferOptions {
    pub fn new(distance: f64) -> Self {
        Self { distance, segments: 5, end_cap: EndCapStyle::Round, join: JoinStyle::Round, miter_limit: 2.0 }
    }

    fn style(&self, distance: f64) -> BufferStyle<f64> {
        let arc_step = std::f64::consts::FRAC_PI_2 / self.segments.max(1) as f64;
        let join = match self.join {
            JoinStyle::Round => LineJoin::Round(arc_step),
            JoinStyle::Miter => LineJoin::Miter(self.miter_limit),
            JoinStyle::Bevel => LineJoin::Bevel,
        };
        let cap = match self.end_cap {
            EndCapStyle::Round => LineCap::Round(arc_step),
            EndCapStyle::Flat => LineCap::Butt,
            EndCapStyle::Square => LineCap::Square,
        };
        BufferStyle::new(distance).line_join(join).line_cap(cap)
    }
}

/// Buffer every feature of `layer`
///
/// WGS 84 layers are buffered in Web Mercator with the distance scaled by the
/// feature's latitude, so a meter distance stays roughly a meter on the ground.
/// Other layers are buffered in their native units.
pub fn buffer(layer: &FeatureLayer, options: &BufferOptions, step: Step<'_>) -> Result<Vec<Feature>, ExecutionError> {
    if !(options.distance.is_finite() && options.distance > 0.0) {
        return Err(ExecutionError::algorithm(format!("invalid buffer distance {}", options.distance)));
    }

    // Geographic layers round-trip through Web Mercator
    let via_mercator = match layer.crs.as_ref().filter(|crs| crs.is_geographic()) {
        Some(crs) => {
            let mercator = CrsCode::web_mercator();
            Some((Transformer::new(crs, &mercator)?, Transformer::new(&mercator, crs)?))
        }
        None => None,
    };

    let total = layer.features.len();
    let mut output = Vec::with_capacity(total);
    for (idx, feature) in layer.features.iter().enumerate() {
        let geometry = match (&feature.geometry, &via_mercator) {
            (None, _) => None,
            (Some(geometry), Some((forward, inverse))) => {
                let latitude = geometry.centroid().map(|c| c.y()).unwrap_or(0.0);
                let scale = latitude.to_radians().cos().max(0.01);
                let projected = forward.transform(geometry)?;
                let buffered: Geometry<f64> = projected.buffer_with_style(options.style(options.distance / scale)).into();
                Some(inverse.transform(&buffered)?)
            }
            (Some(geometry), None) => Some(geometry.buffer_with_style(options.style(options.distance)).into()),
        };
        output.push(Feature::new(geometry, feature.properties.clone()));
        step(idx + 1, total)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::no_step;
    use geo::{line_string, point, Area, Contains, MultiPolygon};

    fn polygon_of(feature: &Feature) -> MultiPolygon<f64> {
        MultiPolygon::try_from(feature.geometry.clone().unwrap()).unwrap()
    }

    #[test]
    fn test_point_buffer_in_projected_crs() {
        let layer = FeatureLayer::new(
            "wells",
            Some(CrsCode::web_mercator()),
            vec![Feature::with_geometry(point!(x: 1000.0, y: 1000.0)).with_property("id", 7)],
        );

        let output = buffer(&layer, &BufferOptions::new(100.0), &no_step).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].properties["id"], 7);

        let area = polygon_of(&output[0]).unsigned_area();
        let circle = std::f64::consts::PI * 100.0 * 100.0;
        assert!(area > circle * 0.9 && area <= circle * 1.01, "area {}", area);
    }

    #[test]
    fn test_wgs84_buffer_covers_meters_not_degrees() {
        let layer = FeatureLayer::new(
            "schools",
            Some(CrsCode::wgs84()),
            vec![Feature::with_geometry(point!(x: 106.8, y: -6.2))],
        );

        let output = buffer(&layer, &BufferOptions::new(100.0), &no_step).unwrap();
        let zone = polygon_of(&output[0]);

        // ~100 m is ~0.0009 degrees; the zone must contain a point 50 m away but not one 1 km away
        assert!(zone.contains(&point!(x: 106.8 + 0.00045, y: -6.2)));
        assert!(!zone.contains(&point!(x: 106.8 + 0.009, y: -6.2)));
    }

    #[test]
    fn test_line_buffer_with_flat_caps() {
        let layer = FeatureLayer::new(
            "roads",
            None,
            vec![Feature::with_geometry(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)])],
        );
        let options = BufferOptions { end_cap: EndCapStyle::Flat, ..BufferOptions::new(1.0) };

        let output = buffer(&layer, &options, &no_step).unwrap();
        let area = polygon_of(&output[0]).unsigned_area();
        assert!((area - 20.0).abs() < 0.5, "area {}", area);
    }

    #[test]
    fn test_line_buffer_with_round_caps() {
        let layer = FeatureLayer::new(
            "roads",
            None,
            vec![Feature::with_geometry(line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)])],
        );
        let options = BufferOptions { segments: 16, ..BufferOptions::new(1.0) };

        let output = buffer(&layer, &options, &no_step).unwrap();
        let area = polygon_of(&output[0]).unsigned_area();
        let expected = 20.0 + std::f64::consts::PI;
        assert!((area - expected).abs() < 0.1, "area {}", area);
        assert!(polygon_of(&output[0]).contains(&point!(x: -0.9, y: 0.0)));
    }

    #[test]
    fn test_features_without_geometry_pass_through() {
        let layer = FeatureLayer::new("table", None, vec![Feature::new(None, Default::default())]);
        let output = buffer(&layer, &BufferOptions::new(5.0), &no_step).unwrap();
        assert!(output[0].geometry.is_none());
    }

    #[test]
    fn test_style_names() {
        assert_eq!(EndCapStyle::parse("FLAT"), Some(EndCapStyle::Flat));
        assert_eq!(JoinStyle::parse("bevel"), Some(JoinStyle::Bevel));
        assert_eq!(JoinStyle::parse("sharp"), None);
    }
}
