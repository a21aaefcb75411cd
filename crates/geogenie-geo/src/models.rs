//! Feature and layer models for geogenie-geo.

use geo::Geometry;
use geogenie_core::models::{CrsCode, FieldType, GeometryKind, LayerField};
use serde_json::{Map, Value};

/// One feature: optional geometry plus attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>, properties: Map<String, Value>) -> Self {
        Self { geometry, properties }
    }

    pub fn with_geometry(geometry: impl Into<Geometry<f64>>) -> Self {
        Self { geometry: Some(geometry.into()), properties: Map::new() }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Named collection of features in one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub name: String,
    pub crs: Option<CrsCode>,
    pub features: Vec<Feature>,
}

impl FeatureLayer {
    pub fn new(name: impl Into<String>, crs: Option<CrsCode>, features: Vec<Feature>) -> Self {
        Self { name: name.into(), crs, features }
    }

    /// Geometry kind of the first feature that has a geometry
    pub fn geometry_kind(&self) -> GeometryKind {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(geometry_kind_of)
            .find(|kind| *kind != GeometryKind::None)
            .unwrap_or(GeometryKind::None)
    }

    /// Attribute fields in first-seen order, typed from the first non-null value
    pub fn fields(&self) -> Vec<LayerField> {
        let mut fields: Vec<LayerField> = Vec::new();
        let mut resolved: Vec<bool> = Vec::new();

        for feature in &self.features {
            for (name, value) in &feature.properties {
                let field_type = field_type_of(value);
                match fields.iter().position(|f| &f.name == name) {
                    Some(idx) if !resolved[idx] && !value.is_null() => {
                        fields[idx].field_type = field_type;
                        resolved[idx] = true;
                    }
                    Some(_) => {}
                    None => {
                        fields.push(LayerField::new(name.clone(), field_type));
                        resolved.push(!value.is_null());
                    }
                }
            }
        }

        fields
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub fn geometry_kind_of(geometry: &Geometry<f64>) -> GeometryKind {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryKind::Point,
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => GeometryKind::Line,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
            GeometryKind::Polygon
        }
        Geometry::GeometryCollection(collection) => collection
            .iter()
            .map(geometry_kind_of)
            .find(|kind| *kind != GeometryKind::None)
            .unwrap_or(GeometryKind::None),
    }
}

fn field_type_of(value: &Value) -> FieldType {
    match value {
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
        Value::Number(_) => FieldType::Real,
        Value::String(_) => FieldType::Text,
        Value::Null | Value::Array(_) | Value::Object(_) => FieldType::Other,
    }
}
