use serde::{Deserialize, Serialize};
use std::fmt;

use super::crs::CrsCode;

/// Unique identifier of a loaded layer, stable for the session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Geometry kind of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    /// Attribute-only table
    None,
}

impl GeometryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "polygon",
            GeometryKind::None => "none",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute field type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Boolean,
    Date,
    Other,
}

/// Attribute field of a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerField {
    pub name: String,
    pub field_type: FieldType,
}

impl LayerField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type }
    }
}

/// Immutable snapshot of one loaded layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Unique identifier
    pub id: LayerId,

    /// Display name
    pub name: String,

    /// Geometry kind
    pub geometry_kind: GeometryKind,

    /// CRS, `None` when the layer has no defined CRS
    pub crs: Option<CrsCode>,

    /// Attribute fields in declaration order
    pub fields: Vec<LayerField>,

    /// Number of features
    pub feature_count: usize,
}

impl LayerDescriptor {
    /// Look up a field by name, case-insensitively
    pub fn field(&self, name: &str) -> Option<&LayerField> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    pub fn is_spatial(&self) -> bool {
        self.geometry_kind != GeometryKind::None
    }
}

/// Point-in-time view of every loaded layer
///
/// Catalogs are never cached across pipeline stages: each stage takes a fresh
/// snapshot from the layer source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCatalog {
    layers: Vec<LayerDescriptor>,
}

impl LayerCatalog {
    pub fn new(layers: Vec<LayerDescriptor>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Find a layer by id
    pub fn get(&self, id: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.id.as_str() == id)
    }

    /// Find a layer by name: exact match first, then a unique case-insensitive match
    pub fn find_by_name(&self, name: &str) -> Option<&LayerDescriptor> {
        let name = name.trim();
        let exact: Vec<_> = self.layers.iter().filter(|l| l.name == name).collect();
        if exact.len() == 1 {
            return exact.first().copied();
        }
        if exact.len() > 1 {
            return None;
        }

        let mut folded = self.layers.iter().filter(|l| l.name.eq_ignore_ascii_case(name));
        match (folded.next(), folded.next()) {
            (Some(layer), None) => Some(layer),
            _ => None,
        }
    }

    /// Resolve a layer reference: id first, then name
    pub fn resolve(&self, reference: &str) -> Option<&LayerDescriptor> {
        self.get(reference).or_else(|| self.find_by_name(reference))
    }

    /// Whether any layer already uses `name`
    pub fn contains_name(&self, name: &str) -> bool {
        self.layers.iter().any(|l| l.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(id: &str, name: &str) -> LayerDescriptor {
        LayerDescriptor {
            id: LayerId::new(id),
            name: name.to_string(),
            geometry_kind: GeometryKind::Polygon,
            crs: Some(CrsCode::wgs84()),
            fields: vec![
                LayerField::new("NAME", FieldType::Text),
                LayerField::new("pop", FieldType::Integer),
            ],
            feature_count: 3,
        }
    }

    #[test]
    fn test_resolve_prefers_id() {
        let catalog = LayerCatalog::new(vec![layer("1", "2"), layer("2", "roads")]);
        assert_eq!(catalog.resolve("2").unwrap().name, "roads");
        assert_eq!(catalog.resolve("ROADS").unwrap().id, LayerId::new("2"));
        assert!(catalog.resolve("rivers").is_none());
    }

    #[test]
    fn test_ambiguous_names_do_not_resolve() {
        let catalog = LayerCatalog::new(vec![layer("a", "Parcels"), layer("b", "parcels")]);
        assert_eq!(catalog.find_by_name("Parcels").unwrap().id, LayerId::new("a"));
        assert!(catalog.find_by_name("PARCELS").is_none());
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let l = layer("1", "districts");
        assert_eq!(l.field("name").unwrap().name, "NAME");
        assert_eq!(l.field("pop").unwrap().field_type, FieldType::Integer);
        assert!(l.field("area").is_none());
    }
}
