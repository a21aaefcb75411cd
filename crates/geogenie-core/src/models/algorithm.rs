use serde::{Deserialize, Serialize};
use std::fmt;

use super::units::DistanceUnit;

/// The supported operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpName {
    Buffer,
    Clip,
    Reproject,
    Dissolve,
    Intersect,
}

impl OpName {
    pub const ALL: [OpName; 5] =
        [OpName::Buffer, OpName::Clip, OpName::Reproject, OpName::Dissolve, OpName::Intersect];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpName::Buffer => "buffer",
            OpName::Clip => "clip",
            OpName::Reproject => "reproject",
            OpName::Dissolve => "dissolve",
            OpName::Intersect => "intersect",
        }
    }

    /// Parse an operation name, case-insensitively. `intersection` is accepted for `intersect`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "buffer" => Some(OpName::Buffer),
            "clip" => Some(OpName::Clip),
            "reproject" => Some(OpName::Reproject),
            "dissolve" => Some(OpName::Dissolve),
            "intersect" | "intersection" => Some(OpName::Intersect),
            _ => None,
        }
    }

    /// Operations that combine an input layer with an overlay layer
    pub fn is_multi_layer(&self) -> bool {
        matches!(self, OpName::Clip | OpName::Intersect)
    }
}

impl fmt::Display for OpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of value a parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKind {
    /// Id of a loaded layer
    LayerRef,
    Numeric,
    /// Authority-qualified CRS code
    CrsCode,
    /// Attribute field of another layer parameter
    FieldRef,
    Enum,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::LayerRef => "layer reference",
            ParamKind::Numeric => "number",
            ParamKind::CrsCode => "CRS code",
            ParamKind::FieldRef => "field name",
            ParamKind::Enum => "option",
        };
        f.write_str(name)
    }
}

/// Closed or half-open numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "is_false")]
    pub min_exclusive: bool,
}

impl NumericRange {
    pub const fn inclusive(min: f64, max: f64) -> Self {
        Self { min, max, min_exclusive: false }
    }

    /// `(min, max]`
    pub const fn above(min: f64, max: f64) -> Self {
        Self { min, max, min_exclusive: true }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = if self.min_exclusive { value > self.min } else { value >= self.min };
        above_min && value <= self.max
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.min_exclusive { '(' } else { '[' };
        write!(f, "{}{}, {}]", open, self.min, self.max)
    }
}

/// Default value of an optional parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamDefault {
    Number(f64),
    Text(&'static str),
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Number(n) => write!(f, "{}", n),
            ParamDefault::Text(s) => f.write_str(s),
        }
    }
}

/// Schema of one operation parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,

    /// Canonical unit of numeric values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<DistanceUnit>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<NumericRange>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamDefault>,

    /// Allowed values of an enum parameter
    #[serde(skip_serializing_if = "is_empty_list")]
    pub options: &'static [&'static str],

    /// Other names the model may use for this parameter
    #[serde(skip)]
    pub aliases: &'static [&'static str],

    /// Numeric value must be an integer
    #[serde(skip_serializing_if = "is_false")]
    pub whole: bool,

    /// For a fieldRef: the layerRef parameter whose layer owns the field
    #[serde(rename = "fieldOf", skip_serializing_if = "Option::is_none")]
    pub layer_param: Option<&'static str>,

    /// Parameter key understood by the execution backend
    #[serde(skip)]
    pub backend_key: &'static str,
}

impl ParamSpec {
    /// Optional parameter with no unit, range, default or options
    pub const fn new(
        name: &'static str,
        kind: ParamKind,
        backend_key: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
            unit: None,
            range: None,
            default: None,
            options: &[],
            aliases: &[],
            whole: false,
            layer_param: None,
            backend_key,
        }
    }

    /// Whether `name` is this parameter's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_empty_list(list: &&'static [&'static str]) -> bool {
    list.is_empty()
}

/// Static description of one operation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlgorithmSpec {
    #[serde(rename = "operation")]
    pub op: OpName,

    #[serde(skip)]
    pub title: &'static str,

    pub description: &'static str,

    /// Backend algorithm id, e.g. `native:buffer`
    #[serde(skip)]
    pub backend_id: &'static str,

    pub parameters: &'static [ParamSpec],
}

impl AlgorithmSpec {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &'static ParamSpec> {
        self.parameters.iter().filter(|p| p.required)
    }

    /// Map a parameter name or alias onto the canonical parameter name
    pub fn canonical_param_name(&self, name: &str) -> Option<&'static str> {
        self.parameters.iter().find(|p| p.answers_to(name)).map(|p| p.name)
    }

    /// Layer parameters, in schema order
    pub fn layer_params(&self) -> impl Iterator<Item = &'static ParamSpec> {
        self.parameters.iter().filter(|p| p.kind == ParamKind::LayerRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_name_parse() {
        assert_eq!(OpName::parse("Buffer"), Some(OpName::Buffer));
        assert_eq!(OpName::parse(" intersection "), Some(OpName::Intersect));
        assert_eq!(OpName::parse("union"), None);
        assert!(OpName::Clip.is_multi_layer());
        assert!(!OpName::Dissolve.is_multi_layer());
    }

    #[test]
    fn test_numeric_range() {
        let range = NumericRange::above(0.0, 10.0);
        assert!(!range.contains(0.0));
        assert!(range.contains(10.0));
        assert!(!range.contains(10.5));
        assert_eq!(range.to_string(), "(0, 10]");

        let range = NumericRange::inclusive(1.0, 64.0);
        assert!(range.contains(1.0));
        assert_eq!(range.to_string(), "[1, 64]");
    }

    #[test]
    fn test_param_spec_serializes_without_internal_fields() {
        let spec = ParamSpec {
            required: true,
            aliases: &["buffer_distance"],
            unit: Some(DistanceUnit::Meters),
            ..ParamSpec::new("distance", ParamKind::Numeric, "DISTANCE", "Buffer distance")
        };
        let json = serde_json::to_value(spec).unwrap();

        assert_eq!(json["name"], "distance");
        assert_eq!(json["kind"], "numeric");
        assert_eq!(json["unit"], "meters");
        assert!(json.get("aliases").is_none());
        assert!(json.get("backend_key").is_none());
        assert!(json.get("options").is_none());
        assert!(spec.answers_to("Buffer_Distance"));
    }
}
