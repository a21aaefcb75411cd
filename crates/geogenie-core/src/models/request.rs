use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::algorithm::OpName;
use super::crs::CrsCode;
use super::layer::LayerId;
use super::units::DistanceUnit;

/// Structured interpretation of a user request, as returned by the model
///
/// Parameter values are the raw JSON the model produced. Nothing here has been
/// checked against the loaded layers yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub op: OpName,
    pub parameters: BTreeMap<String, Value>,
    pub notes: Vec<String>,
}

impl OperationRequest {
    pub fn new(op: OpName) -> Self {
        Self { op, parameters: BTreeMap::new(), notes: Vec::new() }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Produce a new request with user edits applied. A `null` edit removes the parameter.
    pub fn merge_edits(&self, edits: &BTreeMap<String, Value>) -> Self {
        let mut merged = self.clone();
        for (name, value) in edits {
            if value.is_null() {
                merged.parameters.remove(name);
            } else {
                merged.parameters.insert(name.clone(), value.clone());
            }
        }
        merged
    }
}

/// Typed, unit-normalized parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamValue {
    Layer(LayerId),
    Number { value: f64, unit: Option<DistanceUnit> },
    Crs(CrsCode),
    Field(String),
    Choice(&'static str),
}

impl ParamValue {
    pub fn as_layer(&self) -> Option<&LayerId> {
        match self {
            ParamValue::Layer(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_crs(&self) -> Option<&CrsCode> {
        match self {
            ParamValue::Crs(crs) => Some(crs),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&str> {
        match self {
            ParamValue::Field(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&'static str> {
        match self {
            ParamValue::Choice(option) => Some(option),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Layer(id) => write!(f, "{}", id),
            ParamValue::Number { value, unit: Some(unit) } => write!(f, "{} {}", value, unit.symbol()),
            ParamValue::Number { value, unit: None } => write!(f, "{}", value),
            ParamValue::Crs(crs) => write!(f, "{}", crs),
            ParamValue::Field(name) => f.write_str(name),
            ParamValue::Choice(option) => f.write_str(option),
        }
    }
}

/// Non-blocking note shown at confirmation time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caveat {
    /// Free-text note from the model
    ModelNote { note: String },

    /// A number was given without a unit; the canonical unit was assumed
    UnitAssumed { param: String, unit: DistanceUnit },

    /// A number with a unit token was converted to the canonical unit
    UnitConverted { param: String, original: String, value: f64, unit: DistanceUnit },

    /// An optional parameter was missing and its default was used
    DefaultApplied { param: String, value: String },

    /// The two layers of a multi-layer operation use different CRSs
    CrsMismatch { input_layer: String, input_crs: CrsCode, overlay_layer: String, overlay_crs: CrsCode },

    /// A linear distance applied to a layer in a geographic CRS
    GeographicDistance { param: String, layer: String, crs: CrsCode },

    /// Reprojection target equals the layer's current CRS
    NoOpReprojection { layer: String, crs: CrsCode },
}

impl Caveat {
    /// Caveats that may change the result in a way the user did not ask for
    pub fn requires_attention(&self) -> bool {
        matches!(
            self,
            Caveat::CrsMismatch { .. } | Caveat::GeographicDistance { .. } | Caveat::NoOpReprojection { .. }
        )
    }
}

impl fmt::Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caveat::ModelNote { note } => write!(f, "Model note: {}", note),
            Caveat::UnitAssumed { param, unit } => {
                write!(f, "No unit given for '{}'; assuming {}", param, unit)
            }
            Caveat::UnitConverted { param, original, value, unit } => {
                write!(f, "Converted '{}' from {} to {} {}", param, original, value, unit.symbol())
            }
            Caveat::DefaultApplied { param, value } => {
                write!(f, "Using default {} for '{}'", value, param)
            }
            Caveat::CrsMismatch { input_layer, input_crs, overlay_layer, overlay_crs } => write!(
                f,
                "CRS mismatch: '{}' is {} but '{}' is {}; results depend on on-the-fly transformation",
                input_layer, input_crs, overlay_layer, overlay_crs
            ),
            Caveat::GeographicDistance { param, layer, crs } => write!(
                f,
                "'{}' is a distance in meters but '{}' uses the geographic CRS {}",
                param, layer, crs
            ),
            Caveat::NoOpReprojection { layer, crs } => {
                write!(f, "'{}' is already in {}; reprojection will not change coordinates", layer, crs)
            }
        }
    }
}
