//! Parameter validation against the loaded layers
//!
//! [`ParameterValidator::validate`] is the only way to obtain a
//! [`ValidatedOperation`]. Parameters are checked in schema order and the
//! first failure stops validation.

use geogenie_core::error::{ValidationError, ValidationErrorKind};
use geogenie_core::models::{
    AlgorithmSpec, Caveat, CrsCode, GeometryKind, LayerCatalog, LayerDescriptor, LayerId, OpName, OperationRequest,
    ParamDefault, ParamKind, ParamSpec, ParamValue,
};
use geogenie_core::registry::AlgorithmRegistry;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::quantity::{quantity_from_json, QuantityError};

/// A request whose parameters are typed, unit-normalized and checked against
/// the catalog snapshot taken at validation time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedOperation {
    op: OpName,
    #[serde(skip)]
    spec: &'static AlgorithmSpec,
    parameters: BTreeMap<&'static str, ParamValue>,
    source_layers: Vec<LayerId>,
    #[serde(skip)]
    source_layer_names: Vec<String>,
    target_layer_name: String,
    caveats: Vec<Caveat>,
}

impl ValidatedOperation {
    pub fn op(&self) -> OpName {
        self.op
    }

    pub fn spec(&self) -> &'static AlgorithmSpec {
        self.spec
    }

    /// Typed values keyed by schema parameter name
    pub fn parameters(&self) -> &BTreeMap<&'static str, ParamValue> {
        &self.parameters
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    /// Ids of the layers the operation reads, input first
    pub fn source_layers(&self) -> &[LayerId] {
        &self.source_layers
    }

    /// Base name for the output layer, `<op>_<input layer name>`
    pub fn target_layer_name(&self) -> &str {
        &self.target_layer_name
    }

    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    /// Parameter values in schema order, layers shown by name
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.spec
            .parameters
            .iter()
            .filter_map(|spec| {
                let value = self.parameters.get(spec.name)?;
                let shown = match value {
                    ParamValue::Layer(id) => {
                        let idx = self.source_layers.iter().position(|l| l == id);
                        match idx.and_then(|i| self.source_layer_names.get(i)) {
                            Some(name) => format!("{} (id {})", name, id),
                            None => id.to_string(),
                        }
                    }
                    other => other.to_string(),
                };
                Some((spec.name, shown))
            })
            .collect()
    }
}

/// Checks operation requests against the registry and a catalog snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValidator;

impl ParameterValidator {
    /// Check `request` against `catalog`; `is_known_crs` decides which CRS codes the host can build
    pub fn validate(
        request: &OperationRequest,
        catalog: &LayerCatalog,
        is_known_crs: &dyn Fn(&CrsCode) -> bool,
    ) -> Result<ValidatedOperation, ValidationError> {
        let spec = AlgorithmRegistry::spec(request.op);
        let supplied = canonical_parameters(spec, request)?;

        let mut parameters = BTreeMap::new();
        let mut layers: BTreeMap<&'static str, &LayerDescriptor> = BTreeMap::new();
        let mut caveats: Vec<Caveat> = request.notes.iter().map(|note| Caveat::ModelNote { note: note.clone() }).collect();

        for param in spec.parameters {
            let value = match supplied.get(param.name) {
                Some(value) => *value,
                None => {
                    if let Some(default) = param.default {
                        parameters.insert(param.name, default_value(param, default));
                        caveats.push(Caveat::DefaultApplied { param: param.name.to_string(), value: default.to_string() });
                    } else if param.required {
                        return Err(ValidationError::new(
                            ValidationErrorKind::MissingParameter,
                            param.name,
                            format!("{} requires a {}", spec.op, param.kind),
                        ));
                    }
                    continue;
                }
            };

            let typed = match param.kind {
                ParamKind::LayerRef => {
                    let layer = check_layer(param, value, catalog)?;
                    layers.insert(param.name, layer);
                    ParamValue::Layer(layer.id.clone())
                }
                ParamKind::Numeric => check_number(param, value, &mut caveats)?,
                ParamKind::CrsCode => ParamValue::Crs(check_crs(param, value, is_known_crs)?),
                ParamKind::FieldRef => {
                    let owner = param.layer_param.and_then(|name| layers.get(name)).copied();
                    ParamValue::Field(check_field(param, value, owner)?)
                }
                ParamKind::Enum => ParamValue::Choice(check_choice(param, value)?),
            };
            parameters.insert(param.name, typed);
        }

        check_layers(spec.op, &layers, &parameters, &mut caveats)?;

        let input = layers.get("input").copied();
        let source_layers: Vec<&LayerDescriptor> =
            spec.layer_params().filter_map(|p| layers.get(p.name).copied()).collect();

        Ok(ValidatedOperation {
            op: spec.op,
            spec,
            parameters,
            source_layers: source_layers.iter().map(|l| l.id.clone()).collect(),
            source_layer_names: source_layers.iter().map(|l| l.name.clone()).collect(),
            target_layer_name: format!("{}_{}", spec.op, input.map(|l| l.name.as_str()).unwrap_or("output")),
            caveats,
        })
    }
}

/// Map supplied names (or aliases) onto schema names; null values count as absent
fn canonical_parameters<'a>(
    spec: &AlgorithmSpec,
    request: &'a OperationRequest,
) -> Result<BTreeMap<&'static str, &'a Value>, ValidationError> {
    let mut supplied = BTreeMap::new();
    for (name, value) in &request.parameters {
        let canonical = spec.canonical_param_name(name).ok_or_else(|| {
            let known: Vec<&str> = spec.parameters.iter().map(|p| p.name).collect();
            ValidationError::new(
                ValidationErrorKind::UnknownParameter,
                name.as_str(),
                format!("{} accepts {}", spec.op, known.join(", ")),
            )
        })?;

        if value.is_null() {
            continue;
        }
        if supplied.insert(canonical, value).is_some() {
            return Err(ValidationError::new(
                ValidationErrorKind::UnknownParameter,
                name.as_str(),
                format!("duplicates parameter '{}'", canonical),
            ));
        }
    }
    Ok(supplied)
}

fn default_value(param: &ParamSpec, default: ParamDefault) -> ParamValue {
    match default {
        ParamDefault::Number(value) => ParamValue::Number { value, unit: param.unit },
        ParamDefault::Text(text) => {
            let option = param.options.iter().find(|o| o.eq_ignore_ascii_case(text)).copied();
            ParamValue::Choice(option.unwrap_or(text))
        }
    }
}

fn shown(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_mismatch(param: &ParamSpec, value: &Value, detail: impl Into<String>) -> ValidationError {
    ValidationError::new(ValidationErrorKind::TypeMismatch, param.name, detail).with_received(shown(value))
}

/// Text of a string or integer value; models often emit numeric ids unquoted
fn reference_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

fn check_layer<'c>(
    param: &ParamSpec,
    value: &Value,
    catalog: &'c LayerCatalog,
) -> Result<&'c LayerDescriptor, ValidationError> {
    let reference = reference_text(value).ok_or_else(|| type_mismatch(param, value, "expected a layer id"))?;

    catalog.resolve(&reference).ok_or_else(|| {
        ValidationError::new(ValidationErrorKind::UnknownLayer, param.name, "no loaded layer has this id or name")
            .with_received(&reference)
    })
}

fn check_number(param: &ParamSpec, value: &Value, caveats: &mut Vec<Caveat>) -> Result<ParamValue, ValidationError> {
    let quantity = quantity_from_json(value).map_err(|e| match e {
        QuantityError::NotANumber => type_mismatch(param, value, "expected a number"),
        other => type_mismatch(param, value, other.to_string()),
    })?;

    let number = match (param.unit, quantity.unit) {
        (None, Some(unit)) => {
            return Err(type_mismatch(param, value, format!("takes a plain number, not a value in {}", unit)));
        }
        (None, None) => quantity.value,
        (Some(canonical), None) => {
            caveats.push(Caveat::UnitAssumed { param: param.name.to_string(), unit: canonical });
            quantity.value
        }
        (Some(canonical), Some(unit)) => {
            let converted = quantity.in_unit(canonical);
            if unit != canonical {
                caveats.push(Caveat::UnitConverted {
                    param: param.name.to_string(),
                    original: format!("{} {}", quantity.value, unit.symbol()),
                    value: converted,
                    unit: canonical,
                });
            }
            converted
        }
    };

    if param.whole && number.fract() != 0.0 {
        return Err(type_mismatch(param, value, "expected a whole number"));
    }

    if let Some(range) = param.range {
        if !range.contains(number) {
            let unit = param.unit.map(|u| format!(" {}", u.symbol())).unwrap_or_default();
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                param.name,
                format!("expected a value in {}{}", range, unit),
            )
            .with_received(format!("{}{}", number, unit)));
        }
    }

    Ok(ParamValue::Number { value: number, unit: param.unit })
}

fn check_crs(
    param: &ParamSpec,
    value: &Value,
    is_known_crs: &dyn Fn(&CrsCode) -> bool,
) -> Result<CrsCode, ValidationError> {
    let crs = reference_text(value)
        .and_then(|text| CrsCode::parse(&text))
        .ok_or_else(|| type_mismatch(param, value, "expected a CRS code such as EPSG:4326"))?;

    if !is_known_crs(&crs) {
        return Err(type_mismatch(param, value, format!("{} is not a known coordinate reference system", crs)));
    }
    Ok(crs)
}

fn check_field(param: &ParamSpec, value: &Value, owner: Option<&LayerDescriptor>) -> Result<String, ValidationError> {
    let Value::String(name) = value else {
        return Err(type_mismatch(param, value, "expected a field name"));
    };
    let Some(layer) = owner else {
        return Err(ValidationError::new(ValidationErrorKind::UnknownField, param.name, "no layer to read fields from")
            .with_received(name));
    };

    layer.field(name.trim()).map(|f| f.name.clone()).ok_or_else(|| {
        let fields: Vec<&str> = layer.fields.iter().map(|f| f.name.as_str()).collect();
        let available = if fields.is_empty() { "no fields".to_string() } else { fields.join(", ") };
        ValidationError::new(
            ValidationErrorKind::UnknownField,
            param.name,
            format!("layer '{}' has {}", layer.name, available),
        )
        .with_received(name)
    })
}

fn check_choice(param: &ParamSpec, value: &Value) -> Result<&'static str, ValidationError> {
    let invalid = || {
        ValidationError::new(
            ValidationErrorKind::InvalidEnumValue,
            param.name,
            format!("expected one of {}", param.options.join(", ")),
        )
        .with_received(shown(value))
    };

    let text = value.as_str().ok_or_else(invalid)?;
    param
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(text.trim()))
        .copied()
        .ok_or_else(invalid)
}

/// Rules that involve more than one parameter
fn check_layers(
    op: OpName,
    layers: &BTreeMap<&'static str, &LayerDescriptor>,
    parameters: &BTreeMap<&'static str, ParamValue>,
    caveats: &mut Vec<Caveat>,
) -> Result<(), ValidationError> {
    let Some(input) = layers.get("input").copied() else {
        return Ok(());
    };

    if !input.is_spatial() {
        return Err(ValidationError::new(
            ValidationErrorKind::IncompatibleGeometry,
            "input",
            format!("layer '{}' has no geometry", input.name),
        )
        .with_received(&input.name));
    }

    if let Some(overlay) = layers.get("overlay").copied() {
        if overlay.id == input.id {
            return Err(ValidationError::new(
                ValidationErrorKind::ConflictingLayers,
                "overlay",
                format!("{} needs two different layers", op),
            )
            .with_received(&overlay.name));
        }
        if overlay.geometry_kind != GeometryKind::Polygon {
            return Err(ValidationError::new(
                ValidationErrorKind::IncompatibleGeometry,
                "overlay",
                format!("{} needs a polygon overlay, '{}' is {}", op, overlay.name, overlay.geometry_kind),
            )
            .with_received(&overlay.name));
        }

        let input_crs = require_crs("input", input)?;
        let overlay_crs = require_crs("overlay", overlay)?;
        if input_crs != overlay_crs {
            caveats.push(Caveat::CrsMismatch {
                input_layer: input.name.clone(),
                input_crs: input_crs.clone(),
                overlay_layer: overlay.name.clone(),
                overlay_crs: overlay_crs.clone(),
            });
        }
    }

    match op {
        OpName::Buffer => {
            if let Some(crs) = input.crs.as_ref().filter(|c| c.is_geographic()) {
                caveats.push(Caveat::GeographicDistance {
                    param: "distance".to_string(),
                    layer: input.name.clone(),
                    crs: crs.clone(),
                });
            }
        }
        OpName::Reproject => {
            let current = require_crs("input", input)?;
            if parameters.get("target_crs").and_then(ParamValue::as_crs) == Some(current) {
                caveats.push(Caveat::NoOpReprojection { layer: input.name.clone(), crs: current.clone() });
            }
        }
        _ => {}
    }

    Ok(())
}

fn require_crs<'l>(param: &str, layer: &'l LayerDescriptor) -> Result<&'l CrsCode, ValidationError> {
    layer.crs.as_ref().ok_or_else(|| {
        ValidationError::new(ValidationErrorKind::MissingCrs, param, format!("layer '{}' has no defined CRS", layer.name))
            .with_received(&layer.name)
    })
}
