use geogenie_core::models::{Caveat, LayerDescriptor, ProgressEvent};
use serde::Serialize;
use tabled::Tabled;

/// Row of the layers listing
#[derive(Debug, Serialize, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Geometry")]
    pub geometry: String,
    #[tabled(rename = "CRS")]
    pub crs: String,
    #[tabled(rename = "Features")]
    pub features: usize,
    #[tabled(rename = "Fields")]
    pub fields: String,
}

impl From<&LayerDescriptor> for LayerRow {
    fn from(layer: &LayerDescriptor) -> Self {
        Self {
            id: layer.id.to_string(),
            name: layer.name.clone(),
            geometry: layer.geometry_kind.to_string(),
            crs: layer.crs.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "(none)".to_string()),
            features: layer.feature_count,
            fields: layer.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", "),
        }
    }
}

/// Row of the confirmation summary
#[derive(Debug, Serialize, Tabled)]
pub struct ParameterRow {
    #[tabled(rename = "Parameter")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Output for prompt command
#[derive(Debug, Serialize)]
pub struct PromptOutput {
    pub system: String,
    pub user: String,
    pub characters: usize,
    pub layer_count: usize,
}

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub request: String,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_layer: Option<String>,
    pub feature_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<String>,
    pub caveats: Vec<Caveat>,
    pub diagnostics: Vec<String>,
    pub progress: Vec<ProgressEvent>,
}

/// Row of the configuration listing
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

/// Row of the key status listing
#[derive(Debug, Serialize, Tabled)]
pub struct KeyStatusRow {
    #[tabled(rename = "Provider")]
    pub provider: String,
    #[tabled(rename = "Stored")]
    pub stored: bool,
    #[tabled(rename = "Environment")]
    pub environment: String,
    #[tabled(rename = "Needs key")]
    pub required: bool,
}
