use geogenie_core::error::ExecutionError;
use geogenie_core::models::CrsCode;

use super::Step;
use crate::models::{Feature, FeatureLayer};
use crate::transform::Transformer;

/// Reproject every feature of `layer` into `target`
pub fn reproject(layer: &FeatureLayer, target: &CrsCode, step: Step<'_>) -> Result<Vec<Feature>, ExecutionError> {
    let source = layer
        .crs
        .as_ref()
        .ok_or_else(|| ExecutionError::algorithm(format!("layer '{}' has no CRS to reproject from", layer.name)))?;

    let transformer = Transformer::new(source, target)?;

    let total = layer.features.len();
    let mut output = Vec::with_capacity(total);
    for (idx, feature) in layer.features.iter().enumerate() {
        let geometry = feature
            .geometry
            .as_ref()
            .map(|g| transformer.transform(g))
            .transpose()?;
        output.push(Feature::new(geometry, feature.properties.clone()));
        step(idx + 1, total)?;
    }

    Ok(output)
}

/// Copy of `layer` in `target`, without progress reporting
pub fn reproject_layer(layer: &FeatureLayer, target: &CrsCode) -> Result<FeatureLayer, ExecutionError> {
    let features = reproject(layer, target, &super::no_step)?;
    Ok(FeatureLayer::new(layer.name.clone(), Some(target.clone()), features))
}
