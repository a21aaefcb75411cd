//! CRS transformation

use geo::{Coord, Geometry, MapCoords};
use geogenie_core::error::ExecutionError;
use geogenie_core::models::CrsCode;
use proj::Proj;

/// Check if two CRS are the same
pub fn crs_match(a: &CrsCode, b: &CrsCode) -> bool {
    a == b
}

/// Whether PROJ can build a definition for `crs`
pub fn is_known_crs(crs: &CrsCode) -> bool {
    match Proj::new(&crs.to_string()) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("PROJ rejected {}: {}", crs, e);
            false
        }
    }
}

/// A PROJ pipeline from one CRS to another, in longitude/latitude axis order
pub struct Transformer {
    proj: Option<Proj>,
}

impl Transformer {
    pub fn new(from: &CrsCode, to: &CrsCode) -> Result<Self, ExecutionError> {
        // If CRS are the same, no transformation needed
        if crs_match(from, to) {
            return Ok(Self { proj: None });
        }

        let proj = Proj::new_known_crs(&from.to_string(), &to.to_string(), None).map_err(|e| {
            ExecutionError::algorithm(format!("no transformation available from {} to {}: {}", from, to, e))
        })?;
        Ok(Self { proj: Some(proj) })
    }

    pub fn transform(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>, ExecutionError> {
        let Some(proj) = self.proj.as_ref() else {
            return Ok(geometry.clone());
        };

        geometry.try_map_coords(|coord: Coord<f64>| {
            let (x, y) = proj
                .convert((coord.x, coord.y))
                .map_err(|e| ExecutionError::algorithm(format!("projection failed at ({}, {}): {}", coord.x, coord.y, e)))?;
            if !x.is_finite() || !y.is_finite() {
                return Err(ExecutionError::algorithm(format!(
                    "coordinate ({}, {}) has no image in the target CRS",
                    coord.x, coord.y
                )));
            }
            Ok(Coord { x, y })
        })
    }
}

/// Reproject a geometry from one CRS to another
pub fn reproject_geometry(
    geometry: &Geometry<f64>,
    from: &CrsCode,
    to: &CrsCode,
) -> Result<Geometry<f64>, ExecutionError> {
    Transformer::new(from, to)?.transform(geometry)
}
