//! GeoGenie Geo - Reference geometry engine
//!
//! Feature layers, GeoJSON input/output, PROJ-backed CRS transformation
//! and the five geoprocessing operations.

pub mod geojson_io;
pub mod models;
pub mod ops;
pub mod transform;

pub use models::{Feature, FeatureLayer};
