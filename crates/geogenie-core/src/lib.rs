//! GeoGenie Core - Domain models, operation registry, ports and configuration
//!
//! This crate contains the core domain types and port definitions shared by the
//! natural-language geoprocessing pipeline and its adapters.

pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod ports;
pub mod registry;

pub use error::{GeogenieError, Result};
pub use registry::AlgorithmRegistry;
