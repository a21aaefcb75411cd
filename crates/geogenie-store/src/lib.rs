//! GeoGenie Store - In-memory layer registry and algorithm runner
//!
//! Holds the loaded layers and the outputs of finished operations, and exposes
//! them through the `LayerSource` and `ExecutionBackend` ports.

pub mod memory;

pub use memory::MemoryLayerStore;
