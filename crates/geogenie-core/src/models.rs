pub mod algorithm;
pub mod crs;
pub mod layer;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod result;
pub mod units;

pub use algorithm::{AlgorithmSpec, NumericRange, OpName, ParamDefault, ParamKind, ParamSpec};
pub use crs::CrsCode;
pub use layer::{FieldType, GeometryKind, LayerCatalog, LayerDescriptor, LayerField, LayerId};
pub use prompt::Prompt;
pub use provider::Provider;
pub use request::{Caveat, OperationRequest, ParamValue};
pub use result::{ExecutionResult, ProgressEvent};
pub use units::DistanceUnit;
