//! Port trait definitions
//!
//! These traits define the interfaces that the host GIS, the UI and the
//! credential storage must implement.

pub mod credentials;
pub mod execution;
pub mod layers;
pub mod progress;

pub use credentials::CredentialStore;
pub use execution::{AlgorithmCall, ExecutionBackend, OutputSource};
pub use layers::LayerSource;
pub use progress::{CancelFlag, ProgressObserver, ProgressReporter};
