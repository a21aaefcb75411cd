//! GeoGenie Intent - From free text to an executed operation
//!
//! Each stage of the pipeline lives in its own module:
//! [`prompt`] builds the model prompt, [`resolver`] decodes the model answer,
//! [`validator`] checks it against the loaded layers, [`confirm`] asks the user,
//! and [`executor`] runs it. [`session`] ties the stages together.

pub mod confirm;
pub mod executor;
pub mod prompt;
pub mod quantity;
pub mod resolver;
pub mod session;
pub mod validator;

pub use confirm::{AutoApprove, ConfirmationGate, ConfirmedOperation, Confirmer, Decision, GateOutcome};
pub use executor::OperationExecutor;
pub use prompt::PromptBuilder;
pub use resolver::IntentResolver;
pub use session::{RequestOutcome, Session, SessionState};
pub use validator::{ParameterValidator, ValidatedOperation};
