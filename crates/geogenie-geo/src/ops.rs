//! The five geoprocessing operations
//!
//! Each operation walks the input features once and calls the step callback
//! after every feature with `(done, total)`. An error from the callback aborts
//! the operation, which is how progress and cancellation are wired in.

pub mod buffer;
pub mod dissolve;
pub mod overlay;
pub mod reproject;

pub use buffer::{buffer, BufferOptions, EndCapStyle, JoinStyle};
pub use dissolve::dissolve;
pub use overlay::{clip, intersect};
pub use reproject::{reproject, reproject_layer};

use geogenie_core::error::ExecutionError;

/// Per-feature progress callback
pub type Step<'a> = &'a dyn Fn(usize, usize) -> Result<(), ExecutionError>;

/// Step callback that never aborts
pub fn no_step(_done: usize, _total: usize) -> Result<(), ExecutionError> {
    Ok(())
}
