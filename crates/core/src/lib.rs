//! Shared data model and error taxonomy for the cognitive runtime core.

pub mod error;
pub mod message;
pub mod outcome;

pub use error::{CoreError, CoreResult};
pub use message::{Message, OpaqueId, Response};
pub use outcome::{Anomaly, Judgment, PipelineOutcome, RefusalKind, Severity, INTERNAL_ERROR_TEXT};
