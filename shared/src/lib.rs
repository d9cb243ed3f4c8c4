//! Shared types for the HyperEdge platform API
//!
//! Wire types used by the job client: identifiers, notification channel
//! envelopes, HTTP request/response bodies and the application definition
//! model.

pub mod message;
pub mod models;
pub mod request;
pub mod response;
pub mod types;

// Re-exports
pub use serde_json::Value;

// Message re-exports (for convenient access)
pub use message::{Envelope, JobNotification, JobResult};

pub use request::Operation;
pub use types::{EMPTY_ULID, JobId, Ticket};
