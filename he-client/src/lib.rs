//! HyperEdge Client - job client for the HyperEdge platform
//!
//! Operations are submitted over HTTP and answered with a job id; results
//! arrive later on a shared WebSocket notification channel and are matched
//! back to the waiting caller by job id.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod message;

pub use client::HeClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use http::{HttpClient, Submission};

// Message types and channel
pub use message::{JobChannel, JobTable, MemoryTransport, Transport, WsTransport};

// Re-export shared types for convenience
pub use shared::models::AppDef;
pub use shared::response::{
    AppEnv, BuildAppResponse, ExportAppResponse, GenCodeResponse, ReleaseAppResponse,
};
pub use shared::{JobId, JobResult, Operation, Ticket};
