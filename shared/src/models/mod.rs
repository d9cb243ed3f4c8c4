//! Data models
//!
//! Typed form of the application definition submitted by ExportApp and
//! ReleaseApp. The client accepts any serializable value as the definition;
//! these types describe the shape the platform expects.

pub mod app_def;

// Re-exports
pub use app_def::*;
