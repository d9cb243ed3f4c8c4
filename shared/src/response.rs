//! API response types
//!
//! HTTP response bodies and the decoded `retval` of finished jobs.

use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// `GET api/bc/ws/ticket`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket: String,
}

/// `GET api/bc/file/{fileId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUrlResponse {
    pub url: String,
}

/// Body returned by every job-submitting endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobSubmitted {
    pub job_id: JobId,
}

/// ExportApp job result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportAppResponse {
    pub app_id: String,
    pub app_def_file_id: String,
}

/// ReleaseApp job result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseAppResponse {
    pub app_id: String,
    pub version_id: String,
    pub version_name: String,
    pub app_def_file_id: String,
}

/// BuildApp job result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildAppResponse {
    pub server_files_archive_id: String,
    #[serde(default)]
    pub server_image_id: Option<String>,
    #[serde(default)]
    pub sync_bot_image_id: Option<String>,
}

/// GenCode job result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenCodeResponse {
    pub server_files_archive_id: String,
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppEnv {
    pub id: String,
    pub app_id: String,
    pub name: String,
}

/// CreateAppEnv synchronous response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAppEnvResponse {
    pub app_env: AppEnv,
}
