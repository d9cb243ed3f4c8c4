//! API request types
//!
//! Request bodies for the platform's job-submitting endpoints. Field names on
//! the wire are PascalCase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote operation exposed by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ExportApp,
    ReleaseApp,
    BuildApp,
    CreateAppEnv,
    RunApp,
    GenCode,
    BuildServer,
    StartServer,
}

impl Operation {
    /// Endpoint path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::ExportApp => "api/IDepotService/ExportApp",
            Self::ReleaseApp => "api/IDepotService/ReleaseApp",
            Self::BuildApp => "api/IAppsService/BuildApp",
            Self::CreateAppEnv => "api/IAppsService/CreateAppEnv",
            Self::RunApp => "api/IAppsService/RunApp",
            Self::GenCode => "api/bc/GenCode",
            Self::BuildServer => "api/bc/BuildServer",
            Self::StartServer => "api/bc/server/start",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ExportApp => "ExportApp",
            Self::ReleaseApp => "ReleaseApp",
            Self::BuildApp => "BuildApp",
            Self::CreateAppEnv => "CreateAppEnv",
            Self::RunApp => "RunApp",
            Self::GenCode => "GenCode",
            Self::BuildServer => "BuildServer",
            Self::StartServer => "StartServer",
        }
    }

    /// Whether the endpoint answers synchronously instead of starting a job
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Self::CreateAppEnv)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Path of the ticket endpoint
pub const TICKET_PATH: &str = "api/bc/ws/ticket";

/// Path of the file lookup endpoint for `file_id`
pub fn file_path(file_id: &str) -> String {
    format!("api/bc/file/{file_id}")
}

/// ExportApp body; `D` is the caller's app definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportAppRequest<D> {
    pub app_id: String,
    pub app_def: D,
}

/// ReleaseApp body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReleaseAppRequest<D> {
    pub app_id: String,
    pub version_name: String,
    pub app_def: D,
}

/// BuildApp body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildAppRequest {
    pub app_id: String,
    pub version_name: String,
}

/// CreateAppEnv body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAppEnvRequest {
    pub app_id: String,
    pub name: String,
}

/// RunApp body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunAppRequest {
    pub app_id: String,
    pub version_id: String,
    pub env_id: String,
}

/// Body for the server-side project endpoints (GenCode, BuildServer, start)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectRequest {
    pub id: String,
}
