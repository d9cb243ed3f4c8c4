//! Platform client
//!
//! Every job-bearing operation follows the same path:
//!
//! 1. POST the request, receive `{JobId}`
//! 2. subscribe to `jobs.<JobId>` on the shared notification channel
//! 3. wait for the listener to deposit the result
//! 4. decode `retval` into the operation's response type
//!
//! The ticket and channel are set up on the first job-bearing call and shared
//! by all later calls on the same client.

use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::request::{
    BuildAppRequest, CreateAppEnvRequest, ExportAppRequest, ProjectRequest, ReleaseAppRequest,
    RunAppRequest, file_path,
};
use shared::response::{
    AppEnv, BuildAppResponse, CreateAppEnvResponse, ExportAppResponse, FileUrlResponse,
    GenCodeResponse, ReleaseAppResponse,
};
use shared::{EMPTY_ULID, JobId, JobResult, Operation, Value};
use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{HttpClient, Submission};
use crate::message::JobChannel;

/// Client for the platform's job-oriented API
#[derive(Debug)]
pub struct HeClient {
    config: ClientConfig,
    http: HttpClient,
    channel: OnceCell<JobChannel>,
}

impl HeClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            config,
            http,
            channel: OnceCell::new(),
        })
    }

    /// Client configured from `HE_API_KEY`, `HE_URL` and `HE_WS_URL`
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Client using an already opened notification channel
    pub fn with_channel(config: ClientConfig, channel: JobChannel) -> ClientResult<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            config,
            http,
            channel: OnceCell::new_with(Some(channel)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Whether the notification channel has been set up
    pub fn has_channel(&self) -> bool {
        self.channel.initialized()
    }

    /// Shared notification channel, connecting on first use
    ///
    /// A channel that has lost its connection stays closed; every later job
    /// wait fails with `ConnectionClosed`.
    pub async fn channel(&self) -> ClientResult<&JobChannel> {
        self.channel
            .get_or_try_init(|| async {
                let ticket = self.http.fetch_ticket().await?;
                let url = self.config.resolve_ws_url()?;
                JobChannel::connect(&url, &ticket).await
            })
            .await
    }

    /// Wait for a submitted job and check its status
    pub async fn await_job(&self, operation: Operation, job_id: &JobId) -> ClientResult<JobResult> {
        let channel = self.channel().await?;
        channel.subscribe_job(job_id).await?;

        let result = channel.wait(job_id, self.config.job_timeout).await?;
        if !result.success {
            tracing::warn!(job_id = %job_id, operation = %operation, "Job failed");
            return Err(ClientError::JobFailed {
                job_id: job_id.clone(),
                operation,
            });
        }

        tracing::info!(job_id = %job_id, operation = %operation, "Job completed");
        Ok(result)
    }

    async fn start_job<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        body: &B,
    ) -> ClientResult<JobId> {
        match self.http.submit(operation.path(), body).await? {
            Submission::Job(job_id) => Ok(job_id),
            Submission::Immediate(value) => Err(ClientError::InvalidResponse(format!(
                "{operation} returned no JobId: {value}"
            ))),
        }
    }

    /// Submit `operation` and decode its outcome
    ///
    /// Synchronous endpoints are decoded straight from the HTTP body; the
    /// rest wait for their job and decode its return value.
    async fn execute<B, R>(&self, operation: Operation, body: &B) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if operation.is_synchronous() {
            let value = match self.http.submit(operation.path(), body).await? {
                Submission::Immediate(value) => value,
                Submission::Job(job_id) => {
                    return Err(ClientError::InvalidResponse(format!(
                        "{operation} unexpectedly started job {job_id}"
                    )));
                }
            };
            return decode_immediate(operation, value);
        }

        let job_id = self.start_job(operation, body).await?;
        let result = self.await_job(operation, &job_id).await?;
        result.decode().map_err(|e| {
            tracing::warn!(
                job_id = %job_id,
                operation = %operation,
                retval = ?result.return_value,
                "Unexpected job result shape"
            );
            ClientError::InvalidResponse(format!("{operation} job {job_id}: {e}"))
        })
    }

    /// Submit and wait for a job that returns no payload
    async fn run_job_unit<B: Serialize + ?Sized>(
        &self,
        operation: Operation,
        body: &B,
    ) -> ClientResult<()> {
        let job_id = self.start_job(operation, body).await?;
        self.await_job(operation, &job_id).await?;
        Ok(())
    }

    // ========== Depot API ==========

    /// Publish an application definition
    ///
    /// Without `app_id` the app is exported for the first time and the
    /// platform assigns an id (returned in the response).
    pub async fn export_app<D: Serialize + ?Sized>(
        &self,
        app_id: Option<&str>,
        app_def: &D,
    ) -> ClientResult<ExportAppResponse> {
        let request = ExportAppRequest {
            app_id: app_id.unwrap_or(EMPTY_ULID).to_string(),
            app_def,
        };
        self.execute(Operation::ExportApp, &request).await
    }

    /// Publish an application definition as a named version
    pub async fn release_app<D: Serialize + ?Sized>(
        &self,
        app_id: &str,
        version_name: &str,
        app_def: &D,
    ) -> ClientResult<ReleaseAppResponse> {
        let request = ReleaseAppRequest {
            app_id: app_id.to_string(),
            version_name: version_name.to_string(),
            app_def,
        };
        self.execute(Operation::ReleaseApp, &request).await
    }

    // ========== Apps API ==========

    pub async fn build_app(&self, app_id: &str, version_name: &str) -> ClientResult<BuildAppResponse> {
        let request = BuildAppRequest {
            app_id: app_id.to_string(),
            version_name: version_name.to_string(),
        };
        self.execute(Operation::BuildApp, &request).await
    }

    /// Create an environment; answered synchronously, no job involved
    pub async fn create_app_env(&self, app_id: &str, name: &str) -> ClientResult<AppEnv> {
        let request = CreateAppEnvRequest {
            app_id: app_id.to_string(),
            name: name.to_string(),
        };
        let response: CreateAppEnvResponse =
            self.execute(Operation::CreateAppEnv, &request).await?;
        Ok(response.app_env)
    }

    pub async fn run_app(&self, app_id: &str, version_id: &str, env_id: &str) -> ClientResult<()> {
        let request = RunAppRequest {
            app_id: app_id.to_string(),
            version_id: version_id.to_string(),
            env_id: env_id.to_string(),
        };
        self.run_job_unit(Operation::RunApp, &request).await
    }

    // ========== Server API ==========

    pub async fn gen_code(&self, project_id: &str) -> ClientResult<GenCodeResponse> {
        let request = ProjectRequest {
            id: project_id.to_string(),
        };
        self.execute(Operation::GenCode, &request).await
    }

    pub async fn build_server(&self, project_id: &str) -> ClientResult<()> {
        let request = ProjectRequest {
            id: project_id.to_string(),
        };
        self.run_job_unit(Operation::BuildServer, &request).await
    }

    pub async fn start_server(&self, project_id: &str) -> ClientResult<()> {
        let request = ProjectRequest {
            id: project_id.to_string(),
        };
        self.run_job_unit(Operation::StartServer, &request).await
    }

    // ========== Files ==========

    /// Fetch a file: resolve its id to a signed URL, then download it
    pub async fn download_file_by_id(&self, file_id: &str) -> ClientResult<Vec<u8>> {
        let response: FileUrlResponse = self.http.get(&file_path(file_id)).await?;
        tracing::debug!(file_id, "Downloading file");
        self.http.download(&response.url).await
    }
}

fn decode_immediate<T: DeserializeOwned>(operation: Operation, value: Value) -> ClientResult<T> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::InvalidResponse(format!("{operation} response: {e}")))
}
