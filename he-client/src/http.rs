//! HTTP client for the platform API
//!
//! Ticket fetching, job submission and file retrieval.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::JobId;
use shared::Ticket;
use shared::request::TICKET_PATH;
use shared::response::{JobSubmitted, TicketResponse};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// API key header name
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Outcome of submitting an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// A job was started; its result arrives on the notification channel
    Job(JobId),
    /// The endpoint answered synchronously
    Immediate(Value),
}

impl Submission {
    fn from_value(value: Value) -> Self {
        match JobSubmitted::deserialize(&value) {
            Ok(submitted) => Self::Job(submitted.job_id),
            Err(_) => Self::Immediate(value),
        }
    }
}

/// HTTP client bound to one platform base URL and API key
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn api_key(&self) -> ClientResult<&str> {
        self.api_key.as_deref().ok_or(ClientError::MissingApiKey)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;

        if !status.is_success() {
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(ClientError::Unauthorized(text))
                }
                _ => Err(ClientError::Status { status, body: text }),
            };
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(url = %url, body = %text, "Undecodable response body: {e}");
            ClientError::InvalidResponse(format!("{url}: {e}"))
        })
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(self.url(path))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// POST a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .post(self.url(path))
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Obtain a ticket for the notification channel
    pub async fn fetch_ticket(&self) -> ClientResult<Ticket> {
        let response: TicketResponse = self.get(TICKET_PATH).await?;
        Ok(Ticket::new(response.ticket))
    }

    /// Submit an operation request
    pub async fn submit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Submission> {
        let value: Value = self.post(path, body).await?;
        let submission = Submission::from_value(value);
        if let Submission::Job(job_id) = &submission {
            tracing::debug!(path, job_id = %job_id, "Job submitted");
        }
        Ok(submission)
    }

    /// Download a file from an absolute (pre-signed) URL
    ///
    /// The API key is not sent; the URL carries its own authorization.
    pub async fn download(&self, url: &str) -> ClientResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
