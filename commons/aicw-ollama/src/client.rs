use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Response;
use tracing::{debug, info, instrument};

use crate::{
    ModelRuntime,
    error::OllamaError,
    modelfile::ModelFile,
    progress::{ProgressDecoder, ProgressTracker},
    types::{
        CreateRequest, ListResponse, ModelEntry, ProgressResponse, PullRequest,
    },
};

pub const DEFAULT_PORT: u16 = 11434;

/// HTTP client for a single Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl OllamaClient {
    /// `request_timeout` bounds the non-streaming calls; pulls are bounded
    /// by the caller.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, OllamaError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("aicw-ollama/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, base_url, request_timeout))
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            request_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn list(
        &self,
        endpoint: &'static str,
    ) -> Result<Vec<ModelEntry>, OllamaError> {
        let resp = self
            .http
            .get(self.url(endpoint))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let resp = check_status(endpoint, resp).await?;
        let body: ListResponse = serde_json::from_slice(&resp.bytes().await?)?;
        Ok(body.models)
    }
}

async fn check_status(
    endpoint: &'static str,
    resp: Response,
) -> Result<Response, OllamaError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(OllamaError::Status {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ModelRuntime for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        self.list("/api/tags").await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn pull_model(&self, name: &str) -> Result<(), OllamaError> {
        const ENDPOINT: &str = "/api/pull";
        info!(model = %name, "pulling model");
        let resp = self
            .http
            .post(self.url(ENDPOINT))
            .json(&PullRequest {
                model: name,
                stream: true,
            })
            .send()
            .await?;
        let resp = check_status(ENDPOINT, resp).await?;

        let mut tracker = ProgressTracker::new("pull", name);
        let mut decoder = ProgressDecoder::new();
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            for record in decoder.push(&chunk?)? {
                tracker.observe(&record)?;
            }
        }
        if let Some(record) = decoder.finish()? {
            tracker.observe(&record)?;
        }
        tracker.finish()?;
        info!(model = %name, "model pulled");
        Ok(())
    }

    #[instrument(skip(self, file), fields(base = %self.base_url, from = %file.from))]
    async fn create_model(
        &self,
        name: &str,
        file: &ModelFile,
    ) -> Result<(), OllamaError> {
        const ENDPOINT: &str = "/api/create";
        debug!(model = %name, modelfile = %file.render(), "creating model");
        let resp = self
            .http
            .post(self.url(ENDPOINT))
            .timeout(self.request_timeout)
            .json(&CreateRequest {
                model: name,
                from: &file.from,
                system: file.system.as_deref(),
                parameters: &file.parameters,
                stream: false,
            })
            .send()
            .await?;
        let resp = check_status(ENDPOINT, resp).await?;
        let record: ProgressResponse =
            serde_json::from_slice(&resp.bytes().await?)?;
        let mut tracker = ProgressTracker::new("create", name);
        tracker.observe(&record)?;
        tracker.finish()?;
        info!(model = %name, "model created");
        Ok(())
    }

    async fn list_running_models(&self) -> Result<Vec<ModelEntry>, OllamaError> {
        self.list("/api/ps").await
    }
}
