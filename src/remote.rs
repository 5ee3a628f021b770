//! HTTP access to the agent backend.
//!
//! [`RemoteClient::request`] is the only place that talks to the network. The typed
//! endpoints are exposed through [`Backend`] so the orchestrator can be driven by fakes.

use crate::model::{
    ClientConfig, FileList, FilesResponse, LogBundle, RunRequest, RunResponse, ServiceStatus,
    StatusResponse,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API error: {status}")]
    Status { status: u16 },
    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Caller-supplied request options, merged over the JSON defaults.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }
}

/// Typed view of the backend contract.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn status(&self) -> Result<ServiceStatus, RemoteError>;
    async fn logs(&self, limit: usize) -> Result<LogBundle, RemoteError>;
    async fn files(&self) -> Result<FileList, RemoteError>;
    async fn run(&self, req: &RunRequest) -> Result<String, RemoteError>;
}

pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        // No timeout: a hung call leaves its slot pending, matching the backend contract.
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Replaces a default per name and keeps every caller value for it.
        headers.extend(options.headers);

        let mut req = self.http.request(options.method, &url).headers(headers);
        if let Some(body) = options.body.as_ref() {
            req = req.body(body.to_string());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for RemoteClient {
    async fn status(&self) -> Result<ServiceStatus, RemoteError> {
        let r: StatusResponse = self.request("/status", RequestOptions::get()).await?;
        Ok(r.into())
    }

    async fn logs(&self, limit: usize) -> Result<LogBundle, RemoteError> {
        self.request(&format!("/logs?limit={limit}"), RequestOptions::get())
            .await
    }

    async fn files(&self) -> Result<FileList, RemoteError> {
        let r: FilesResponse = self.request("/files", RequestOptions::get()).await?;
        Ok(r.files)
    }

    async fn run(&self, req: &RunRequest) -> Result<String, RemoteError> {
        let body = serde_json::to_value(req).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let r: RunResponse = self
            .request("/run", RequestOptions::post_json(body))
            .await?;
        Ok(r.output)
    }
}
