use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

const USER_AGENT: &str = "climate-tally";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A single authenticated GET request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(&'static str, String)>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    #[allow(dead_code)] // Used by tests
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Anything that can perform a GET and hand back a JSON body.
/// The clients only ever talk to the network through this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, request: &ApiRequest) -> Result<Value, HttpError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn get_json(&self, request: &ApiRequest) -> Result<Value, HttpError> {
        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header("User-Agent", USER_AGENT);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), body_bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
