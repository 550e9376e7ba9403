use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis endpoint returned {0}")]
    Status(StatusCode),
    #[error("analysis request timed out")]
    Timeout,
    #[error("analysis request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("analysis response is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("analysis request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AnalysisError::Timeout
        } else if e.is_decode() {
            AnalysisError::Decode(e)
        } else {
            AnalysisError::Transport(e)
        }
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
}

/// One-shot client for the external food analysis endpoint.
#[derive(Clone)]
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
}

impl AnalysisClient {
    pub fn new(config: &AnalysisConfig) -> anyhow::Result<Self> {
        Self::with_timeout(&config.endpoint, config.timeout())
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build analysis http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `{"image": <data uri>}` and return the response body as-is.
    /// Resolves to [`AnalysisError::Cancelled`] as soon as `cancel` fires.
    pub async fn analyze(
        &self,
        image: &str,
        cancel: &CancellationToken,
    ) -> Result<Value, AnalysisError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("analysis request abandoned");
                Err(AnalysisError::Cancelled)
            }
            res = self.send(image) => res,
        }
    }

    async fn send(&self, image: &str) -> Result<Value, AnalysisError> {
        debug!(endpoint = %self.endpoint, bytes = image.len(), "sending image to analysis endpoint");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { image })
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, "analysis endpoint responded");
        if !status.is_success() {
            warn!(%status, "analysis endpoint rejected request");
            return Err(AnalysisError::Status(status));
        }
        Ok(resp.json::<Value>().await?)
    }
}
