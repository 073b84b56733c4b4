//! HTTP client for the points service: one network exchange per call.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;

use crate::error::{ClientError, Result};
use crate::workload::Transfer;

/// A stateless client for the remote points service.
///
/// The inner [`reqwest::Client`] holds the shared connection pool, so
/// clones of this are cheap and safe to use from any number of
/// concurrent workers. No per-call state is kept, and no retries
/// happen at this level.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: Arc<str>,
    http: reqwest::Client,
}

/// The JSON body of a transfer request.
#[derive(Debug, Serialize)]
struct SendBody {
    point: i64,
}

/// The outcome of a state probe, kept as the raw response rendering.
///
/// The body is intentionally never parsed into a domain type; the
/// report records whatever the service answered, even on errors.
#[derive(Debug)]
pub struct StateProbe {
    /// The HTTP status of the probe.
    pub status: StatusCode,
    /// The raw response body.
    pub body: String,
}

impl ServiceClient {
    /// Creates a client targeting the service at the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').into(),
            http: reqwest::Client::new(),
        }
    }

    /// Wipes all service state.
    ///
    /// This is destructive and requires the elevated reset token.
    pub async fn reset(&self, token: &str) -> Result<()> {
        let url = format!("{}/reset", self.base_url);
        let response = self
            .http
            .delete(url)
            .header("Authentication", token)
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await
    }

    /// Provisions a participant; the service answers 201 on creation.
    pub async fn create_participant(&self, name: &str) -> Result<()> {
        let url = format!("{}/user/{name}", self.base_url);
        let response = self.http.post(url).send().await?;
        expect_status(response, StatusCode::CREATED).await
    }

    /// Issues a single transfer attempt.
    pub async fn send_once(&self, transfer: &Transfer) -> Result<()> {
        let url = format!(
            "{}/send/{}/{}",
            self.base_url, transfer.from, transfer.to
        );
        let body = SendBody {
            point: transfer.point,
        };
        let response = self.http.post(url).json(&body).send().await?;
        expect_status(response, StatusCode::OK).await
    }

    /// Fetches a participant's transfer history.
    ///
    /// The response is discarded; this call only exercises the
    /// endpoint, and any status code counts as an answer.
    pub async fn fetch_history(&self, name: &str) -> Result<()> {
        let url = format!("{}/user/{name}/log", self.base_url);
        self.http.get(url).send().await?;
        Ok(())
    }

    /// Fetches a participant's balance state, returning the raw
    /// status and body regardless of what the service answered.
    pub async fn fetch_state(&self, name: &str) -> Result<StateProbe> {
        let url = format!("{}/user/{name}", self.base_url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(StateProbe { status, body })
    }
}

/// A single-shot transfer transport, shared by all wave workers.
///
/// This is the seam between the wave machinery and the HTTP client;
/// tests substitute in-process fakes for it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs one transfer exchange. No retries at this level.
    async fn send_once(&self, transfer: &Transfer) -> Result<()>;
}

#[async_trait::async_trait]
impl Transport for ServiceClient {
    async fn send_once(&self, transfer: &Transfer) -> Result<()> {
        ServiceClient::send_once(self, transfer).await
    }
}

async fn expect_status(response: reqwest::Response, expected: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::UnexpectedStatus { status, body });
    }
    Ok(())
}
