//! HttpBackend - REST implementation of the question-answering backend.
//!
//! Talks to `{backend_url}/query`, `{backend_url}/reset` and
//! `{backend_url}/config`. Every transport failure is classified into a
//! [`QueryError`] before it leaves this module.

use crate::wire::parse_answer;
use async_trait::async_trait;
use ragdesk_core::error::{QueryError, RagdeskError};
use ragdesk_core::session::{Answer, QaBackend, QueryRequest, Settings};
use ragdesk_infrastructure::ClientConfig;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::{Duration, Instant};

const QUERY_PATH: &str = "/query";
const RESET_PATH: &str = "/reset";
const CONFIG_PATH: &str = "/config";

/// Backend client that talks to the question-answering service over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    query_timeout: Duration,
    request_timeout: Duration,
}

impl HttpBackend {
    /// Creates a client for `base_url` with the given per-call timeouts.
    pub fn new(
        base_url: impl Into<String>,
        query_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, RagdeskError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RagdeskError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            query_timeout,
            request_timeout,
        })
    }

    /// Creates a client from the loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, RagdeskError> {
        Self::new(
            config.backend_url.clone(),
            config.query_timeout(),
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<Response, QueryError> {
        let url = self.endpoint(path);
        let mut request = self.client.post(&url).timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%url, timeout_secs = timeout.as_secs_f64(), "Sending backend request");
        let started = Instant::now();

        let response = request.send().await.map_err(|err| {
            let classified = classify_transport_error(&err);
            tracing::warn!(
                %url,
                kind = classified.kind(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Backend request failed: {err}"
            );
            classified
        })?;

        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), elapsed_ms = started.elapsed().as_millis() as u64, "Backend responded");

        if status != StatusCode::OK {
            tracing::warn!(%url, status = status.as_u16(), "Backend returned non-200 status");
            return Err(QueryError::BackendStatus(status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn query(&self, request: &QueryRequest<'_>) -> Result<Answer, QueryError> {
        let response = self
            .post(QUERY_PATH, Some(request), self.query_timeout)
            .await?;

        let body = response
            .text()
            .await
            .map_err(|err| classify_transport_error(&err))?;

        parse_answer(&body, request.mode).inspect_err(|err| {
            tracing::warn!("Failed to parse backend answer: {err}");
        })
    }

    async fn reset(&self) -> Result<(), QueryError> {
        self.post::<()>(RESET_PATH, None, self.request_timeout)
            .await
            .map(|_| ())
    }

    async fn apply_config(&self, settings: &Settings) -> Result<(), QueryError> {
        self.post(CONFIG_PATH, Some(settings), self.request_timeout)
            .await
            .map(|_| ())
    }
}

/// Maps a reqwest error onto the backend error taxonomy.
fn classify_transport_error(err: &reqwest::Error) -> QueryError {
    if err.is_timeout() {
        QueryError::Timeout
    } else if err.is_connect() {
        QueryError::Connection
    } else if err.is_decode() {
        QueryError::Decode(err.to_string())
    } else {
        QueryError::Unknown(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new(
            "https://qa.example/",
            Duration::from_secs(60),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(backend.base_url(), "https://qa.example");
        assert_eq!(backend.endpoint(QUERY_PATH), "https://qa.example/query");
    }

    #[test]
    fn test_from_config_uses_timeouts() {
        let config = ClientConfig {
            query_timeout_secs: 45,
            request_timeout_secs: 5,
            ..Default::default()
        };
        let backend = HttpBackend::from_config(&config).unwrap();
        assert_eq!(backend.query_timeout, Duration::from_secs(45));
        assert_eq!(backend.request_timeout, Duration::from_secs(5));
    }
}
