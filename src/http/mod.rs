use crate::error::{StoreError, StoreResult};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Postgres unique_violation, reported by PostgREST in the error body.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Sends the request and turns non-2xx statuses into a classified error.
    #[instrument(skip(self, request))]
    pub async fn execute(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP request failed with status: {}", status);
            return Err(classify_status(status, &body));
        }

        Ok(response)
    }

    pub async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

pub fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let detail = if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, truncate(body, 200))
    };

    if status == StatusCode::CONFLICT || body.contains(UNIQUE_VIOLATION) {
        return StoreError::Conflict(detail);
    }

    match status {
        StatusCode::UNAUTHORIZED => StoreError::AuthRequired,
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => StoreError::Network(detail),
        _ => StoreError::Unknown(detail),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_status_is_conflict() {
        let err = classify_status(StatusCode::CONFLICT, "");
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn unique_violation_body_is_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        let err = classify_status(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn gateway_failures_are_network() {
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY, "").kind(), "network");
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT, "").kind(), "network");
    }

    #[test]
    fn unauthorized_requires_auth() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED, "jwt expired"), StoreError::AuthRequired);
    }

    #[test]
    fn other_statuses_are_unknown() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err, StoreError::Unknown("500 Internal Server Error: boom".to_string()));
    }
}
