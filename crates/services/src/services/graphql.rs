//! GraphQL transport for the master-data backend.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use models::entity::{Operation, OperationKind};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use utils::config::ClientConfig;

#[derive(Debug, Clone, Error)]
pub enum GraphqlError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("unauthorized")]
    Unauthorized,
    #[error("json error: {0}")]
    Serde(String),
    #[error("graphql error: {}", .0.join("; "))]
    Graphql(Vec<String>),
    #[error("response has no data")]
    MissingData,
}

impl GraphqlError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Request body posted to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    pub query: String,
    pub operation_name: String,
    pub variables: Value,
    #[serde(skip)]
    pub kind: OperationKind,
}

impl GraphqlRequest {
    pub fn new(operation: &Operation, variables: Value) -> Self {
        Self {
            query: operation.document.clone(),
            operation_name: operation.operation_name.clone(),
            variables,
            kind: operation.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    message: String,
}

impl GraphqlResponse {
    fn into_data(self) -> Result<Value, GraphqlError> {
        if !self.errors.is_empty() {
            return Err(GraphqlError::Graphql(
                self.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        match self.data {
            Some(Value::Null) | None => Err(GraphqlError::MissingData),
            Some(data) => Ok(data),
        }
    }
}

/// Anything that can execute a GraphQL request and hand back `data`.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError>;
}

/// HTTP client for the GraphQL endpoint
#[derive(Debug)]
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    auth_token: Option<SecretString>,
    query_retries: usize,
}

impl GraphqlClient {
    pub fn new(config: &ClientConfig) -> Result<Self, GraphqlError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("agri-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GraphqlError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            auth_token: config
                .auth_token
                .as_ref()
                .map(|t| SecretString::from(t.expose_secret().to_string())),
            query_retries: config.query_retries,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Shared HTTP client, reused for fetching export links.
    pub fn http(&self) -> &Client {
        &self.http
    }

    async fn send_request(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        debug!(operation = %request.operation_name, kind = %request.kind, "graphql request");

        let mut builder = self.http.post(self.endpoint.clone()).json(request);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let res = builder.send().await.map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<GraphqlResponse>()
                .await
                .map_err(|e| GraphqlError::Serde(e.to_string()))?
                .into_data(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GraphqlError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(GraphqlError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                // Validation failures come back as 400 with a regular errors array.
                match serde_json::from_str::<GraphqlResponse>(&body) {
                    Ok(parsed) if !parsed.errors.is_empty() => parsed.into_data(),
                    _ => Err(GraphqlError::Http { status, body }),
                }
            }
        }
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    /// Mutations are sent exactly once; queries retry transient failures.
    async fn execute(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        if request.kind == OperationKind::Mutation || self.query_retries == 0 {
            return self.send_request(request).await;
        }

        (|| async { self.send_request(request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_millis(200))
                    .with_max_delay(Duration::from_secs(5))
                    .with_max_times(self.query_retries)
                    .with_jitter(),
            )
            .when(|e: &GraphqlError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    operation = %request.operation_name,
                    "GraphQL query failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GraphqlError {
    if e.is_timeout() {
        GraphqlError::Timeout
    } else {
        GraphqlError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: Value) -> Result<Value, GraphqlError> {
        serde_json::from_value::<GraphqlResponse>(body)
            .unwrap()
            .into_data()
    }

    #[test]
    fn test_request_serializes_camel_case_without_kind() {
        let op = Operation::tokenized_mutation("tokenizedCreateCategory");
        let request = GraphqlRequest::new(&op, json!({ "tokenized": "abc" }));
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["operationName"], "TokenizedCreateCategory");
        assert_eq!(body["variables"]["tokenized"], "abc");
        assert!(body.get("kind").is_none());
    }

    #[test]
    fn test_errors_array_wins_over_data() {
        let err = parse(json!({
            "data": { "x": null },
            "errors": [{ "message": "duplicate prefix" }, { "message": "second" }]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "graphql error: duplicate prefix; second");
    }

    #[test]
    fn test_null_data_is_missing() {
        assert!(matches!(parse(json!({ "data": null })), Err(GraphqlError::MissingData)));
        assert_eq!(parse(json!({ "data": { "a": 1 } })).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn test_should_retry() {
        assert!(GraphqlError::Timeout.should_retry());
        assert!(
            GraphqlError::Http {
                status: 502,
                body: String::new()
            }
            .should_retry()
        );
        assert!(!GraphqlError::Unauthorized.should_retry());
        assert!(!GraphqlError::Graphql(vec!["bad".into()]).should_retry());
    }
}
