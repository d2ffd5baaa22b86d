//! HTTP transport for GraphQL operations

use crate::graphql::{GraphQLRequest, RawResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use thiserror::Error;

/// Transport-level failures
///
/// `Clone` so a single batched call failure can be handed to every
/// operation of the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Batch dispatcher dropped the operation")]
    Closed,
}

/// Sends GraphQL operations to the server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one operation
    async fn send(
        &self,
        request: &GraphQLRequest,
        authorization: &str,
    ) -> Result<RawResponse, TransportError>;

    /// Send several operations in one array-bodied call
    ///
    /// Responses come back in request order.
    async fn send_batch(
        &self,
        requests: &[GraphQLRequest],
        authorization: &str,
    ) -> Result<Vec<RawResponse>, TransportError>;
}

/// reqwest-backed transport posting JSON to a single endpoint
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post<B, R>(&self, body: &B, authorization: &str) -> Result<R, TransportError>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let authorization = HeaderValue::from_str(authorization)
            .map_err(|e| TransportError::Network(format!("invalid authorization header: {e}")))?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(level = "debug", skip_all, fields(operation = ?request.operation_name))]
    async fn send(
        &self,
        request: &GraphQLRequest,
        authorization: &str,
    ) -> Result<RawResponse, TransportError> {
        self.post(request, authorization).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(size = requests.len()))]
    async fn send_batch(
        &self,
        requests: &[GraphQLRequest],
        authorization: &str,
    ) -> Result<Vec<RawResponse>, TransportError> {
        let responses: Vec<RawResponse> = self.post(requests, authorization).await?;
        if responses.len() != requests.len() {
            return Err(TransportError::Decode(format!(
                "batch of {} operations answered with {} responses",
                requests.len(),
                responses.len()
            )));
        }
        Ok(responses)
    }
}
