//! Authenticated GraphQL client
//!
//! Every operation passes through the credential cache before transport,
//! then goes either through the batching decorator (queries) or straight
//! to the transport (mutations, or when batching is disabled).

use crate::auth::{CredentialCache, StoredTokenSource, SystemClock, TokenSource};
use crate::batch::{BatchConfig, BatchTransport};
use crate::config::ClientConfig;
use crate::graphql::{GraphQLRequest, GraphQLResponse, Operation, RawResponse};
use crate::storage::KeyValueStore;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct CrmClient {
    transport: Arc<dyn Transport>,
    batcher: Option<Arc<BatchTransport>>,
    credentials: Arc<CredentialCache>,
}

impl CrmClient {
    /// HTTP client for `config.endpoint`, reading tokens from `tokens`
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        config.validate()?;

        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.endpoint.clone()));
        let credentials = Arc::new(CredentialCache::new(
            tokens,
            Arc::new(SystemClock),
            config.credential_ttl,
        ));
        let batch = config.batching_enabled.then_some(config.batch);

        Ok(Self::from_parts(transport, credentials, batch))
    }

    /// HTTP client reading the login payload out of `store`
    pub fn from_store(config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let tokens = Arc::new(StoredTokenSource::new(store, config.token_key.clone()));
        Self::new(config, tokens)
    }

    /// Assemble a client from explicit parts
    pub fn from_parts(
        transport: Arc<dyn Transport>,
        credentials: Arc<CredentialCache>,
        batch: Option<BatchConfig>,
    ) -> Self {
        let batcher = batch.map(|config| Arc::new(BatchTransport::new(transport.clone(), config)));
        Self {
            transport,
            batcher,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    pub fn is_batching(&self) -> bool {
        self.batcher.is_some()
    }

    /// Run a typed operation
    pub async fn execute<O: Operation>(
        &self,
        variables: O::Variables,
    ) -> Result<GraphQLResponse<O::ResponseData>> {
        let request = O::build(variables)?;
        self.execute_request(request, O::KIND.is_batchable())
            .await?
            .decode()
    }

    /// Run a prebuilt request
    pub async fn execute_request(
        &self,
        request: GraphQLRequest,
        batchable: bool,
    ) -> Result<RawResponse> {
        let operation = request.operation_name.clone().unwrap_or_default();
        let authorization = self.credentials.auth_header().await;

        let response = match &self.batcher {
            Some(batcher) if batchable => batcher.submit(request, authorization).await,
            _ => self.transport.send(&request, &authorization).await,
        }
        .map_err(|error| {
            tracing::warn!(operation = %operation, error = %error, "graphql transport failed");
            error
        })?;

        if response.has_errors() {
            tracing::warn!(
                operation = %operation,
                errors = ?response.errors,
                "graphql response has errors"
            );
        }

        Ok(response)
    }
}
