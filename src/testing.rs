//! Fakes shared by the unit tests

use crate::auth::{Clock, CredentialCache, TokenSource, DEFAULT_CREDENTIAL_TTL};
use crate::batch::BatchConfig;
use crate::client::CrmClient;
use crate::graphql::{GraphQLErrorEntry, GraphQLRequest, RawResponse};
use crate::notify::{NoticeLevel, Notifier};
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub(crate) fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub(crate) fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub(crate) struct CountingTokenSource {
    token: Mutex<Option<String>>,
    reads: AtomicUsize,
}

impl CountingTokenSource {
    pub(crate) fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_token(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TokenSource for CountingTokenSource {
    fn read_token(&self) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub requests: Vec<GraphQLRequest>,
    pub authorization: String,
    pub batched: bool,
}

type Responder = Box<dyn Fn(&GraphQLRequest) -> RawResponse + Send + Sync>;

/// In-memory transport answering through a responder closure
pub(crate) struct FakeTransport {
    responder: Responder,
    failure: Mutex<Option<TransportError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    /// Answers `{ "echo": <variables.n> }`
    pub(crate) fn echo() -> Self {
        Self::with_responder(|request| RawResponse {
            data: Some(json!({ "echo": request.variables["n"] })),
            errors: Vec::new(),
        })
    }

    /// Answers every request with the same data
    pub(crate) fn answering(data: serde_json::Value) -> Self {
        Self::with_responder(move |_| RawResponse {
            data: Some(data.clone()),
            errors: Vec::new(),
        })
    }

    pub(crate) fn with_responder(
        responder: impl Fn(&GraphQLRequest) -> RawResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_with(&self, error: TransportError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, requests: &[GraphQLRequest], authorization: &str, batched: bool) {
        self.calls.lock().unwrap().push(RecordedCall {
            requests: requests.to_vec(),
            authorization: authorization.to_string(),
            batched,
        });
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        request: &GraphQLRequest,
        authorization: &str,
    ) -> Result<RawResponse, TransportError> {
        self.record(std::slice::from_ref(request), authorization, false);
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok((self.responder)(request))
    }

    async fn send_batch(
        &self,
        requests: &[GraphQLRequest],
        authorization: &str,
    ) -> Result<Vec<RawResponse>, TransportError> {
        self.record(requests, authorization, true);
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(requests.iter().map(|r| (self.responder)(r)).collect())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

/// Client over `transport` with a fixed `Bearer jwt` credential
pub(crate) fn test_client(transport: Arc<FakeTransport>, batch: Option<BatchConfig>) -> CrmClient {
    let credentials = Arc::new(CredentialCache::new(
        Arc::new(CountingTokenSource::new(Some("jwt"))),
        Arc::new(ManualClock::new(0)),
        DEFAULT_CREDENTIAL_TTL,
    ));
    CrmClient::from_parts(transport, credentials, batch)
}

/// Error entry with a path, as servers report a failed field
pub(crate) fn field_error(message: &str, field: &str) -> GraphQLErrorEntry {
    GraphQLErrorEntry {
        message: message.to_string(),
        locations: Vec::new(),
        path: vec![json!(field)],
        extensions: None,
    }
}
