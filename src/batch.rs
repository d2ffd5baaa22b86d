//! Batching transport decorator
//!
//! Operations issued within a short window are coalesced into one
//! array-bodied HTTP call. Each caller still gets its own result.

use crate::graphql::{GraphQLRequest, RawResponse};
use crate::transport::{Transport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// Default maximum number of operations per batch
pub const DEFAULT_MAX_BATCH_SIZE: usize = 5;

/// Default time a batch stays open for new members
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(20);

/// Batching parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_batch_size: usize,
    pub batch_window: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            batch_window: DEFAULT_BATCH_WINDOW,
        }
    }
}

type Reply = oneshot::Sender<Result<RawResponse, TransportError>>;

struct Pending {
    request: GraphQLRequest,
    reply: Reply,
}

/// Operations sharing one HTTP call
struct Batch {
    authorization: String,
    entries: Vec<Pending>,
}

#[derive(Default)]
struct BatchState {
    /// Bumped every time a new window opens; a window timer only
    /// flushes the batch it was started for.
    generation: u64,
    authorization: String,
    pending: Vec<Pending>,
}

impl BatchState {
    fn take(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(Batch {
            authorization: std::mem::take(&mut self.authorization),
            entries: std::mem::take(&mut self.pending),
        })
    }
}

/// Batching decorator around a [`Transport`]
///
/// A batch is flushed when it reaches `max_batch_size` members or when its
/// window elapses, whichever comes first. Operations carrying a different
/// `authorization` value never share a batch with the open one.
pub struct BatchTransport {
    inner: Arc<dyn Transport>,
    config: BatchConfig,
    state: Arc<Mutex<BatchState>>,
}

impl BatchTransport {
    pub fn new(inner: Arc<dyn Transport>, config: BatchConfig) -> Self {
        Self {
            inner,
            config: BatchConfig {
                max_batch_size: config.max_batch_size.max(1),
                ..config
            },
            state: Arc::new(Mutex::new(BatchState::default())),
        }
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    /// Transport used for flushed batches and unbatched operations
    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }

    /// Queue an operation and wait for its own response
    pub async fn submit(
        &self,
        request: GraphQLRequest,
        authorization: String,
    ) -> Result<RawResponse, TransportError> {
        let (reply, receiver) = oneshot::channel();
        let mut ready = Vec::new();

        {
            let mut state = self.state.lock().await;

            if !state.pending.is_empty() && state.authorization != authorization {
                ready.extend(state.take());
            }

            if state.pending.is_empty() {
                state.generation += 1;
                state.authorization = authorization;
                self.schedule_flush(state.generation);
            }

            state.pending.push(Pending { request, reply });

            if state.pending.len() >= self.config.max_batch_size {
                ready.extend(state.take());
            }
        }

        for batch in ready {
            tokio::spawn(dispatch(self.inner.clone(), batch));
        }

        receiver.await.map_err(|_| TransportError::Closed)?
    }

    fn schedule_flush(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let inner = Arc::clone(&self.inner);
        let window = self.config.batch_window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let batch = {
                let mut state = state.lock().await;
                if state.generation == generation {
                    state.take()
                } else {
                    None
                }
            };

            if let Some(batch) = batch {
                dispatch(inner, batch).await;
            }
        });
    }
}

async fn dispatch(inner: Arc<dyn Transport>, batch: Batch) {
    let Batch {
        authorization,
        mut entries,
    } = batch;

    tracing::debug!(size = entries.len(), "flushing graphql batch");

    // a lone operation goes out as a plain single-object request
    if entries.len() == 1 {
        if let Some(entry) = entries.pop() {
            let result = inner.send(&entry.request, &authorization).await;
            let _ = entry.reply.send(result);
        }
        return;
    }

    let (requests, replies): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .map(|pending| (pending.request, pending.reply))
        .unzip();

    match inner.send_batch(&requests, &authorization).await {
        Ok(responses) if responses.len() == replies.len() => {
            for (reply, response) in replies.into_iter().zip(responses) {
                let _ = reply.send(Ok(response));
            }
        }
        Ok(responses) => {
            let error = TransportError::Decode(format!(
                "batch of {} operations answered with {} responses",
                replies.len(),
                responses.len()
            ));
            fail_all(replies, error);
        }
        Err(error) => {
            tracing::warn!(size = replies.len(), error = %error, "graphql batch failed");
            fail_all(replies, error);
        }
    }
}

fn fail_all(replies: Vec<Reply>, error: TransportError) {
    for reply in replies {
        let _ = reply.send(Err(error.clone()));
    }
}
