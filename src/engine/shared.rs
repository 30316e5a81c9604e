//! Shared Engine - Lock-guarded handle for concurrent callers
//!
//! Selection and reporting must not interleave, so every state change runs
//! under one async mutex. Pacing happens outside the lock in `mutate`;
//! `round_trip` keeps the lock for the whole request/response cycle.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::{EngineSnapshot, Mutation, ReportSummary, TamperEngine};
use crate::feedback::{pace, Outcome};

/// Cloneable handle to one engine
#[derive(Clone)]
pub struct SharedTamperEngine {
    inner: Arc<Mutex<TamperEngine>>,
}

impl SharedTamperEngine {
    pub fn new(engine: TamperEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Mutate under the lock, then pace without holding it
    pub async fn mutate(&self, payload: &str, cancel: &CancellationToken) -> Mutation {
        let mut mutation = self.inner.lock().await.prepare(payload);
        mutation.cancelled = !pace(mutation.delay, cancel).await;
        mutation
    }

    pub async fn report<S: AsRef<str>>(&self, chain: &[S], succeeded: bool) -> ReportSummary {
        self.inner.lock().await.report(chain, succeeded)
    }

    /// Mutate, hand the payload to `send`, and report whatever it returns,
    /// all without releasing the engine. `None` from `send` skips the report.
    pub async fn round_trip<F, Fut>(
        &self,
        payload: &str,
        cancel: &CancellationToken,
        send: F,
    ) -> (Mutation, Option<ReportSummary>)
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Option<bool>>,
    {
        let mut engine = self.inner.lock().await;
        let mutation = engine.mutate(payload, cancel).await;

        let summary = match send(mutation.encoded.clone()).await {
            Some(succeeded) => Some(engine.report_chain(&mutation.chain, Outcome::from(succeeded))),
            None => None,
        };
        (mutation, summary)
    }

    pub async fn backoff(&self) -> f64 {
        self.inner.lock().await.backoff()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.inner.lock().await.snapshot()
    }
}

impl From<TamperEngine> for SharedTamperEngine {
    fn from(engine: TamperEngine) -> Self {
        Self::new(engine)
    }
}
