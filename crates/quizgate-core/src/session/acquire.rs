//! Question acquisition with a bounded retry budget.
//!
//! Acquisition runs as a [`FetchTask`] the driver polls next to its command
//! channel and tick interval, so the page keeps intercepting input while a
//! fetch (or a backoff pause) is in flight.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::FetchError;
use crate::question::{Question, QuestionAdapter};
use crate::quiz::QuizSession;
use crate::timer::RetryPolicy;

/// One failed attempt, kept for the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub attempt: u32,
    pub error: String,
    pub retry_in_secs: Option<u64>,
}

/// Result of a whole acquisition run.
#[derive(Debug)]
pub struct Acquisition {
    pub session_id: Uuid,
    pub attempts: u32,
    pub failures: Vec<FetchFailure>,
    pub result: Result<Question, FetchError>,
}

/// In-flight acquisition. Poll it by `&mut` to keep it alive across
/// `select!` iterations.
pub struct FetchTask {
    session_id: Uuid,
    inner: Pin<Box<dyn Future<Output = Acquisition> + Send>>,
}

impl FetchTask {
    pub(crate) fn spawn(adapter: Arc<Mutex<QuestionAdapter>>, retry: RetryPolicy, session_id: Uuid) -> Self {
        Self {
            session_id,
            inner: Box::pin(acquire(adapter, retry, session_id)),
        }
    }

    /// Acquisition outside any session, for one-off fetches.
    pub fn standalone(adapter: QuestionAdapter, retry: RetryPolicy) -> Self {
        Self::spawn(Arc::new(Mutex::new(adapter)), retry, Uuid::new_v4())
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl Future for FetchTask {
    type Output = Acquisition;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl std::fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchTask")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

async fn acquire(adapter: Arc<Mutex<QuestionAdapter>>, retry: RetryPolicy, session_id: Uuid) -> Acquisition {
    let mut adapter = adapter.lock().await;
    let max_attempts = retry.max_attempts.max(1);
    let mut failures = Vec::new();
    let mut last_error = FetchError::NoRows;

    for attempt in 1..=max_attempts {
        let result = adapter.fetch_one().await.and_then(|question| {
            QuizSession::validate_question(&question).map_err(|e| FetchError::InvalidRow {
                id: question.id.clone(),
                reason: e.to_string(),
            })?;
            Ok(question)
        });

        match result {
            Ok(question) => {
                tracing::info!(
                    %session_id,
                    attempt,
                    question_id = %question.id,
                    source = adapter.source_name(),
                    "question acquired"
                );
                return Acquisition {
                    session_id,
                    attempts: attempt,
                    failures,
                    result: Ok(question),
                };
            }
            Err(e) => {
                let delay = retry.delay_after(attempt, e.is_transport());
                tracing::warn!(
                    %session_id,
                    attempt,
                    max_attempts,
                    error = %e,
                    retry_in_secs = delay.map(|d| d.as_secs()),
                    "question fetch failed"
                );
                failures.push(FetchFailure {
                    attempt,
                    error: e.to_string(),
                    retry_in_secs: delay.map(|d| d.as_secs()),
                });
                last_error = e;
                match delay {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => break,
                }
            }
        }
    }

    tracing::error!(%session_id, max_attempts, error = %last_error, "question acquisition exhausted");
    Acquisition {
        session_id,
        attempts: max_attempts,
        failures,
        result: Err(last_error),
    }
}
