use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::CountdownPurpose;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Review time ran out after a correct answer.
    ReviewElapsed,
    /// User clicked outside the modal while reviewing.
    ClosedDuringReview,
    /// Cooldown after the last failed attempt ran out.
    CooldownElapsed,
    /// No question could be acquired; the error timeout ran out.
    FetchFailed,
    /// The driver shut down mid-session.
    Aborted,
}

impl EndReason {
    pub fn answered_correctly(self) -> bool {
        matches!(self, EndReason::ReviewElapsed | EndReason::ClosedDuringReview)
    }

    /// Whether the end counts as a completed quiz for the due check.
    pub fn counts_as_completion(self) -> bool {
        !matches!(self, EndReason::FetchFailed | EndReason::Aborted)
    }
}

/// Reported when a session ends, for statistics consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub correct: bool,
    /// Submissions used, including the correct one.
    pub attempts: u32,
    pub question_id: Option<String>,
}

/// Every state change in a session produces an Event.
/// Front ends drain them for display; companions receive the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        forced: bool,
        at: DateTime<Utc>,
    },
    PageBlocked {
        at: DateTime<Utc>,
    },
    FetchAttemptFailed {
        attempt: u32,
        error: String,
        retry_in_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    FetchExhausted {
        attempts: u32,
        at: DateTime<Utc>,
    },
    QuestionPresented {
        question_id: String,
        max_attempts: u32,
        at: DateTime<Utc>,
    },
    AnswerEvaluated {
        question_id: String,
        correct: bool,
        attempts: u32,
        remaining_attempts: u32,
        at: DateTime<Utc>,
    },
    InstructionsToggled {
        visible: bool,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        purpose: CountdownPurpose,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownTick {
        purpose: CountdownPurpose,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PageUnblocked {
        at: DateTime<Utc>,
    },
    SessionCompleted {
        outcome: SessionOutcome,
        reason: EndReason,
        at: DateTime<Utc>,
    },
}
