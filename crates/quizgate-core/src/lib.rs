//! # Quizgate Core Library
//!
//! Core logic for Quizgate: periodically blocks a page behind a full-screen
//! overlay and only lets the user through once they have answered a quiz
//! question (or used up their attempts and sat out a short cooldown).
//!
//! ## Architecture
//!
//! - **Question source**: pulls one random question from a remote repository
//!   with a bounded retry budget, with a static bank for offline use
//! - **Block controller**: freezes the host page and filters every input event
//! - **Quiz state**: attempt counting and answer checking, free of side effects
//! - **Countdown**: tick-driven one-second countdown, one live at a time
//! - **Session**: the orchestrator that owns all of the above and the driver
//!   that runs it on a single task
//!
//! ## Key Components
//!
//! - [`SessionOrchestrator`]: session lifecycle state machine
//! - [`SessionDriver`] / [`SessionHandle`]: async runner and its handle
//! - [`BlockController`]: overlay and interception policy
//! - [`QuestionAdapter`]: random question selection over a [`QuestionSource`]
//! - [`Config`]: application configuration management

pub mod block;
pub mod companions;
pub mod error;
pub mod events;
pub mod question;
pub mod quiz;
pub mod render;
pub mod session;
pub mod storage;
pub mod timer;

pub use block::{BlockController, BlockPhase, Disposition, HostPage, InputEvent, MemoryPage};
pub use companions::{Companion, CompanionSet, NoCompanions};
pub use error::{ConfigError, CoreError, FetchError, SessionError, StorageError, ValidationError};
pub use events::{EndReason, Event, SessionOutcome};
pub use question::{
    Question, QuestionAdapter, QuestionFilter, QuestionKind, QuestionSource, RestQuestionSource,
    StaticQuestionSource,
};
pub use quiz::QuizSession;
pub use render::{Feedback, ModalInputs, ModalRenderer, RecordingRenderer};
pub use session::{
    AnswerOutcome, SessionDriver, SessionHandle, SessionOrchestrator, SessionPhase,
    SessionSettings, SessionStatus,
};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{Countdown, CountdownEvent, CountdownPurpose, QuizSchedule, RetryPolicy};
