//! Session orchestrator: the single owner of every piece of quiz state.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle -> Fetching -> Presenting -> Reviewing -> Idle
//!                  |             \-> Cooldown  -> Idle
//!                  \-> Failed ----------------> Idle
//! ```
//!
//! Every exit path funnels through one teardown: cancel the countdown,
//! unmount the modal, unblock the page, reset the quiz state, record the
//! completion (unless acquisition failed) and report the outcome.
//!
//! The orchestrator does no waiting of its own. Fetching is handed back to
//! the caller as a [`FetchTask`]; time advances through [`SessionOrchestrator::tick`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::acquire::{Acquisition, FetchTask};
use super::driver::SessionCommand;
use crate::block::{BlockController, BlockPhase, Disposition, HostPage, InputEvent, ModalHandle};
use crate::companions::CompanionSet;
use crate::error::{FetchError, SessionError};
use crate::events::{EndReason, Event, SessionOutcome};
use crate::question::{Question, QuestionAdapter, QuestionKind};
use crate::quiz::QuizSession;
use crate::render::{Feedback, ModalAction, ModalInputs, ModalRenderer, RegistrationId};
use crate::storage::{self, Config, KeyValueStore, QuizConfig};
use crate::timer::{Countdown, CountdownEvent, CountdownPurpose, QuizSchedule, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Fetching,
    Presenting,
    Reviewing,
    Cooldown,
    Failed,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        self != SessionPhase::Idle
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Fetching => "fetching",
            SessionPhase::Presenting => "presenting",
            SessionPhase::Reviewing => "reviewing",
            SessionPhase::Cooldown => "cooldown",
            SessionPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// No question is awaiting an answer.
    Ignored,
    /// Blank input; no attempt was used.
    EmptyInput,
    Correct,
    Incorrect { remaining_attempts: u32 },
    /// Last attempt used; the answer was disclosed and cooldown started.
    Exhausted,
}

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub block: BlockPhase,
    pub session_id: Option<Uuid>,
    pub question_id: Option<String>,
    pub attempts: u32,
    pub remaining_attempts: u32,
    pub countdown_secs: Option<u64>,
}

/// Timing and budget knobs, taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub quiz: QuizConfig,
    pub retry: RetryPolicy,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            quiz: config.quiz.clone(),
            retry: config.fetch.retry_policy(),
        }
    }

    pub fn schedule(&self) -> QuizSchedule {
        QuizSchedule::new(self.quiz.interval_minutes)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct SessionOrchestrator<P: HostPage, R: ModalRenderer> {
    settings: SessionSettings,
    adapter: Arc<Mutex<QuestionAdapter>>,
    quiz: QuizSession,
    block: BlockController<P>,
    renderer: R,
    store: Box<dyn KeyValueStore>,
    companions: CompanionSet,
    countdown: Countdown,
    phase: SessionPhase,
    session_id: Option<Uuid>,
    modal: Option<ModalHandle>,
    registration: Option<RegistrationId>,
    next_registration: u64,
    commands: Option<mpsc::WeakUnboundedSender<SessionCommand>>,
    instructions_visible: bool,
    countdown_restarted: bool,
    events: Vec<Event>,
}

impl<P: HostPage, R: ModalRenderer> SessionOrchestrator<P, R> {
    pub fn new(
        settings: SessionSettings,
        adapter: QuestionAdapter,
        page: P,
        renderer: R,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let quiz = QuizSession::new(settings.quiz.max_attempts);
        Self {
            settings,
            adapter: Arc::new(Mutex::new(adapter)),
            quiz,
            block: BlockController::new(page),
            renderer,
            store,
            companions: CompanionSet::new(),
            countdown: Countdown::new(),
            phase: SessionPhase::Idle,
            session_id: None,
            modal: None,
            registration: None,
            next_registration: 1,
            commands: None,
            instructions_visible: false,
            countdown_restarted: false,
            events: Vec::new(),
        }
    }

    pub fn with_companions(mut self, companions: CompanionSet) -> Self {
        self.companions = companions;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    pub fn block(&self) -> &BlockController<P> {
        &self.block
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn instructions_visible(&self) -> bool {
        self.instructions_visible
    }

    /// Registration of the mounted modal's inputs, if one is mounted.
    pub fn active_registration(&self) -> Option<RegistrationId> {
        self.registration
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            block: self.block.phase(),
            session_id: self.session_id,
            question_id: self.quiz.current_question().map(|q| q.id.clone()),
            attempts: self.quiz.attempts(),
            remaining_attempts: self.quiz.remaining_attempts(),
            countdown_secs: self.countdown.remaining_secs(),
        }
    }

    /// Last recorded completion. An unreadable value counts as no completion.
    pub fn last_completed(&self) -> Option<DateTime<Utc>> {
        match storage::last_completed(self.store.as_ref()) {
            Ok(last) => last,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable completion timestamp");
                None
            }
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.settings.schedule().is_due(self.last_completed(), now)
    }

    /// Take every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session if the interval since the last completion has elapsed.
    ///
    /// Returns the acquisition the caller must drive to completion and hand
    /// back through [`Self::complete_fetch`], or `None` when nothing is due.
    pub fn start_if_due(&mut self, now: DateTime<Utc>) -> Result<Option<FetchTask>, SessionError> {
        self.ensure_idle()?;
        if !self.is_due(now) {
            tracing::debug!("quiz not due yet");
            return Ok(None);
        }
        Ok(Some(self.begin(false)))
    }

    /// Start a session regardless of the schedule.
    pub fn force_quiz(&mut self) -> Result<FetchTask, SessionError> {
        self.ensure_idle()?;
        Ok(self.begin(true))
    }

    /// Accept the result of an acquisition started by this orchestrator.
    pub fn complete_fetch(&mut self, acquisition: Acquisition) {
        if self.phase != SessionPhase::Fetching || self.session_id != Some(acquisition.session_id) {
            tracing::warn!(
                session_id = %acquisition.session_id,
                phase = %self.phase,
                "dropping acquisition for inactive session"
            );
            return;
        }
        let now = Utc::now();
        for failure in &acquisition.failures {
            self.events.push(Event::FetchAttemptFailed {
                attempt: failure.attempt,
                error: failure.error.clone(),
                retry_in_secs: failure.retry_in_secs,
                at: now,
            });
        }
        match acquisition.result {
            Ok(question) => self.present(question, acquisition.attempts),
            Err(e) => self.fail(acquisition.attempts, &e),
        }
        self.debug_check();
    }

    /// Evaluate an answer for the presented question.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerOutcome {
        let outcome = self.evaluate(answer);
        self.debug_check();
        outcome
    }

    /// Route an action reported by a modal's input registration. Actions
    /// from a registration that is no longer mounted are dropped.
    pub fn handle_modal_action(
        &mut self,
        registration: RegistrationId,
        action: ModalAction,
    ) -> Option<AnswerOutcome> {
        if self.registration != Some(registration) {
            tracing::debug!(?registration, "dropping input from stale modal");
            return None;
        }
        match action {
            ModalAction::Submit { answer } => Some(self.submit_answer(&answer)),
            ModalAction::ToggleInstructions { visible } => {
                self.toggle_instructions(visible);
                None
            }
        }
    }

    /// Record instruction panel visibility. Has no other effect.
    pub fn toggle_instructions(&mut self, visible: bool) {
        if self.modal.is_none() {
            return;
        }
        self.instructions_visible = visible;
        tracing::debug!(visible, "instructions toggled");
        self.events.push(Event::InstructionsToggled {
            visible,
            at: Utc::now(),
        });
    }

    /// Run the interception policy for one page event. An outside click while
    /// reviewing ends the session.
    pub fn handle_input(&mut self, event: &InputEvent) -> Disposition {
        let disposition = self.block.intercept(event);
        if disposition == Disposition::CloseRequested && self.phase == SessionPhase::Reviewing {
            tracing::info!("review closed by outside click");
            self.teardown(EndReason::ClosedDuringReview);
        }
        self.debug_check();
        disposition
    }

    /// Advance the live countdown by one second.
    pub fn tick(&mut self) {
        if let Some(event) = self.countdown.tick() {
            self.on_countdown(event);
        }
        self.debug_check();
    }

    /// End any running session without recording a completion.
    pub fn shutdown(&mut self) {
        if self.phase.is_active() {
            self.teardown(EndReason::Aborted);
        }
    }

    /// Only a weak sender is kept, so the driver still sees its channel
    /// close once every handle and mounted modal is gone.
    pub(crate) fn attach_commands(&mut self, commands: &mpsc::UnboundedSender<SessionCommand>) {
        self.commands = Some(commands.downgrade());
    }

    /// Whether a countdown started since the last call. The driver realigns
    /// its one-second interval so the first decrement lands a full second
    /// after the start.
    pub(crate) fn take_countdown_restarted(&mut self) -> bool {
        std::mem::take(&mut self.countdown_restarted)
    }

    // ── Transitions ──────────────────────────────────────────────────

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.phase.is_active() {
            tracing::warn!(phase = %self.phase, "quiz request refused, session already active");
            return Err(SessionError::AlreadyActive {
                phase: self.phase.to_string(),
            });
        }
        Ok(())
    }

    fn begin(&mut self, forced: bool) -> FetchTask {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        self.session_id = Some(session_id);
        self.phase = SessionPhase::Fetching;
        self.quiz = QuizSession::new(self.settings.quiz.max_attempts);
        self.instructions_visible = false;

        self.events.push(Event::SessionStarted {
            session_id,
            forced,
            at: now,
        });
        if self.block.block() {
            self.events.push(Event::PageBlocked { at: now });
        }
        if let Some(overlay) = self.block.overlay() {
            self.renderer.show_status(overlay, "Loading question...");
        }
        self.companions.session_started(forced);
        tracing::info!(%session_id, forced, "quiz session started");

        FetchTask::spawn(self.adapter.clone(), self.settings.retry, session_id)
    }

    fn present(&mut self, question: Question, attempts: u32) {
        if let Err(e) = self.quiz.set_current_question(question) {
            self.fail(attempts, &FetchError::InvalidRow {
                id: String::new(),
                reason: e.to_string(),
            });
            return;
        }
        let Some(overlay) = self.block.overlay() else {
            tracing::error!("overlay missing while presenting");
            self.teardown(EndReason::Aborted);
            return;
        };
        let Some(question) = self.quiz.current_question() else {
            return;
        };

        let registration = RegistrationId(self.next_registration);
        self.next_registration += 1;
        let commands = self.commands.as_ref().and_then(mpsc::WeakUnboundedSender::upgrade);
        let inputs = ModalInputs::new(registration, commands);
        let modal = self.renderer.mount(question, overlay, inputs);
        let question_id = question.id.clone();

        self.block.attach_modal(modal);
        self.modal = Some(modal);
        self.registration = Some(registration);
        self.renderer.set_input_enabled(modal, true);
        self.phase = SessionPhase::Presenting;

        tracing::info!(%question_id, "question presented");
        self.events.push(Event::QuestionPresented {
            question_id,
            max_attempts: self.quiz.max_attempts(),
            at: Utc::now(),
        });
    }

    fn fail(&mut self, attempts: u32, error: &FetchError) {
        self.phase = SessionPhase::Failed;
        self.events.push(Event::FetchExhausted {
            attempts,
            at: Utc::now(),
        });
        tracing::error!(attempts, %error, "no question available, showing error");
        self.start_countdown(self.settings.quiz.error_timeout_secs, CountdownPurpose::ErrorTimeout);
    }

    fn evaluate(&mut self, answer: &str) -> AnswerOutcome {
        if self.phase != SessionPhase::Presenting {
            tracing::debug!(phase = %self.phase, "answer ignored");
            return AnswerOutcome::Ignored;
        }
        let (Some(modal), Some(question)) = (self.modal, self.quiz.current_question().cloned()) else {
            return AnswerOutcome::Ignored;
        };
        if answer.trim().is_empty() {
            self.renderer.show_feedback(modal, &Feedback::EmptyAnswer);
            return AnswerOutcome::EmptyInput;
        }

        self.renderer.set_input_enabled(modal, false);
        let correct = self.quiz.check_answer(answer);
        let attempts = if correct {
            self.quiz.attempts() + 1
        } else {
            self.quiz.increment_attempts()
        };
        let remaining_attempts = self.quiz.remaining_attempts();
        tracing::info!(question_id = %question.id, correct, attempts, remaining_attempts, "answer evaluated");
        self.companions.answer(&question, correct, attempts);
        self.events.push(Event::AnswerEvaluated {
            question_id: question.id.clone(),
            correct,
            attempts,
            remaining_attempts,
            at: Utc::now(),
        });

        if correct {
            self.renderer.show_feedback(
                modal,
                &Feedback::Correct {
                    explanation: question.explanation.clone(),
                },
            );
            self.phase = SessionPhase::Reviewing;
            self.set_reviewing(true);
            self.start_countdown(self.settings.quiz.review_secs, CountdownPurpose::Review);
            return AnswerOutcome::Correct;
        }

        if self.quiz.has_remaining_attempts() {
            self.renderer
                .show_feedback(modal, &Feedback::Incorrect { remaining_attempts });
            self.renderer.set_input_enabled(modal, true);
            return AnswerOutcome::Incorrect { remaining_attempts };
        }

        // A numeric answer is its own text.
        let correct_text = match question.kind {
            QuestionKind::Numeric => None,
            QuestionKind::SingleChoice => question.correct_choice_text().map(str::to_string),
        };
        self.renderer.show_feedback(
            modal,
            &Feedback::Exhausted {
                correct_answer: question.correct_answer.clone(),
                correct_text,
                explanation: question.explanation.clone(),
            },
        );
        self.phase = SessionPhase::Cooldown;
        self.start_countdown(self.settings.quiz.cooldown_secs, CountdownPurpose::Cooldown);
        AnswerOutcome::Exhausted
    }

    /// Quiz state and block controller always change review mode together.
    fn set_reviewing(&mut self, reviewing: bool) {
        self.quiz.set_reviewing(reviewing);
        self.block.set_review_mode(reviewing);
    }

    fn start_countdown(&mut self, secs: u64, purpose: CountdownPurpose) {
        self.events.push(Event::CountdownStarted {
            purpose,
            duration_secs: secs,
            at: Utc::now(),
        });
        let first = self.countdown.start(secs, purpose);
        self.countdown_restarted = true;
        self.on_countdown(first);
    }

    fn on_countdown(&mut self, event: CountdownEvent) {
        match event {
            CountdownEvent::Tick {
                purpose,
                remaining_secs,
                ..
            } => {
                self.events.push(Event::CountdownTick {
                    purpose,
                    remaining_secs,
                    at: Utc::now(),
                });
                let text = self.countdown_text(purpose, remaining_secs);
                match (self.modal, self.block.overlay()) {
                    (Some(modal), _) => self.renderer.show_countdown(modal, &text),
                    (None, Some(overlay)) => self.renderer.show_status(overlay, &text),
                    (None, None) => {}
                }
            }
            CountdownEvent::Completed { purpose, .. } => {
                let reason = match purpose {
                    CountdownPurpose::Review => EndReason::ReviewElapsed,
                    CountdownPurpose::Cooldown => EndReason::CooldownElapsed,
                    CountdownPurpose::ErrorTimeout => EndReason::FetchFailed,
                };
                self.teardown(reason);
            }
        }
    }

    fn countdown_text(&self, purpose: CountdownPurpose, secs: u64) -> String {
        match purpose {
            CountdownPurpose::Review => format!("Closing in {secs}s. Click outside to close now."),
            CountdownPurpose::Cooldown => self.settings.quiz.cooldown_text(secs),
            CountdownPurpose::ErrorTimeout => {
                format!("Could not load a question. The page unlocks in {secs}s.")
            }
        }
    }

    fn teardown(&mut self, reason: EndReason) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        let now = Utc::now();

        self.countdown.cancel();
        if let Some(modal) = self.modal.take() {
            self.renderer.unmount(modal);
            self.block.detach_modal();
        }
        self.registration = None;
        if self.block.unblock() {
            self.events.push(Event::PageUnblocked { at: now });
        }

        let correct = reason.answered_correctly();
        let outcome = SessionOutcome {
            session_id,
            correct,
            attempts: self.quiz.attempts() + u32::from(correct),
            question_id: self.quiz.current_question().map(|q| q.id.clone()),
        };
        self.quiz.reset();
        self.phase = SessionPhase::Idle;
        self.instructions_visible = false;

        if reason.counts_as_completion() {
            if let Err(e) = storage::record_completed(self.store.as_mut(), now) {
                tracing::warn!(error = %e, "failed to record quiz completion");
            }
        }
        self.companions.session_complete(&outcome);
        tracing::info!(%session_id, ?reason, correct, attempts = outcome.attempts, "quiz session ended");
        self.events.push(Event::SessionCompleted {
            outcome,
            reason,
            at: now,
        });
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.quiz.is_reviewing(), self.block.is_reviewing());
        debug_assert_eq!(self.phase.is_active(), self.block.is_blocked());
        debug_assert!(self.countdown.is_running() || self.phase != SessionPhase::Cooldown);
    }
}
