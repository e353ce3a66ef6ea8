//! Quiz attempt state for one session.
//!
//! Pure logic: no page access, no network, no clock. Everything here is
//! deterministic so the orchestrator's transitions can be tested in isolation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::question::Question;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    current_question: Option<Question>,
    attempts: u32,
    max_attempts: u32,
    is_reviewing: bool,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl QuizSession {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            current_question: None,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            is_reviewing: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempts)
    }

    pub fn has_remaining_attempts(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn is_reviewing(&self) -> bool {
        self.is_reviewing
    }

    /// Case-insensitive comparison against the stored answer. Always `false`
    /// when no question is set.
    pub fn check_answer(&self, user_answer: &str) -> bool {
        self.current_question.as_ref().is_some_and(|q| {
            q.correct_answer
                .trim()
                .eq_ignore_ascii_case(user_answer.trim())
        })
    }

    /// Shape gate applied before a question is accepted.
    pub fn validate_question(question: &Question) -> Result<(), ValidationError> {
        question.validate()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Accept a question and reset the attempt counter. Invalid questions are
    /// rejected and leave the state untouched.
    pub fn set_current_question(&mut self, question: Question) -> Result<(), ValidationError> {
        Self::validate_question(&question)?;
        self.current_question = Some(question);
        self.attempts = 0;
        self.is_reviewing = false;
        Ok(())
    }

    pub fn increment_attempts(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    pub fn set_reviewing(&mut self, reviewing: bool) {
        self.is_reviewing = reviewing;
    }

    pub fn reset(&mut self) {
        self.current_question = None;
        self.attempts = 0;
        self.is_reviewing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::tests::sample_question;
    use crate::question::QuestionKind;
    use proptest::prelude::*;

    fn session_with_sample() -> QuizSession {
        let mut session = QuizSession::default();
        session.set_current_question(sample_question()).unwrap();
        session
    }

    #[test]
    fn check_answer_without_question_is_false() {
        assert!(!QuizSession::default().check_answer("A"));
    }

    #[test]
    fn check_answer_is_case_insensitive() {
        let session = session_with_sample();
        assert!(session.check_answer("b"));
        assert!(session.check_answer("B"));
        assert!(session.check_answer(" b "));
        assert!(!session.check_answer("a"));
    }

    #[test]
    fn attempts_reset_only_on_new_question() {
        let mut session = session_with_sample();
        assert_eq!(session.increment_attempts(), 1);
        assert_eq!(session.increment_attempts(), 2);
        session.set_reviewing(true);
        assert_eq!(session.attempts(), 2);
        session.set_current_question(sample_question()).unwrap();
        assert_eq!(session.attempts(), 0);
        assert!(!session.is_reviewing());
    }

    #[test]
    fn exhaustion_boundary_at_max_attempts() {
        let mut session = session_with_sample();
        session.increment_attempts();
        assert!(session.has_remaining_attempts());
        session.increment_attempts();
        assert!(session.has_remaining_attempts());
        session.increment_attempts();
        assert!(!session.has_remaining_attempts());
        assert_eq!(session.remaining_attempts(), 0);
    }

    #[test]
    fn invalid_question_is_rejected_and_state_kept() {
        let mut session = session_with_sample();
        session.increment_attempts();
        let mut bad = sample_question();
        bad.text = "  ".into();
        assert_eq!(
            session.set_current_question(bad),
            Err(ValidationError::EmptyField("text"))
        );
        assert_eq!(session.current_question().unwrap().id, "q-1");
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = session_with_sample();
        session.increment_attempts();
        session.set_reviewing(true);
        session.reset();
        assert_eq!(session, QuizSession::default());
    }

    #[test]
    fn numeric_answers_compare_literally() {
        let mut session = QuizSession::default();
        session
            .set_current_question(Question {
                kind: QuestionKind::Numeric,
                choices: vec![],
                correct_answer: "1024".into(),
                ..sample_question()
            })
            .unwrap();
        assert!(session.check_answer("1024"));
        assert!(!session.check_answer("1024.0"));
    }

    proptest! {
        #[test]
        fn case_never_changes_the_verdict(answer in "[a-dA-D]") {
            let session = session_with_sample();
            prop_assert_eq!(
                session.check_answer(&answer.to_ascii_lowercase()),
                session.check_answer(&answer.to_ascii_uppercase())
            );
        }
    }
}
