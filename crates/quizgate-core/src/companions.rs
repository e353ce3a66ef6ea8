//! Optional subsystems that observe sessions (experience points, streaks,
//! badges and the like).
//!
//! Companions are stateless from the core's point of view: every hook has a
//! no-op default, and a failing hook is logged and otherwise ignored so it can
//! never keep the page blocked.

use crate::events::SessionOutcome;
use crate::question::Question;

pub type CompanionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Every optional session observer implements this trait.
pub trait Companion: Send {
    /// Unique identifier used in logs.
    fn name(&self) -> &str;

    /// Called once the page is blocked for a new session.
    fn on_session_started(&mut self, _forced: bool) -> CompanionResult {
        Ok(()) // default no-op
    }

    /// Called after each evaluated (non-empty) answer.
    fn on_answer(&mut self, _question: &Question, _correct: bool, _attempts: u32) -> CompanionResult {
        Ok(()) // default no-op
    }

    /// Called when the session ends, whatever the exit path.
    fn on_session_complete(&mut self, _outcome: &SessionOutcome) -> CompanionResult {
        Ok(()) // default no-op
    }
}

/// Null companion: wired in when no optional subsystem is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompanions;

impl Companion for NoCompanions {
    fn name(&self) -> &str {
        "none"
    }
}

/// Fans hooks out to every registered companion.
#[derive(Default)]
pub struct CompanionSet {
    members: Vec<Box<dyn Companion>>,
}

impl CompanionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, companion: Box<dyn Companion>) -> Self {
        self.members.push(companion);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn session_started(&mut self, forced: bool) {
        self.each("on_session_started", |c| c.on_session_started(forced));
    }

    pub fn answer(&mut self, question: &Question, correct: bool, attempts: u32) {
        self.each("on_answer", |c| c.on_answer(question, correct, attempts));
    }

    pub fn session_complete(&mut self, outcome: &SessionOutcome) {
        self.each("on_session_complete", |c| c.on_session_complete(outcome));
    }

    fn each<F>(&mut self, hook: &str, mut f: F)
    where
        F: FnMut(&mut dyn Companion) -> CompanionResult,
    {
        for companion in &mut self.members {
            if let Err(e) = f(companion.as_mut()) {
                tracing::warn!(companion = companion.name(), hook, error = %e, "companion hook failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    struct Failing;

    impl Companion for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_session_complete(&mut self, _outcome: &SessionOutcome) -> CompanionResult {
            Err("storage offline".into())
        }
    }

    struct Counting(Arc<Mutex<u32>>);

    impl Companion for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn on_session_complete(&mut self, _outcome: &SessionOutcome) -> CompanionResult {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn failing_companion_does_not_stop_the_rest() {
        let count = Arc::new(Mutex::new(0));
        let mut set = CompanionSet::new()
            .with(Box::new(Failing))
            .with(Box::new(NoCompanions))
            .with(Box::new(Counting(count.clone())));
        set.session_complete(&SessionOutcome {
            session_id: Uuid::new_v4(),
            correct: true,
            attempts: 1,
            question_id: Some("q".into()),
        });
        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(set.len(), 3);
    }
}
