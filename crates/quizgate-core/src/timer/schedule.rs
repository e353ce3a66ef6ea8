//! When a quiz is due.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A quiz is due when no completion has been recorded yet, or when at least
/// `interval` has elapsed since the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSchedule {
    pub interval_minutes: u32,
}

impl QuizSchedule {
    pub fn new(interval_minutes: u32) -> Self {
        Self { interval_minutes }
    }

    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }

    pub fn is_due(&self, last_completed: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_completed {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.interval(),
        }
    }

    /// Time of the next due quiz, `None` if one is due already.
    pub fn next_due(
        &self,
        last_completed: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let last = last_completed?;
        let due_at = last + self.interval();
        (due_at > now).then_some(due_at)
    }
}

impl Default for QuizSchedule {
    fn default() -> Self {
        Self::new(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_without_history() {
        assert!(QuizSchedule::default().is_due(None, Utc::now()));
    }

    #[test]
    fn due_after_interval_elapses() {
        let schedule = QuizSchedule::new(30);
        let last = Utc::now();
        assert!(!schedule.is_due(Some(last), last + Duration::minutes(29)));
        assert!(schedule.is_due(Some(last), last + Duration::minutes(30)));
        assert_eq!(
            schedule.next_due(Some(last), last + Duration::minutes(10)),
            Some(last + Duration::minutes(30))
        );
        assert_eq!(schedule.next_due(Some(last), last + Duration::hours(1)), None);
    }

    #[test]
    fn clock_skew_is_not_due() {
        let schedule = QuizSchedule::new(5);
        let last = Utc::now();
        assert!(!schedule.is_due(Some(last), last - Duration::minutes(1)));
    }
}
