mod countdown;
mod retry;
mod schedule;

pub use countdown::{Countdown, CountdownEvent, CountdownId, CountdownPurpose};
pub use retry::RetryPolicy;
pub use schedule::QuizSchedule;
