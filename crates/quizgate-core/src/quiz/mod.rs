mod state;

pub use state::{QuizSession, DEFAULT_MAX_ATTEMPTS};
