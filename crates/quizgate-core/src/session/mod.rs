mod acquire;
mod driver;
mod orchestrator;

pub use acquire::{Acquisition, FetchFailure, FetchTask};
pub use driver::{SessionCommand, SessionDriver, SessionHandle};
pub use orchestrator::{AnswerOutcome, SessionOrchestrator, SessionPhase, SessionSettings, SessionStatus};
