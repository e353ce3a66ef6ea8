use quizgate_core::question::{QuestionAdapter, RestQuestionSource, StaticQuestionSource};
use quizgate_core::Config;

/// Adapter over the configured repository, or the built-in bank when offline.
pub fn build_adapter(config: &Config, offline: bool) -> Result<QuestionAdapter, Box<dyn std::error::Error>> {
    let filter = config.preferences.filter();
    if offline {
        return Ok(QuestionAdapter::new(Box::new(StaticQuestionSource::builtin()), filter));
    }
    let source = RestQuestionSource::new(&config.repository, config.fetch.request_timeout())?;
    Ok(QuestionAdapter::new(Box::new(source), filter))
}

pub fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}
