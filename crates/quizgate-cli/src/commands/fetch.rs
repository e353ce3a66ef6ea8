use clap::Args;
use quizgate_core::session::FetchTask;
use quizgate_core::Config;

use crate::common::{build_adapter, runtime};

#[derive(Args)]
pub struct FetchArgs {
    /// Use the built-in question bank instead of the repository
    #[arg(long)]
    offline: bool,
}

pub fn run(args: FetchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let adapter = build_adapter(&config, args.offline)?;
    let task = FetchTask::standalone(adapter, config.fetch.retry_policy());
    let acquisition = runtime()?.block_on(task);

    for failure in &acquisition.failures {
        tracing::warn!(attempt = failure.attempt, error = %failure.error, "fetch attempt failed");
    }
    let question = acquisition.result?;
    println!("{}", serde_json::to_string_pretty(&question)?);
    Ok(())
}
