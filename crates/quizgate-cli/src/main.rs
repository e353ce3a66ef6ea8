use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "quizgate", version, about = "QuizGate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print whether a quiz is due, as JSON
    Status,
    /// Fetch one question and print it as JSON
    Fetch(commands::fetch::FetchArgs),
    /// Run a full quiz session against an in-memory page
    Simulate(commands::simulate::SimulateArgs),
    /// Record a quiz completion now
    MarkComplete,
    /// Forget the last quiz completion
    Reset,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Config { action } => commands::config::run(action),
        Commands::Status => commands::status::run(),
        Commands::Fetch(args) => commands::fetch::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::MarkComplete => commands::completion::mark_complete(),
        Commands::Reset => commands::completion::reset(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
