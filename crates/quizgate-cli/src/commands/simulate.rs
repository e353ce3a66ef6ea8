//! Full session against an in-memory page: block, fetch, answer, count down,
//! unblock. Countdowns are ticked back to back, so the run is instant.

use clap::Args;
use quizgate_core::block::{InputEvent, MemoryPage};
use quizgate_core::session::{SessionOrchestrator, SessionPhase, SessionSettings};
use quizgate_core::storage::{Database, KeyValueStore, MemoryStore};
use quizgate_core::{Config, Question, RecordingRenderer};

use crate::common::{build_adapter, runtime};

#[derive(Args)]
pub struct SimulateArgs {
    /// Answers to submit in order (letters for choice questions)
    #[arg(long = "answer", required = true)]
    answers: Vec<String>,
    /// Use the built-in question bank instead of the repository
    #[arg(long)]
    offline: bool,
    /// Click outside the modal once the answer is accepted
    #[arg(long)]
    click_outside: bool,
    /// Keep the completion out of the database
    #[arg(long)]
    dry_run: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let adapter = build_adapter(&config, args.offline)?;
    let store: Box<dyn KeyValueStore> = if args.dry_run {
        Box::new(MemoryStore::new())
    } else {
        Box::new(Database::open()?)
    };

    let page = MemoryPage::new();
    let renderer = RecordingRenderer::new(page.clone());
    let mut orch = SessionOrchestrator::new(
        SessionSettings::from_config(&config),
        adapter,
        page,
        renderer.clone(),
        store,
    );

    let task = orch.force_quiz()?;
    let acquisition = runtime()?.block_on(task);
    orch.complete_fetch(acquisition);

    if let Some(question) = orch.quiz().current_question() {
        tracing::info!(question_id = %question.id, "question: {}", question.text);
        for (i, choice) in question.choices.iter().enumerate() {
            if let Some(label) = Question::choice_label(i) {
                tracing::info!("  {label}) {choice}");
            }
        }
    }

    for answer in &args.answers {
        if orch.phase() != SessionPhase::Presenting {
            break;
        }
        let outcome = orch.submit_answer(answer);
        let feedback = renderer.last_feedback().map(|f| f.message()).unwrap_or_default();
        tracing::info!(answer = %answer, ?outcome, "{feedback}");
    }

    if args.click_outside {
        if let Some(overlay) = orch.block().overlay() {
            let disposition = orch.handle_input(&InputEvent::click(overlay.node()));
            tracing::info!(?disposition, "outside click");
        }
    }

    match orch.phase() {
        SessionPhase::Presenting => {
            tracing::warn!("no answer accepted, abandoning session");
            orch.shutdown();
        }
        _ => {
            while orch.phase().is_active() {
                orch.tick();
            }
        }
    }

    for event in orch.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
