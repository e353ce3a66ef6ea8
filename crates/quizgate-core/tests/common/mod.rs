//! Shared fixtures for session tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quizgate_core::block::{MemoryPage, NodeId, Rect};
use quizgate_core::question::{QuestionAdapter, QuestionFilter, QuestionRow, QuestionSource};
use quizgate_core::render::RecordingRenderer;
use quizgate_core::session::{SessionOrchestrator, SessionSettings};
use quizgate_core::storage::MemoryStore;
use quizgate_core::FetchError;
use serde_json::json;

/// "What is 2 + 3?" with choices 4 / 5 / 6; the answer is B.
pub fn arithmetic_row() -> QuestionRow {
    serde_json::from_value(json!({
        "id": "q-add",
        "question": "What is 2 + 3?",
        "type": "single_choice",
        "choice1": "4",
        "choice2": "5",
        "choice3": "6",
        "answer": 2,
        "explanation": "Two plus three is five.",
        "difficulty": "easy",
        "tag": "arithmetic",
    }))
    .unwrap()
}

/// "How many sides does a hexagon have?", answered with a number.
pub fn numeric_row() -> QuestionRow {
    serde_json::from_value(json!({
        "id": "q-hex",
        "question": "How many sides does a hexagon have?",
        "type": "numeric",
        "answer": 6,
    }))
    .unwrap()
}

/// A choice question left with a single usable choice.
pub fn one_choice_row() -> QuestionRow {
    serde_json::from_value(json!({
        "id": "q-broken",
        "question": "Pick one",
        "type": "single_choice",
        "choice1": "only",
        "choice2": "  ",
        "answer": 1,
    }))
    .unwrap()
}

/// Source that plays back scripted results, then serves the arithmetic row.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<Vec<QuestionRow>, FetchError>>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<QuestionRow>, FetchError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing(times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(Vec::new())).collect())
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, _filter: &QuestionFilter) -> Result<Vec<QuestionRow>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(vec![arithmetic_row()]))
    }
}

pub struct Fixture {
    pub orchestrator: SessionOrchestrator<MemoryPage, RecordingRenderer>,
    pub page: MemoryPage,
    pub renderer: RecordingRenderer,
    /// A link on the host page, outside anything the quiz draws.
    pub link: NodeId,
}

pub fn fixture(source: impl QuestionSource + 'static) -> Fixture {
    fixture_with(source, SessionSettings::default())
}

pub fn fixture_with(source: impl QuestionSource + 'static, settings: SessionSettings) -> Fixture {
    let page = MemoryPage::new();
    let link = page.append_child(MemoryPage::BODY, "link", Some(Rect::new(0.0, 0.0, 80.0, 20.0)));
    let renderer = RecordingRenderer::new(page.clone());
    let adapter = QuestionAdapter::with_seed(Box::new(source), QuestionFilter::default(), 1);
    let orchestrator = SessionOrchestrator::new(
        settings,
        adapter,
        page.clone(),
        renderer.clone(),
        Box::new(MemoryStore::new()),
    );
    Fixture {
        orchestrator,
        page,
        renderer,
        link,
    }
}
