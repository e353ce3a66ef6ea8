//! Renderer that draws into a [`MemoryPage`] and records every call.
//!
//! Clones share state, so a test (or the CLI simulator) can keep one clone
//! while the orchestrator owns the other.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Feedback, ModalInputs, ModalRenderer};
use crate::block::{HostPage, MemoryPage, ModalHandle, NodeId, OverlayHandle, Rect};
use crate::question::Question;

/// Modal bounds inside the viewport.
pub const MODAL_RECT: Rect = Rect {
    x: 300.0,
    y: 200.0,
    width: 400.0,
    height: 300.0,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Mount { question_id: String, modal: ModalHandle },
    Unmount { modal: ModalHandle },
    Feedback(Feedback),
    InputEnabled(bool),
    Countdown(String),
    Status(String),
}

#[derive(Debug, Default)]
struct RenderState {
    calls: Vec<RecordedCall>,
    mounted: Option<ModalHandle>,
    answer_field: Option<NodeId>,
    inputs: Option<ModalInputs>,
    input_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    page: MemoryPage,
    state: Arc<Mutex<RenderState>>,
}

impl RecordingRenderer {
    pub fn new(page: MemoryPage) -> Self {
        Self {
            page,
            state: Arc::new(Mutex::new(RenderState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, RenderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn mounted(&self) -> Option<ModalHandle> {
        self.state().mounted
    }

    /// Answer input element inside the mounted modal.
    pub fn answer_field(&self) -> Option<NodeId> {
        self.state().answer_field
    }

    /// Input registration of the mounted modal.
    pub fn inputs(&self) -> Option<ModalInputs> {
        self.state().inputs.clone()
    }

    pub fn input_enabled(&self) -> bool {
        self.state().input_enabled
    }

    pub fn last_feedback(&self) -> Option<Feedback> {
        self.state().calls.iter().rev().find_map(|call| match call {
            RecordedCall::Feedback(f) => Some(f.clone()),
            _ => None,
        })
    }

    pub fn countdowns(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Countdown(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Status(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ModalRenderer for RecordingRenderer {
    fn mount(&mut self, question: &Question, overlay: OverlayHandle, inputs: ModalInputs) -> ModalHandle {
        let root = self.page.append_child(overlay.node(), "modal", Some(MODAL_RECT));
        self.page.append_child(root, "question", None);
        for (i, choice) in question.choices.iter().enumerate() {
            self.page.append_child(root, &format!("choice:{i}:{choice}"), None);
        }
        let field = self.page.append_child(root, "answer", None);
        self.page.append_child(root, "submit", None);

        let modal = ModalHandle::new(root);
        let mut state = self.state();
        state.mounted = Some(modal);
        state.answer_field = Some(field);
        state.inputs = Some(inputs);
        state.calls.push(RecordedCall::Mount {
            question_id: question.id.clone(),
            modal,
        });
        modal
    }

    fn unmount(&mut self, modal: ModalHandle) {
        self.page.remove_node(modal.node());
        let mut state = self.state();
        if state.mounted == Some(modal) {
            state.mounted = None;
            state.answer_field = None;
            state.inputs = None;
            state.input_enabled = false;
        }
        state.calls.push(RecordedCall::Unmount { modal });
    }

    fn show_feedback(&mut self, _modal: ModalHandle, feedback: &Feedback) {
        self.state().calls.push(RecordedCall::Feedback(feedback.clone()));
    }

    fn set_input_enabled(&mut self, _modal: ModalHandle, enabled: bool) {
        let mut state = self.state();
        state.input_enabled = enabled;
        state.calls.push(RecordedCall::InputEnabled(enabled));
    }

    fn show_countdown(&mut self, _modal: ModalHandle, text: &str) {
        self.state().calls.push(RecordedCall::Countdown(text.to_string()));
    }

    fn show_status(&mut self, _overlay: OverlayHandle, text: &str) {
        self.state().calls.push(RecordedCall::Status(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::tests::sample_question;
    use crate::render::RegistrationId;

    #[test]
    fn mount_builds_modal_under_overlay_and_unmount_removes_it() {
        let mut page = MemoryPage::new();
        let overlay = OverlayHandle::new(page.create_overlay());
        let mut renderer = RecordingRenderer::new(page.clone());

        let modal = renderer.mount(
            &sample_question(),
            overlay,
            ModalInputs::new(RegistrationId(1), None),
        );
        assert!(page.contains(overlay.node(), modal.node()));
        assert_eq!(page.count_labelled("submit"), 1);
        assert!(renderer.inputs().is_some());

        renderer.unmount(modal);
        assert!(!page.exists(modal.node()));
        assert!(renderer.mounted().is_none());
        assert!(renderer.inputs().is_none());
    }
}
