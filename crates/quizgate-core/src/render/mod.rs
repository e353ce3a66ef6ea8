//! Modal rendering seam.
//!
//! The orchestrator never touches markup. It asks a [`ModalRenderer`] to mount
//! the question inside the overlay, to show feedback and countdowns, and to
//! unmount again. Whatever the renderer draws reports user input back through
//! the [`ModalInputs`] registration it was handed at mount time.

mod recording;

pub use recording::{RecordedCall, RecordingRenderer};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::block::{ModalHandle, OverlayHandle};
use crate::question::Question;
use crate::session::SessionCommand;

/// Identifies one mount's input registration. A new id is issued per mount,
/// so input arriving from an unmounted modal can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

/// User input reported by the modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModalAction {
    Submit { answer: String },
    ToggleInstructions { visible: bool },
}

/// Input registration handed to the renderer on mount.
#[derive(Debug, Clone)]
pub struct ModalInputs {
    registration: RegistrationId,
    commands: Option<mpsc::UnboundedSender<SessionCommand>>,
}

impl ModalInputs {
    pub(crate) fn new(
        registration: RegistrationId,
        commands: Option<mpsc::UnboundedSender<SessionCommand>>,
    ) -> Self {
        Self {
            registration,
            commands,
        }
    }

    pub fn registration(&self) -> RegistrationId {
        self.registration
    }

    /// Report a submitted answer. Returns `false` when no driver is listening.
    pub fn submit(&self, answer: impl Into<String>) -> bool {
        self.send(ModalAction::Submit {
            answer: answer.into(),
        })
    }

    pub fn toggle_instructions(&self, visible: bool) -> bool {
        self.send(ModalAction::ToggleInstructions { visible })
    }

    fn send(&self, action: ModalAction) -> bool {
        let Some(tx) = &self.commands else {
            return false;
        };
        tx.send(SessionCommand::Modal {
            registration: self.registration,
            action,
        })
        .is_ok()
    }
}

/// Result of an evaluated submission, as the modal should display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    EmptyAnswer,
    Correct {
        explanation: Option<String>,
    },
    Incorrect {
        remaining_attempts: u32,
    },
    /// Last attempt used: the correct answer is disclosed.
    Exhausted {
        correct_answer: String,
        correct_text: Option<String>,
        explanation: Option<String>,
    },
}

impl Feedback {
    pub fn message(&self) -> String {
        match self {
            Feedback::EmptyAnswer => "Please enter an answer.".to_string(),
            Feedback::Correct { explanation: None } => "Correct!".to_string(),
            Feedback::Correct {
                explanation: Some(text),
            } => format!("Correct! {text}"),
            Feedback::Incorrect { remaining_attempts } => {
                let plural = if *remaining_attempts == 1 { "" } else { "s" };
                format!("Incorrect. {remaining_attempts} attempt{plural} left.")
            }
            Feedback::Exhausted {
                correct_answer,
                correct_text,
                explanation,
            } => {
                let mut msg = match correct_text {
                    Some(text) => format!("The correct answer was {correct_answer}: {text}."),
                    None => format!("The correct answer was {correct_answer}."),
                };
                if let Some(explanation) = explanation {
                    msg.push(' ');
                    msg.push_str(explanation);
                }
                msg
            }
        }
    }
}

/// Draws the quiz modal inside the overlay.
pub trait ModalRenderer: Send {
    /// Mount the question and return the modal's root handle.
    fn mount(&mut self, question: &Question, overlay: OverlayHandle, inputs: ModalInputs) -> ModalHandle;

    /// Remove the modal and drop its input registration.
    fn unmount(&mut self, modal: ModalHandle);

    fn show_feedback(&mut self, modal: ModalHandle, feedback: &Feedback);

    fn set_input_enabled(&mut self, modal: ModalHandle, enabled: bool);

    /// Countdown line (review, cooldown). Drawn inside the modal.
    fn show_countdown(&mut self, modal: ModalHandle, text: &str);

    /// Status line drawn on the overlay itself while no modal is mounted
    /// (loading, fetch failure).
    fn show_status(&mut self, overlay: OverlayHandle, text: &str);
}
