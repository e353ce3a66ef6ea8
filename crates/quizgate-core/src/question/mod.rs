//! Question records and their shape invariants.
//!
//! A [`Question`] is immutable for the lifetime of a quiz session. Rows coming
//! from the remote repository are normalized into this shape by
//! [`source::normalize_row`]; anything that fails [`Question::validate`] is
//! discarded before it can reach the session state.

mod fixed;
mod rest;
mod source;

pub use fixed::StaticQuestionSource;
pub use rest::RestQuestionSource;
pub use source::{normalize_row, QuestionAdapter, QuestionFilter, QuestionRow, QuestionSource};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick one of the lettered choices.
    SingleChoice,
    /// Type a literal numeric answer.
    Numeric,
}

impl QuestionKind {
    /// Parse the repository's `type` column.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single_choice" | "single-choice" | "multiple_choice" | "multiple-choice" | "mcq"
            | "choice" => Some(QuestionKind::SingleChoice),
            "numeric" | "number" | "numerical" => Some(QuestionKind::Numeric),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub kind: QuestionKind,
    /// Filtered, non-blank choices. Empty for numeric questions.
    #[serde(default)]
    pub choices: Vec<String>,
    /// A choice letter ("A".."D") or the literal numeric answer.
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tag: String,
}

impl Question {
    /// Letter shown next to the choice at `index` (0 -> "A").
    pub fn choice_label(index: usize) -> Option<char> {
        u8::try_from(index)
            .ok()
            .filter(|i| *i < 26)
            .map(|i| char::from(b'A' + i))
    }

    /// Inverse of [`Question::choice_label`], case-insensitive.
    pub fn label_index(label: &str) -> Option<usize> {
        let mut chars = label.trim().chars();
        let c = chars.next()?;
        if chars.next().is_some() || !c.is_ascii_alphabetic() {
            return None;
        }
        Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
    }

    /// Text of the correct choice, or the literal answer for numeric questions.
    pub fn correct_choice_text(&self) -> Option<&str> {
        match self.kind {
            QuestionKind::Numeric => Some(self.correct_answer.as_str()),
            QuestionKind::SingleChoice => Self::label_index(&self.correct_answer)
                .and_then(|i| self.choices.get(i))
                .map(String::as_str),
        }
    }

    /// Check the shape invariants every accepted question must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyField("text"));
        }
        if self.correct_answer.trim().is_empty() {
            return Err(ValidationError::EmptyField("correct_answer"));
        }
        if self.kind == QuestionKind::SingleChoice {
            if self.choices.len() < 2 {
                return Err(ValidationError::TooFewChoices {
                    found: self.choices.len(),
                });
            }
            match Self::label_index(&self.correct_answer) {
                Some(i) if i < self.choices.len() => {}
                _ => {
                    return Err(ValidationError::AnswerOutOfRange {
                        answer: self.correct_answer.clone(),
                        len: self.choices.len(),
                    })
                }
            }
        }
        Ok(())
    }
}
