//! Question acquisition: the repository seam, row normalization and
//! uniform random selection.

use async_trait::async_trait;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Question, QuestionKind};
use crate::error::FetchError;

/// Preferred tags and difficulties. Empty lists mean "anything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFilter {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulties: Vec<String>,
}

impl QuestionFilter {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.difficulties.is_empty()
    }

    /// Whether a row passes this filter (used by in-memory sources).
    pub fn matches(&self, row: &QuestionRow) -> bool {
        let tag_ok = self.tags.is_empty()
            || row
                .tag
                .as_deref()
                .is_some_and(|t| self.tags.iter().any(|want| want.eq_ignore_ascii_case(t)));
        let difficulty_ok = self.difficulties.is_empty()
            || row.difficulty.as_deref().is_some_and(|d| {
                self.difficulties
                    .iter()
                    .any(|want| want.eq_ignore_ascii_case(d))
            });
        tag_ok && difficulty_ok
    }
}

/// A question row exactly as the repository returns it.
///
/// Choice and answer columns are kept as raw JSON so that nulls, numbers and
/// blank strings can be filtered during normalization instead of failing
/// deserialization of the whole result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    #[serde(default)]
    pub id: Value,
    #[serde(default, alias = "text")]
    pub question: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub choice1: Value,
    #[serde(default)]
    pub choice2: Value,
    #[serde(default)]
    pub choice3: Value,
    #[serde(default)]
    pub choice4: Value,
    /// 1-based choice index for single-choice rows, literal value for numeric rows.
    #[serde(default)]
    pub answer: Value,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl QuestionRow {
    fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }

    fn usable_choices(&self) -> Vec<String> {
        [&self.choice1, &self.choice2, &self.choice3, &self.choice4]
            .into_iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Remote question repository.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run one read-only query. An empty filter selects every row.
    async fn query(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRow>, FetchError>;
}

/// Turn a raw row into a validated [`Question`].
///
/// Rows that cannot satisfy the question invariants yield
/// [`FetchError::InvalidRow`], which callers retry like a transport failure.
pub fn normalize_row(row: &QuestionRow) -> Result<Question, FetchError> {
    let id = row.id_string();
    let invalid = |reason: String| FetchError::InvalidRow {
        id: if id.is_empty() { "<missing>".into() } else { id.clone() },
        reason,
    };

    if id.is_empty() {
        return Err(invalid("missing id".into()));
    }
    let text = row
        .question
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("missing question text".into()))?
        .to_string();

    let choices = row.usable_choices();
    let kind = match row.kind.as_deref() {
        Some(raw) => QuestionKind::parse(raw)
            .ok_or_else(|| invalid(format!("unsupported question type '{raw}'")))?,
        None if choices.is_empty() => QuestionKind::Numeric,
        None => QuestionKind::SingleChoice,
    };

    let (choices, correct_answer) = match kind {
        QuestionKind::SingleChoice => {
            if choices.len() < 2 {
                return Err(invalid(format!(
                    "only {} usable choices",
                    choices.len()
                )));
            }
            let index = answer_index(&row.answer)
                .ok_or_else(|| invalid(format!("unreadable answer {}", row.answer)))?;
            if index == 0 || index > choices.len() {
                return Err(invalid(format!(
                    "answer index {index} outside {} choices",
                    choices.len()
                )));
            }
            let label = Question::choice_label(index - 1)
                .ok_or_else(|| invalid(format!("answer index {index} has no label")))?;
            (choices, label.to_string())
        }
        QuestionKind::Numeric => {
            let literal = match &row.answer {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.trim().to_string(),
                _ => String::new(),
            };
            if literal.is_empty() {
                return Err(invalid("missing numeric answer".into()));
            }
            (Vec::new(), literal)
        }
    };

    let question = Question {
        id: id.clone(),
        text,
        kind,
        choices,
        correct_answer,
        explanation: non_blank(row.explanation.as_deref()),
        instructions: non_blank(row.instructions.as_deref()),
        difficulty: row.difficulty.clone().unwrap_or_default(),
        tag: row.tag.clone().unwrap_or_default(),
    };
    question.validate().map_err(|e| invalid(e.to_string()))?;
    Ok(question)
}

/// 1-based answer index from a number, a numeric string or a choice letter.
fn answer_index(answer: &Value) -> Option<usize> {
    match answer {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<usize>()
                .ok()
                .or_else(|| Question::label_index(s).map(|i| i + 1))
        }
        _ => None,
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Fetches one question: filtered query, unfiltered fallback, uniform pick,
/// normalization.
pub struct QuestionAdapter {
    source: Box<dyn QuestionSource>,
    filter: QuestionFilter,
    rng: Mcg128Xsl64,
}

impl QuestionAdapter {
    pub fn new(source: Box<dyn QuestionSource>, filter: QuestionFilter) -> Self {
        Self::with_seed(source, filter, rand::random())
    }

    /// Deterministic selection, for tests and replays.
    pub fn with_seed(source: Box<dyn QuestionSource>, filter: QuestionFilter, seed: u64) -> Self {
        Self {
            source,
            filter,
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    pub fn filter(&self) -> &QuestionFilter {
        &self.filter
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// One acquisition attempt. Any error is retryable.
    pub async fn fetch_one(&mut self) -> Result<Question, FetchError> {
        let mut rows = self.source.query(&self.filter).await?;
        if rows.is_empty() && !self.filter.is_empty() {
            tracing::debug!(
                source = self.source.name(),
                "no rows match preferences, falling back to unfiltered query"
            );
            rows = self.source.query(&QuestionFilter::default()).await?;
        }
        let row = rows.choose(&mut self.rng).ok_or(FetchError::NoRows)?;
        normalize_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn row(value: Value) -> QuestionRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalize_filters_blank_and_null_choices() {
        let q = normalize_row(&row(json!({
            "id": 7,
            "question": "Pick the prime",
            "type": "multiple_choice",
            "choice1": "4",
            "choice2": null,
            "choice3": "   ",
            "choice4": "7",
            "answer": 2,
        })))
        .unwrap();
        assert_eq!(q.id, "7");
        assert_eq!(q.choices, vec!["4".to_string(), "7".to_string()]);
        assert_eq!(q.correct_answer, "B");
        assert_eq!(q.correct_choice_text(), Some("7"));
    }

    #[test]
    fn normalize_rejects_answer_outside_filtered_choices() {
        let err = normalize_row(&row(json!({
            "id": "q",
            "question": "Which?",
            "choice1": "a",
            "choice2": "b",
            "choice3": "",
            "answer": 3,
        })))
        .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRow { .. }));
    }

    #[test]
    fn normalize_rejects_single_usable_choice() {
        let err = normalize_row(&row(json!({
            "id": "q",
            "question": "Which?",
            "type": "single_choice",
            "choice1": "only",
            "choice2": 12,
            "answer": 1,
        })))
        .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRow { .. }));
    }

    #[test]
    fn normalize_numeric_row() {
        let q = normalize_row(&row(json!({
            "id": "n1",
            "question": "6 * 7?",
            "type": "numeric",
            "answer": 42,
            "explanation": "  ",
        })))
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Numeric);
        assert_eq!(q.correct_answer, "42");
        assert!(q.choices.is_empty());
        assert_eq!(q.explanation, None);
    }

    #[test]
    fn normalize_accepts_string_answer_index() {
        let q = normalize_row(&row(json!({
            "id": "s",
            "question": "?",
            "choice1": "x",
            "choice2": "y",
            "answer": "2",
        })))
        .unwrap();
        assert_eq!(q.correct_answer, "B");
    }

    #[test]
    fn filter_matches_case_insensitively() {
        let filter = QuestionFilter {
            tags: vec!["Math".into()],
            difficulties: vec![],
        };
        assert!(filter.matches(&row(json!({ "tag": "math" }))));
        assert!(!filter.matches(&row(json!({ "tag": "history" }))));
        assert!(!filter.matches(&row(json!({}))));
    }

    proptest! {
        #[test]
        fn normalized_single_choice_always_validates(
            choices in proptest::collection::vec(proptest::option::of("[ a-z]{0,4}"), 4),
            answer in 0u64..6,
        ) {
            let r = row(json!({
                "id": "p",
                "question": "?",
                "type": "single_choice",
                "choice1": choices[0],
                "choice2": choices[1],
                "choice3": choices[2],
                "choice4": choices[3],
                "answer": answer,
            }));
            if let Ok(q) = normalize_row(&r) {
                prop_assert!(q.validate().is_ok());
                prop_assert!(q.choices.iter().all(|c| !c.trim().is_empty()));
                prop_assert!(q.correct_choice_text().is_some());
            }
        }
    }
}
