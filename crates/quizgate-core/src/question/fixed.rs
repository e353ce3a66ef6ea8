//! In-memory question source for offline use.

use async_trait::async_trait;
use serde_json::json;

use super::source::{QuestionFilter, QuestionRow, QuestionSource};
use crate::error::FetchError;

/// Serves rows from memory, applying the filter locally.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionSource {
    rows: Vec<QuestionRow>,
}

impl StaticQuestionSource {
    pub fn new(rows: Vec<QuestionRow>) -> Self {
        Self { rows }
    }

    /// Small built-in bank used by `quizgate --offline`.
    pub fn builtin() -> Self {
        let raw = [
            json!({
                "id": "builtin-1",
                "question": "What is 2 + 3?",
                "type": "single_choice",
                "choice1": "4",
                "choice2": "5",
                "choice3": "6",
                "answer": 2,
                "explanation": "Adding two and three gives five.",
                "difficulty": "easy",
                "tag": "arithmetic",
            }),
            json!({
                "id": "builtin-2",
                "question": "How many bytes are in a kibibyte?",
                "type": "numeric",
                "answer": "1024",
                "explanation": "A kibibyte is 2^10 bytes.",
                "instructions": "Enter a whole number.",
                "difficulty": "medium",
                "tag": "computing",
            }),
            json!({
                "id": "builtin-3",
                "question": "Which planet is closest to the sun?",
                "type": "single_choice",
                "choice1": "Venus",
                "choice2": "Earth",
                "choice3": "Mercury",
                "choice4": "Mars",
                "answer": 3,
                "explanation": "Mercury orbits at about 0.39 AU.",
                "difficulty": "easy",
                "tag": "science",
            }),
        ];
        let rows = raw
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[QuestionRow] {
        &self.rows
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn query(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRow>, FetchError> {
        Ok(self
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{normalize_row, QuestionAdapter};

    #[test]
    fn builtin_rows_all_normalize() {
        let source = StaticQuestionSource::builtin();
        assert_eq!(source.rows().len(), 3);
        for row in source.rows() {
            assert!(normalize_row(row).is_ok(), "row {:?} failed", row.id);
        }
    }

    #[tokio::test]
    async fn adapter_falls_back_to_unfiltered_query() {
        let filter = QuestionFilter {
            tags: vec!["geography".into()],
            difficulties: vec![],
        };
        let mut adapter =
            QuestionAdapter::with_seed(Box::new(StaticQuestionSource::builtin()), filter, 7);
        let question = adapter.fetch_one().await.unwrap();
        assert!(question.id.starts_with("builtin-"));
    }

    #[tokio::test]
    async fn adapter_prefers_filtered_rows() {
        let filter = QuestionFilter {
            tags: vec!["computing".into()],
            difficulties: vec![],
        };
        let mut adapter =
            QuestionAdapter::with_seed(Box::new(StaticQuestionSource::builtin()), filter, 1);
        for _ in 0..5 {
            assert_eq!(adapter.fetch_one().await.unwrap().id, "builtin-2");
        }
    }

    #[tokio::test]
    async fn adapter_reports_no_rows() {
        let mut adapter = QuestionAdapter::with_seed(
            Box::new(StaticQuestionSource::default()),
            QuestionFilter::default(),
            1,
        );
        assert!(matches!(adapter.fetch_one().await, Err(FetchError::NoRows)));
    }
}
