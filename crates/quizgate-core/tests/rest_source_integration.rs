//! Repository client against a mocked HTTP endpoint.

use std::time::Duration;

use mockito::Matcher;
use quizgate_core::question::{QuestionAdapter, QuestionFilter, QuestionKind, QuestionSource, RestQuestionSource};
use quizgate_core::storage::RepositoryConfig;
use quizgate_core::FetchError;
use serde_json::json;

fn source(base: &str) -> RestQuestionSource {
    let config = RepositoryConfig {
        base_url: Some(base.to_string()),
        api_key: Some("anon-key".into()),
        table: "questions".into(),
    };
    RestQuestionSource::new(&config, Duration::from_secs(5)).unwrap()
}

fn rows_body() -> String {
    json!([{
        "id": 42,
        "question": "What is 2 + 3?",
        "type": "single_choice",
        "choice1": "4",
        "choice2": "5",
        "choice3": "6",
        "choice4": null,
        "answer": 2,
        "explanation": "Two plus three is five.",
        "difficulty": "easy",
        "tag": "arithmetic"
    }])
    .to_string()
}

#[tokio::test]
async fn filtered_query_sends_preferences_and_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("tag".into(), "in.(\"arithmetic\")".into()),
        ]))
        .match_header("apikey", "anon-key")
        .match_header("authorization", "Bearer anon-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(rows_body())
        .expect(1)
        .create_async()
        .await;

    let filter = QuestionFilter {
        tags: vec!["arithmetic".into()],
        difficulties: Vec::new(),
    };
    let rows = source(&server.url()).query(&filter).await.unwrap();
    assert_eq!(rows.len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn adapter_falls_back_to_unfiltered_query() {
    let mut server = mockito::Server::new_async().await;
    let filtered = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("tag".into(), "in.(\"astronomy\")".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let unfiltered = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::Exact("select=*".into()))
        .with_status(200)
        .with_body(rows_body())
        .expect(1)
        .create_async()
        .await;

    let filter = QuestionFilter {
        tags: vec!["astronomy".into()],
        difficulties: Vec::new(),
    };
    let mut adapter = QuestionAdapter::with_seed(Box::new(source(&server.url())), filter, 3);
    let question = adapter.fetch_one().await.unwrap();

    assert_eq!(question.id, "42");
    assert_eq!(question.kind, QuestionKind::SingleChoice);
    assert_eq!(question.choices, vec!["4", "5", "6"]);
    assert_eq!(question.correct_answer, "B");
    filtered.assert_async().await;
    unfiltered.assert_async().await;
}

#[tokio::test]
async fn server_error_is_a_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let err = source(&server.url())
        .query(&QuestionFilter::default())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Status { status: 500 });
    assert!(err.is_transport());
}

#[tokio::test]
async fn undecodable_body_is_a_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = source(&server.url())
        .query(&QuestionFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn empty_repository_yields_no_rows() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/questions")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let mut adapter = QuestionAdapter::with_seed(
        Box::new(source(&server.url())),
        QuestionFilter::default(),
        3,
    );
    assert!(matches!(adapter.fetch_one().await, Err(FetchError::NoRows)));
}
