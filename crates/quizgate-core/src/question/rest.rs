//! PostgREST-style question repository client.
//!
//! Queries `GET {base_url}/rest/v1/{table}?select=*` with optional
//! `tag=in.(..)` and `difficulty=in.(..)` filters. Any non-2xx status or
//! transport failure is surfaced as a retryable [`FetchError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::source::{QuestionFilter, QuestionRow, QuestionSource};
use crate::error::FetchError;
use crate::storage::RepositoryConfig;

pub struct RestQuestionSource {
    client: Client,
    base_url: Url,
    table: String,
    api_key: Option<String>,
}

impl RestQuestionSource {
    /// Build a client from the `[repository]` config section.
    pub fn new(config: &RepositoryConfig, timeout: Duration) -> Result<Self, FetchError> {
        let raw = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| FetchError::NotConfigured("repository.base_url is empty".into()))?;
        let mut base_url = Url::parse(raw)
            .map_err(|e| FetchError::NotConfigured(format!("invalid base_url '{raw}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            table: config.table.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn endpoint(&self, filter: &QuestionFilter) -> Result<Url, FetchError> {
        let path = format!("rest/v1/{}", urlencoding::encode(&self.table));
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| FetchError::NotConfigured(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            if !filter.tags.is_empty() {
                query.append_pair("tag", &in_list(&filter.tags));
            }
            if !filter.difficulties.is_empty() {
                query.append_pair("difficulty", &in_list(&filter.difficulties));
            }
        }
        Ok(url)
    }
}

/// PostgREST `in.(...)` operator with each value double-quoted.
fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[async_trait]
impl QuestionSource for RestQuestionSource {
    fn name(&self) -> &str {
        "rest"
    }

    async fn query(&self, filter: &QuestionFilter) -> Result<Vec<QuestionRow>, FetchError> {
        let url = self.endpoint(filter)?;
        tracing::debug!(%url, "querying question repository");

        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key.as_str()).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let rows: Vec<QuestionRow> = response
            .json()
            .await
            .map_err(|e| FetchError::Transport(format!("undecodable response: {e}")))?;
        tracing::debug!(rows = rows.len(), "repository query returned");
        Ok(rows)
    }
}
