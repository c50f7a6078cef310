//! LLM workflow client

use super::{ContentGenerator, SERVICE};
use crate::config::ContentConfig;
use crate::error::{Error, Result};
use crate::types::Article;
use crate::utils::{split_list, truncate_for_log};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Longest upstream body kept in an error
const MAX_ERROR_BODY: usize = 500;

/// Client for a blocking LLM workflow endpoint
///
/// Sends `{"inputs": {...}, "response_mode": "blocking", "user": ...}` and
/// reads the article from `data.outputs.text`, which holds a JSON document
/// with `title`, `article`, `tag`, `keywords` and `description`.
#[derive(Clone, Debug)]
pub struct WorkflowClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    topic_input: String,
    user: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct WorkflowRequest<'a> {
    inputs: serde_json::Map<String, serde_json::Value>,
    response_mode: &'static str,
    user: &'a str,
}

#[derive(Deserialize)]
struct WorkflowResponse {
    #[serde(default)]
    workflow_run_id: Option<String>,
    data: WorkflowData,
}

#[derive(Deserialize)]
struct WorkflowData {
    status: String,
    #[serde(default)]
    outputs: Option<WorkflowOutputs>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    elapsed_time: Option<f64>,
}

#[derive(Deserialize)]
struct WorkflowOutputs {
    #[serde(default)]
    text: Option<String>,
}

/// Article document carried inside `outputs.text`
#[derive(Deserialize)]
struct ArticleDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    article: String,
    #[serde(default)]
    tag: Option<ListField>,
    #[serde(default)]
    keywords: Option<ListField>,
    #[serde(default)]
    description: Option<String>,
}

/// Workflows return lists either comma-separated or as JSON arrays
#[derive(Deserialize)]
#[serde(untagged)]
enum ListField {
    Joined(String),
    Items(Vec<String>),
}

impl ListField {
    fn into_vec(self) -> Vec<String> {
        match self {
            ListField::Joined(raw) => split_list(&raw),
            ListField::Items(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl WorkflowClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured or the HTTP
    /// client cannot be built.
    pub fn new(config: &ContentConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("content API key is required", "CONTENT_API_KEY"))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build content HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            topic_input: config.topic_input.clone(),
            user: config.user.clone(),
            timeout: config.timeout,
        })
    }

    fn request_body(&self, topic: Option<&str>) -> WorkflowRequest<'_> {
        let mut inputs = serde_json::Map::new();
        if let Some(topic) = topic {
            inputs.insert(self.topic_input.clone(), topic.into());
        }
        WorkflowRequest {
            inputs,
            response_mode: "blocking",
            user: &self.user,
        }
    }
}

#[async_trait]
impl ContentGenerator for WorkflowClient {
    async fn generate(&self, topic: Option<&str>) -> Result<Article> {
        tracing::debug!(endpoint = %self.endpoint, topic = ?topic, "calling content workflow");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(topic))
            .send()
            .await
            .map_err(|e| Error::from_http(SERVICE, self.timeout, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_http(SERVICE, self.timeout, e))?;

        if !status.is_success() {
            return Err(Error::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_ERROR_BODY),
            });
        }

        let parsed: WorkflowResponse = serde_json::from_str(&body).map_err(|e| Error::Parse {
            service: SERVICE,
            reason: format!("unexpected response shape: {e}"),
        })?;

        tracing::info!(
            workflow_run_id = parsed.workflow_run_id.as_deref().unwrap_or("-"),
            status = %parsed.data.status,
            elapsed_secs = parsed.data.elapsed_time,
            "content workflow finished"
        );

        parse_article(parsed.data, status.as_u16())
    }

    fn name(&self) -> &'static str {
        "workflow"
    }
}

fn parse_article(data: WorkflowData, http_status: u16) -> Result<Article> {
    if data.status != "succeeded" {
        return Err(Error::Upstream {
            service: SERVICE,
            status: http_status,
            body: format!(
                "workflow status {}: {}",
                data.status,
                data.error.as_deref().unwrap_or("no error message")
            ),
        });
    }

    let text = data
        .outputs
        .and_then(|o| o.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Parse {
            service: SERVICE,
            reason: "workflow outputs carry no text".into(),
        })?;

    let doc: ArticleDocument = serde_json::from_str(&text).map_err(|e| Error::Parse {
        service: SERVICE,
        reason: format!("outputs.text is not an article document: {e}"),
    })?;

    let title = doc.title.trim().to_string();
    if title.is_empty() {
        return Err(Error::Parse {
            service: SERVICE,
            reason: "article title is empty".into(),
        });
    }
    if doc.article.trim().is_empty() {
        return Err(Error::Parse {
            service: SERVICE,
            reason: "article body is empty".into(),
        });
    }

    Ok(Article {
        title,
        body: doc.article,
        tags: doc
            .tag
            .map(ListField::into_vec)
            .unwrap_or_default()
            .into_iter()
            .collect::<BTreeSet<_>>(),
        description: doc
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        keywords: doc.keywords.map(ListField::into_vec).unwrap_or_default(),
    })
}
