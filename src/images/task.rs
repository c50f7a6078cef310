//! Asynchronous text-to-image task client

use super::{ImageGenerator, SERVICE, download_body};
use crate::config::ImageConfig;
use crate::error::{Error, Result};
use crate::retry::IsRetryable;
use crate::types::{ImageAsset, ImageSource};
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

const SYNTHESIS_PATH: &str = "/api/v1/services/aigc/text2image/image-synthesis";
const TASKS_PATH: &str = "/api/v1/tasks";
const MAX_ERROR_BODY: usize = 500;

/// Client for a create-then-poll text-to-image service
///
/// `generate` submits a synthesis task and polls it every `poll_interval`
/// until it finishes or `max_wait` elapses. Transient query failures are
/// logged and polling continues.
#[derive(Clone, Debug)]
pub struct TaskImageClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    size: String,
    negative_prompt: Option<String>,
    request_timeout: Duration,
    poll_interval: Duration,
    max_wait: Duration,
    download_timeout: Duration,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    model: &'a str,
    input: SynthesisInput<'a>,
    parameters: SynthesisParameters<'a>,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

#[derive(Serialize)]
struct SynthesisParameters<'a> {
    n: u32,
    size: &'a str,
}

#[derive(Deserialize)]
struct TaskEnvelope {
    output: TaskOutput,
}

#[derive(Deserialize)]
struct TaskOutput {
    task_id: String,
    #[serde(default)]
    task_status: String,
    #[serde(default)]
    results: Vec<TaskResult>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct TaskResult {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl TaskImageClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no API key is configured or the HTTP
    /// client cannot be built.
    pub fn new(config: &ImageConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("image API key is required", "IMAGE_API_KEY"))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build image HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            size: config.size.clone(),
            negative_prompt: config.negative_prompt.clone(),
            request_timeout: config.request_timeout,
            poll_interval: config.poll_interval,
            max_wait: config.max_wait,
            download_timeout: config.download_timeout,
        })
    }

    async fn create_task(&self, prompt: &str, count: u32) -> Result<String> {
        let body = SynthesisRequest {
            model: &self.model,
            input: SynthesisInput {
                prompt,
                negative_prompt: self.negative_prompt.as_deref(),
            },
            parameters: SynthesisParameters {
                n: count,
                size: &self.size,
            },
        };

        let response = self
            .http
            .post(format!("{}{SYNTHESIS_PATH}", self.endpoint))
            .bearer_auth(&self.api_key)
            .header("X-DashScope-Async", "enable")
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from_http(SERVICE, self.request_timeout, e))?;

        let envelope = self.read_envelope(response).await?;
        Ok(envelope.output.task_id)
    }

    async fn query_task(&self, task_id: &str) -> Result<TaskOutput> {
        let response = self
            .http
            .get(format!("{}{TASKS_PATH}/{task_id}", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::from_http(SERVICE, self.request_timeout, e))?;

        Ok(self.read_envelope(response).await?.output)
    }

    async fn read_envelope(&self, response: reqwest::Response) -> Result<TaskEnvelope> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::from_http(SERVICE, self.request_timeout, e))?;

        if !status.is_success() {
            return Err(Error::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_ERROR_BODY),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Parse {
            service: SERVICE,
            reason: format!("unexpected task response: {e}"),
        })
    }

    async fn wait_for_task(&self, task_id: &str) -> Result<Vec<ImageAsset>> {
        let deadline = Instant::now() + self.max_wait;
        let mut polls = 0u32;

        loop {
            if Instant::now() + self.poll_interval > deadline {
                return Err(Error::Timeout {
                    service: SERVICE,
                    after: self.max_wait,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let output = match self.query_task(task_id).await {
                Ok(output) => output,
                Err(e) if e.is_retryable() => {
                    tracing::warn!(task_id, polls, error = %e, "image task query failed, will poll again");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match output.task_status.as_str() {
                "SUCCEEDED" => {
                    tracing::info!(task_id, polls, results = output.results.len(), "image task succeeded");
                    return Ok(assets_from_results(task_id, output.results));
                }
                "FAILED" | "CANCELED" | "UNKNOWN" => {
                    return Err(Error::Upstream {
                        service: SERVICE,
                        status: 0,
                        body: format!(
                            "task {task_id} {}: {} {}",
                            output.task_status,
                            output.code.as_deref().unwrap_or("-"),
                            output.message.as_deref().unwrap_or("")
                        )
                        .trim_end()
                        .to_string(),
                    });
                }
                other => {
                    tracing::debug!(task_id, polls, status = other, "image task still running");
                }
            }
        }
    }
}

/// Turn task results into assets, skipping entries without a URL
///
/// Each asset keeps the position of its result entry as its index.
fn assets_from_results(task_id: &str, results: Vec<TaskResult>) -> Vec<ImageAsset> {
    results
        .into_iter()
        .enumerate()
        .filter_map(|(index, result)| match result.url {
            Some(url) if !url.is_empty() => Some(ImageAsset {
                index: index as u32,
                source: ImageSource::Url(url),
            }),
            _ => {
                tracing::warn!(
                    task_id,
                    index,
                    code = result.code.as_deref().unwrap_or("-"),
                    "image result has no url, skipping"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl ImageGenerator for TaskImageClient {
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageAsset>> {
        let task_id = self.create_task(prompt, count.max(1)).await?;
        tracing::info!(task_id = %task_id, count, model = %self.model, "image task submitted");
        self.wait_for_task(&task_id).await
    }

    async fn fetch(&self, asset: &ImageAsset) -> Result<Vec<u8>> {
        match &asset.source {
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
            ImageSource::Url(url) => {
                let response = self
                    .http
                    .get(url)
                    .timeout(self.download_timeout)
                    .send()
                    .await
                    .map_err(|e| Error::from_http("image-download", self.download_timeout, e))?;
                download_body(response).await
            }
        }
    }

    fn name(&self) -> &'static str {
        "task"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_wait: Duration) -> TaskImageClient {
        TaskImageClient::new(&ImageConfig {
            endpoint: server.uri(),
            api_key: Some("sk-test".into()),
            count: 2,
            poll_interval: Duration::from_millis(20),
            max_wait,
            request_timeout: Duration::from_secs(2),
            download_timeout: Duration::from_secs(2),
            ..ImageConfig::default()
        })
        .unwrap()
    }

    async fn mount_create(server: &MockServer, task_id: &str) {
        Mock::given(method("POST"))
            .and(path(SYNTHESIS_PATH))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("x-dashscope-async", "enable"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": { "task_id": task_id, "task_status": "PENDING" },
                "request_id": "req-1"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn polls_until_succeeded_and_keeps_indices() {
        let server = MockServer::start().await;
        mount_create(&server, "task-1").await;

        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": { "task_id": "task-1", "task_status": "RUNNING" }
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {
                    "task_id": "task-1",
                    "task_status": "SUCCEEDED",
                    "results": [
                        { "code": "DataInspectionFailed", "message": "blocked" },
                        { "url": "https://img.example.com/b.png" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let assets = client_for(&server, Duration::from_secs(5))
            .generate("a calm bedroom", 2)
            .await
            .unwrap();

        assert_eq!(
            assets,
            vec![ImageAsset {
                index: 1,
                source: ImageSource::Url("https://img.example.com/b.png".into()),
            }]
        );
    }

    #[tokio::test]
    async fn create_request_carries_model_prompt_and_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNTHESIS_PATH))
            .and(body_json(json!({
                "model": "wanx2.1-t2i-turbo",
                "input": { "prompt": "sunrise" },
                "parameters": { "n": 3, "size": "1024*1024" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": { "task_id": "t", "task_status": "PENDING" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": { "task_id": "t", "task_status": "SUCCEEDED", "results": [] }
            })))
            .mount(&server)
            .await;

        let assets = client_for(&server, Duration::from_secs(5))
            .generate("sunrise", 3)
            .await
            .unwrap();
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn failed_task_is_upstream_error() {
        let server = MockServer::start().await;
        mount_create(&server, "task-2").await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {
                    "task_id": "task-2",
                    "task_status": "FAILED",
                    "code": "InternalError",
                    "message": "model crashed"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .generate("p", 1)
            .await
            .unwrap_err();
        match err {
            Error::Upstream { body, .. } => {
                assert!(body.contains("FAILED"), "{body}");
                assert!(body.contains("model crashed"), "{body}");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_create_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNTHESIS_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": "InvalidApiKey",
                "message": "Invalid API-key provided."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .generate("p", 1)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Upstream { status: 401, .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn transient_poll_errors_are_tolerated() {
        let server = MockServer::start().await;
        mount_create(&server, "task-3").await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-3"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": {
                    "task_id": "task-3",
                    "task_status": "SUCCEEDED",
                    "results": [{ "url": "https://img.example.com/a.png" }]
                }
            })))
            .mount(&server)
            .await;

        let assets = client_for(&server, Duration::from_secs(5))
            .generate("p", 1)
            .await
            .unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].index, 0);
    }

    #[tokio::test]
    async fn task_that_never_finishes_times_out() {
        let server = MockServer::start().await;
        mount_create(&server, "task-4").await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/task-4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output": { "task_id": "task-4", "task_status": "RUNNING" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(150))
            .generate("p", 1)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Timeout { after, .. } if after == Duration::from_millis(150)),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn fetch_downloads_url_assets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/out/0.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG\r\n\x1a\nrest".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/out/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let ok = ImageAsset {
            index: 0,
            source: ImageSource::Url(format!("{}/out/0.png", server.uri())),
        };
        let bytes = client.fetch(&ok).await.unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));

        let missing = ImageAsset {
            index: 1,
            source: ImageSource::Url(format!("{}/out/missing.png", server.uri())),
        };
        assert!(matches!(
            client.fetch(&missing).await,
            Err(Error::Upstream { status: 404, .. })
        ));
    }
}
