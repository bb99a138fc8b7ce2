use super::types::*;
use super::AgentRuntime;
use crate::config::SapwiseConfig;
use crate::error::{Result, SapwiseError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const API_VERSION: &str = "2025-05-01";

/// Client for an Azure-AI-Agents-style REST surface. A question is answered by
/// posting a user message to a thread, starting a run, polling it to a
/// terminal status and reading back the newest assistant message.
pub struct HostedAgentClient {
    client: reqwest::Client,
    endpoint: String,
    agent_id: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl HostedAgentClient {
    pub fn new(
        endpoint: impl Into<String>,
        agent_id: impl Into<String>,
        api_key: &str,
        config: &SapwiseConfig,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key)
                .map_err(|e| SapwiseError::Config(format!("Invalid API key format: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SapwiseError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            agent_id: agent_id.into(),
            poll_interval: Duration::from_millis(config.run_poll_interval_ms),
            max_poll_attempts: config.run_poll_max_attempts,
        })
    }

    /// Resolves the agent identity once at startup. A failure here means the
    /// whole run falls back to canned answers.
    pub async fn resolve_agent(&self) -> Result<AgentInfo> {
        self.get_json(&format!("assistants/{}", self.agent_id), &[])
            .await
            .map_err(|e| {
                SapwiseError::AgentUnavailable(format!(
                    "agent '{}' could not be resolved: {}",
                    self.agent_id, e
                ))
            })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.endpoint, path))
            .query(&[("api-version", API_VERSION)])
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.request(Method::GET, path).query(query).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SapwiseError::Api(format!(
                "request failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        for attempt in 0..self.max_poll_attempts {
            let run: RunInfo = self
                .get_json(&format!("threads/{}/runs/{}", thread_id, run_id), &[])
                .await?;

            match run.status {
                RunStatus::Completed => return Ok(()),
                RunStatus::Failed => {
                    let detail = run
                        .last_error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "run failed without detail".to_string());
                    return Err(SapwiseError::RunFailure(detail));
                }
                status if status.is_terminal() => {
                    return Err(SapwiseError::RunFailure(format!(
                        "run ended with status {:?}",
                        status
                    )));
                }
                status => {
                    tracing::debug!(?status, attempt, run_id, "run still in progress");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }

        Err(SapwiseError::RunFailure(format!(
            "run did not complete after {} polls",
            self.max_poll_attempts
        )))
    }
}

#[async_trait]
impl AgentRuntime for HostedAgentClient {
    async fn create_thread(&self) -> Result<String> {
        let thread: ThreadInfo = self.post_json("threads", &serde_json::json!({})).await?;
        Ok(thread.id)
    }

    async fn ask(&self, thread_id: &str, question: &str) -> Result<String> {
        let _: serde_json::Value = self
            .post_json(
                &format!("threads/{}/messages", thread_id),
                &CreateMessageRequest {
                    role: "user",
                    content: question,
                },
            )
            .await?;

        let run: RunInfo = self
            .post_json(
                &format!("threads/{}/runs", thread_id),
                &CreateRunRequest {
                    assistant_id: &self.agent_id,
                },
            )
            .await?;

        self.wait_for_run(thread_id, &run.id).await?;

        let messages: MessageList = self
            .get_json(
                &format!("threads/{}/messages", thread_id),
                &[("order", "desc")],
            )
            .await?;

        let answer = messages
            .data
            .iter()
            .find(|m| m.role == "assistant")
            .and_then(|m| m.resolved_text());

        match answer {
            Some(text) => Ok(text),
            None => {
                tracing::warn!(thread_id, "run completed but no assistant message was found");
                Ok("No answer could be found for this question.".to_string())
            }
        }
    }
}
