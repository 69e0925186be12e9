use crate::{JsonCompletion, JsonPrompt, LlmProvider, ProviderError};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    /// Upper bound for a single HTTP exchange.
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete_json(&self, prompt: &JsonPrompt) -> Result<JsonCompletion, ProviderError> {
        #[derive(serde::Serialize)]
        struct ChatMessage<'a> {
            role: &'static str,
            content: &'a str,
        }
        #[derive(serde::Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(serde::Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage<'a>>,
            response_format: ResponseFormat,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessageResp,
        }
        #[derive(Deserialize)]
        struct ChatMessageResp {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct ChatApiResponse {
            choices: Vec<Choice>,
        }

        let body = ChatRequest {
            model: &self.cfg.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: prompt.temperature,
        };

        debug!(model = %self.cfg.chat_model, "sending chat completion request");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }

        let parsed: ChatApiResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("empty completion".into()))?;

        Ok(JsonCompletion { content })
    }
}
