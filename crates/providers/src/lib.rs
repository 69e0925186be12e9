//! Provider abstractions for language-understanding backends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod noop;
pub mod openai;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// A chat request whose answer must be a single JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPrompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Raw JSON text returned by the model. Parsing is left to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCompletion {
    pub content: String,
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete_json(&self, prompt: &JsonPrompt) -> Result<JsonCompletion, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    llms: HashMap<String, Arc<dyn LlmProvider>>,
    pub preferred_llm: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_llm(mut self, name: &str, provider: Arc<dyn LlmProvider>) -> Self {
        self.llms.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_llm(mut self, name: &str) -> Self {
        self.preferred_llm = Some(name.to_string());
        self
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.llms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn llm(&self, name: Option<&str>) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_llm.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no llm provider configured".into()))?;
        self.llms
            .get(&key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownProvider(key))
    }
}
