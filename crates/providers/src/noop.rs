use crate::{JsonCompletion, JsonPrompt, LlmProvider, ProviderError};

#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete_json(&self, _prompt: &JsonPrompt) -> Result<JsonCompletion, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
