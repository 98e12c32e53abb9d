use crate::{LlmProvider, ProviderError};

/// Stand-in provider for runs without a credential. Every consultation
/// fails, which the pipeline degrades into the review bucket.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
