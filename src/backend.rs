use crate::config::{BackendKind, Config};
use crate::error::BackendError;
use crate::gemini::GeminiClient;
use crate::openai::OpenAIClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub candidate_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 250,
            temperature: 0.85,
            top_p: 0.9,
            top_k: 50,
            candidate_count: 1,
        }
    }
}

/// A text-generation service: prompt in, text out.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, BackendError>;
}

/// Builds the backend selected in the config, or `None` when no key is set
/// (the responder then runs on patterns alone).
pub fn from_config(config: &Config) -> Result<Option<Arc<dyn GenerationBackend>>, BackendError> {
    let Some(key) = config.active_api_key() else {
        return Ok(None);
    };

    let backend: Arc<dyn GenerationBackend> = match config.backend {
        BackendKind::Gemini => Arc::new(GeminiClient::new(key, config.model.as_deref())?),
        BackendKind::OpenAI => Arc::new(OpenAIClient::new(key, config.model.as_deref())?),
        BackendKind::None => return Ok(None),
    };
    Ok(Some(backend))
}
