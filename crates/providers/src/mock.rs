//! A fixed-response provider used by scheduler tests (spec §8 scenario S6:
//! "provider returns fixed content 'mock response' in 10ms").

use pryx_domain::{ModelCapability, ModelRole, ToolSupport};

use crate::traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};

pub struct MockProvider {
    id: String,
    response: String,
    capabilities: ModelCapability,
    delay: std::time::Duration,
}

impl MockProvider {
    pub fn new(id: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            response: response.into(),
            capabilities: ModelCapability {
                model_id: "mock".into(),
                context_window_tokens: 128_000,
                max_output_tokens: 4096,
                max_thinking_tokens: 0,
                supports_tools: ToolSupport::Basic,
                supports_vision: false,
                supports_thinking: false,
                supports_streaming: false,
                supports_caching: false,
                input_price_per_1m: 0.0,
                output_price_per_1m: 0.0,
                fixed_cost: 0.0,
                provider_overrides: Default::default(),
                fallback_chain: vec![],
            },
            delay: std::time::Duration::from_millis(10),
        }
    }

    pub fn role_hint(&self) -> ModelRole {
        ModelRole::Executor
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    async fn chat(&self, req: ChatRequest) -> pryx_domain::Result<ChatResponse> {
        tokio::time::sleep(self.delay).await;
        Ok(ChatResponse {
            content: self.response.clone(),
            model: req.model.unwrap_or_else(|| "mock".into()),
            prompt_tokens: (req.system.len() + req.user.len()) as u32 / 4,
            completion_tokens: self.response.len() as u32 / 4,
        })
    }

    async fn embeddings(&self, req: EmbeddingsRequest) -> pryx_domain::Result<EmbeddingsResponse> {
        Ok(EmbeddingsResponse {
            embeddings: req.input.iter().map(|_| vec![0.0_f32; 8]).collect(),
        })
    }

    fn capabilities(&self) -> &ModelCapability {
        &self.capabilities
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_returns_fixed_content() {
        let provider = MockProvider::new("mock", "mock response");
        let res = provider
            .chat(ChatRequest {
                system: "sys".into(),
                user: "hi".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(res.content, "mock response");
    }
}
