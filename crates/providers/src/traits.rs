//! The out-of-scope `Provider` interface boundary (spec §1: "provider-
//! specific HTTP clients beyond the `Provider` interface" are out of
//! scope). Kept near-verbatim from `providers/src/traits.rs`, trimmed to
//! self-contained request/response types since the teacher's `domain::tool`
//! / `domain::stream` modules carry unrelated peripheral surface.

use pryx_domain::Result;

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub streaming: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsRequest {
    pub input: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Every LLM adapter implements this trait. No concrete HTTP adapter ships
/// in this crate — see `mock::MockProvider` for the instance used by
/// scheduler tests.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;
    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse>;
    fn capabilities(&self) -> &pryx_domain::ModelCapability;
    fn provider_id(&self) -> &str;
}
