use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Tool support level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolSupport {
    /// No tool calling support.
    None,
    /// Basic tool calling (function calling).
    Basic,
    /// Strict JSON schema-validated tool calling.
    StrictJson,
}

/// Model roles — each maps to a routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Planner,
    Executor,
    Summarizer,
    Embedder,
}

/// Per-provider override of a subset of a model's capability fields.
/// Zero/absent fields mean "no override, use the base value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_thinking_tokens: Option<u32>,
}

/// The full capability + pricing record the catalog stores per model id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapability {
    pub model_id: String,
    pub context_window_tokens: u32,
    pub max_output_tokens: u32,
    pub max_thinking_tokens: u32,
    pub supports_tools: ToolSupport,
    pub supports_vision: bool,
    pub supports_thinking: bool,
    pub supports_streaming: bool,
    pub supports_caching: bool,
    /// USD per million input tokens.
    pub input_price_per_1m: f64,
    /// USD per million output tokens.
    pub output_price_per_1m: f64,
    /// Optional fixed per-request cost, added on top of token-based cost.
    #[serde(default)]
    pub fixed_cost: f64,
    /// provider id -> override of a subset of fields.
    #[serde(default)]
    pub provider_overrides: HashMap<String, ProviderOverride>,
    /// Ordered list of model ids to try if this one is denied.
    #[serde(default)]
    pub fallback_chain: Vec<String>,
}

impl ModelCapability {
    /// "No pricing metadata" per spec: all three price fields are exactly
    /// zero.
    pub fn has_no_pricing(&self) -> bool {
        self.input_price_per_1m == 0.0 && self.output_price_per_1m == 0.0 && self.fixed_cost == 0.0
    }

    /// Estimated USD cost for prompt/output/thinking token counts. Thinking
    /// tokens are billed at the output rate, matching the resolver formula.
    pub fn estimate_cost(&self, prompt_tokens: u32, output_tokens: u32, thinking_tokens: u32) -> f64 {
        let prompt = prompt_tokens as f64 * self.input_price_per_1m / 1_000_000.0;
        let output = output_tokens as f64 * self.output_price_per_1m / 1_000_000.0;
        let thinking = thinking_tokens as f64 * self.output_price_per_1m / 1_000_000.0;
        prompt + output + thinking + self.fixed_cost
    }

    /// Apply a named provider's override, returning a new capability record
    /// with non-zero override fields replacing the base values. The base
    /// record is left untouched; callers hold the canonical catalog entry.
    pub fn effective(&self, provider_id: &str) -> ModelCapability {
        let mut out = self.clone();
        if let Some(ov) = self.provider_overrides.get(provider_id) {
            if let Some(ctx) = ov.context_window_tokens {
                out.context_window_tokens = ctx;
            }
            if let Some(max_out) = ov.max_output_tokens {
                out.max_output_tokens = max_out;
            }
            if let Some(max_think) = ov.max_thinking_tokens {
                out.max_thinking_tokens = max_think;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelCapability {
        ModelCapability {
            model_id: "m".into(),
            context_window_tokens: 1000,
            max_output_tokens: 500,
            max_thinking_tokens: 0,
            supports_tools: ToolSupport::Basic,
            supports_vision: false,
            supports_thinking: false,
            supports_streaming: true,
            supports_caching: false,
            input_price_per_1m: 1.0,
            output_price_per_1m: 2.0,
            fixed_cost: 0.0,
            provider_overrides: HashMap::new(),
            fallback_chain: vec![],
        }
    }

    #[test]
    fn estimate_cost_bills_thinking_at_output_rate() {
        let cap = sample();
        let cost = cap.estimate_cost(100, 100, 50);
        // 100*1/1e6 + 100*2/1e6 + 50*2/1e6
        assert!((cost - 0.00040).abs() < 1e-9);
    }

    #[test]
    fn has_no_pricing_true_only_when_all_zero() {
        let mut cap = sample();
        cap.input_price_per_1m = 0.0;
        cap.output_price_per_1m = 0.0;
        assert!(cap.has_no_pricing());
        cap.fixed_cost = 0.01;
        assert!(!cap.has_no_pricing());
    }

    #[test]
    fn effective_applies_only_nonzero_override_fields() {
        let mut cap = sample();
        cap.provider_overrides.insert(
            "acme".into(),
            ProviderOverride {
                context_window_tokens: Some(2000),
                max_output_tokens: None,
                max_thinking_tokens: None,
            },
        );
        let eff = cap.effective("acme");
        assert_eq!(eff.context_window_tokens, 2000);
        assert_eq!(eff.max_output_tokens, 500); // unchanged

        let unaffected = cap.effective("other");
        assert_eq!(unaffected.context_window_tokens, 1000);
    }
}
