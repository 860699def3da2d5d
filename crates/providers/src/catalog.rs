//! Model Catalog (C3): two-tier lookup (exact, regex) plus a heuristic
//! fallback, and provider-override application on read.
//!
//! Grounded on `domain/src/config/llm.rs`'s `ModelPricing`/`RouterConfig`
//! shapes, generalized from the teacher's tier-based router into a
//! capability-table-driven catalog.

use std::collections::HashMap;

use pryx_domain::ModelCapability;
use regex::Regex;

/// Capability record returned by the heuristic lookup for model ids
/// containing the substring `vision` (catalog lookup step 3). Kept minimal
/// and synthetic — not the output of any real vendor catalog.
fn vision_heuristic_capability(model_id: &str) -> ModelCapability {
    ModelCapability {
        model_id: model_id.to_string(),
        context_window_tokens: 4096,
        max_output_tokens: 4096,
        max_thinking_tokens: 0,
        supports_tools: pryx_domain::ToolSupport::None,
        supports_vision: true,
        supports_thinking: false,
        supports_streaming: false,
        supports_caching: false,
        input_price_per_1m: 0.0,
        output_price_per_1m: 0.0,
        fixed_cost: 0.0,
        provider_overrides: HashMap::new(),
        fallback_chain: vec![],
    }
}

pub struct Catalog {
    exact: HashMap<String, ModelCapability>,
    /// (pattern, capability), checked in insertion order; first match wins.
    patterns: Vec<(Regex, ModelCapability)>,
    enable_vision_heuristic: bool,
}

impl Catalog {
    pub fn new(enable_vision_heuristic: bool) -> Self {
        Self {
            exact: HashMap::new(),
            patterns: Vec::new(),
            enable_vision_heuristic,
        }
    }

    /// Populate (or overwrite) an exact entry.
    pub fn insert(&mut self, cap: ModelCapability) {
        self.exact.insert(cap.model_id.clone(), cap);
    }

    /// Append a pattern entry. Later appends are checked after earlier ones.
    pub fn insert_pattern(&mut self, pattern: Regex, cap: ModelCapability) {
        self.patterns.push((pattern, cap));
    }

    /// Merge another catalog into this one: exact entries are last-writer-
    /// wins (the other catalog wins on conflicts), patterns are appended.
    pub fn merge(&mut self, other: Catalog) {
        for (id, cap) in other.exact {
            self.exact.insert(id, cap);
        }
        self.patterns.extend(other.patterns);
    }

    /// The four-step lookup algorithm of spec §4.3: exact, then first regex
    /// match in insertion order, then the `vision` substring heuristic (if
    /// enabled), then miss.
    pub fn lookup(&self, model_id: &str) -> Option<ModelCapability> {
        if let Some(cap) = self.exact.get(model_id) {
            return Some(cap.clone());
        }
        for (pattern, cap) in &self.patterns {
            if pattern.is_match(model_id) {
                return Some(cap.clone());
            }
        }
        if self.enable_vision_heuristic && model_id.contains("vision") {
            return Some(vision_heuristic_capability(model_id));
        }
        None
    }

    /// Apply a named provider's overrides to whatever `lookup` would return.
    pub fn effective(&self, model_id: &str, provider_id: &str) -> Option<ModelCapability> {
        self.lookup(model_id).map(|cap| cap.effective(provider_id))
    }
}

/// A small built-in catalog seeded at startup, standing in for the
/// "embedded default JSON" of spec §4.3 until a fetched vendor catalog is
/// merged on top via [`Catalog::merge`].
pub fn embedded_defaults(enable_vision_heuristic: bool) -> Catalog {
    let mut catalog = Catalog::new(enable_vision_heuristic);
    catalog.insert(ModelCapability {
        model_id: "gpt-4o".into(),
        context_window_tokens: 128_000,
        max_output_tokens: 16_384,
        max_thinking_tokens: 0,
        supports_tools: pryx_domain::ToolSupport::StrictJson,
        supports_vision: true,
        supports_thinking: false,
        supports_streaming: true,
        supports_caching: false,
        input_price_per_1m: 2.50,
        output_price_per_1m: 10.0,
        fixed_cost: 0.0,
        provider_overrides: HashMap::new(),
        fallback_chain: vec!["gpt-4o-mini".into()],
    });
    catalog.insert(ModelCapability {
        model_id: "gpt-4o-mini".into(),
        context_window_tokens: 128_000,
        max_output_tokens: 16_384,
        max_thinking_tokens: 0,
        supports_tools: pryx_domain::ToolSupport::StrictJson,
        supports_vision: true,
        supports_thinking: false,
        supports_streaming: true,
        supports_caching: false,
        input_price_per_1m: 0.15,
        output_price_per_1m: 0.60,
        fixed_cost: 0.0,
        provider_overrides: HashMap::new(),
        fallback_chain: vec![],
    });
    catalog.insert(ModelCapability {
        model_id: "claude-3-5-sonnet".into(),
        context_window_tokens: 200_000,
        max_output_tokens: 8_192,
        max_thinking_tokens: 0,
        supports_tools: pryx_domain::ToolSupport::StrictJson,
        supports_vision: true,
        supports_thinking: true,
        supports_streaming: true,
        supports_caching: true,
        input_price_per_1m: 3.0,
        output_price_per_1m: 15.0,
        fixed_cost: 0.0,
        provider_overrides: HashMap::new(),
        fallback_chain: vec!["gpt-4o-mini".into()],
    });
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(id: &str) -> ModelCapability {
        ModelCapability {
            model_id: id.to_string(),
            context_window_tokens: 1000,
            max_output_tokens: 500,
            max_thinking_tokens: 0,
            supports_tools: pryx_domain::ToolSupport::Basic,
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
    fn exact_match_wins_over_pattern() {
        let mut catalog = Catalog::new(true);
        catalog.insert_pattern(Regex::new("^gpt-.*").unwrap(), cap("pattern-hit"));
        catalog.insert(cap("gpt-4"));
        let found = catalog.lookup("gpt-4").unwrap();
        assert_eq!(found.model_id, "gpt-4");
    }

    #[test]
    fn pattern_match_used_when_no_exact_entry() {
        let mut catalog = Catalog::new(true);
        catalog.insert_pattern(Regex::new("^gpt-.*").unwrap(), cap("pattern-hit"));
        let found = catalog.lookup("gpt-5-preview").unwrap();
        assert_eq!(found.model_id, "pattern-hit");
    }

    #[test]
    fn vision_heuristic_applies_when_enabled() {
        let catalog = Catalog::new(true);
        let found = catalog.lookup("some-vendor-vision-model").unwrap();
        assert!(found.supports_vision);
        assert_eq!(found.context_window_tokens, 4096);
    }

    #[test]
    fn vision_heuristic_disabled_returns_none_on_miss() {
        let catalog = Catalog::new(false);
        assert!(catalog.lookup("some-vendor-vision-model").is_none());
    }

    #[test]
    fn merge_is_last_writer_wins_for_exact_entries() {
        let mut base = Catalog::new(true);
        base.insert(cap("shared"));
        let mut overlay = Catalog::new(true);
        let mut overlay_cap = cap("shared");
        overlay_cap.context_window_tokens = 9999;
        overlay.insert(overlay_cap);

        base.merge(overlay);
        assert_eq!(base.lookup("shared").unwrap().context_window_tokens, 9999);
    }

    #[test]
    fn effective_applies_provider_override() {
        let mut catalog = Catalog::new(true);
        let mut c = cap("m");
        c.provider_overrides.insert(
            "acme".into(),
            pryx_domain::ProviderOverride {
                context_window_tokens: Some(42),
                max_output_tokens: None,
                max_thinking_tokens: None,
            },
        );
        catalog.insert(c);
        let eff = catalog.effective("m", "acme").unwrap();
        assert_eq!(eff.context_window_tokens, 42);
    }
}
