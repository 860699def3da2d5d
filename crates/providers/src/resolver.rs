//! The Resolver: single-candidate admission per spec §4.3.
//!
//! Grounded on `providers/src/smart_router.rs`'s resolution-order idiom
//! (explicit > profile > classified > fallback cascade in
//! `resolve_model_for_request`), generalized into the 12-rule sequence.

use pryx_domain::ModelCapability;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub model: String,
    pub provider: String,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub thinking_tokens: u32,
    pub tools: Vec<String>,
    pub images: bool,
    pub max_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Deny,
    Fallback,
    Ask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub action: Action,
    pub target_model: Option<String>,
    pub reason: String,
    pub estimated_cost: f64,
}

impl Resolution {
    fn deny(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Deny,
            target_model: None,
            reason: reason.into(),
            estimated_cost: 0.0,
        }
    }

    fn allow(reason: impl Into<String>, cost: f64) -> Self {
        Self {
            action: Action::Allow,
            target_model: None,
            reason: reason.into(),
            estimated_cost: cost,
        }
    }

    fn fallback(model_id: impl Into<String>, reason: impl Into<String>, cost: f64) -> Self {
        Self {
            action: Action::Fallback,
            target_model: Some(model_id.into()),
            reason: reason.into(),
            estimated_cost: cost,
        }
    }
}

/// Resolve a single candidate model against a request. `allow_unknown` gates
/// rule 1 (§9 open question 1): when `false`, an unknown model denies
/// instead of allowing with a warning.
pub fn resolve(catalog: &Catalog, req: &Request, max_tools_per_request: usize, allow_unknown: bool) -> Resolution {
    // Rule 1: unknown model.
    let Some(base_cap) = catalog.lookup(&req.model) else {
        if allow_unknown {
            return Resolution::allow(
                format!("model '{}' is not in the catalog; allowing with a warning", req.model),
                0.0,
            );
        }
        return Resolution::deny(format!("model '{}' is unknown", req.model));
    };

    // Rule 2: provider overrides.
    let cap = base_cap.effective(&req.provider);

    // Rule 3: estimated cost.
    let estimated = cap.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens);

    // Rule 4: cost cap.
    if let Some(max_cost) = req.max_cost {
        if max_cost > 0.0 && estimated > max_cost {
            return Resolution::deny(format!(
                "estimated cost {estimated:.4} exceeds max_cost {max_cost:.4}"
            ));
        }
    }

    // Rule 5: context window.
    if req.prompt_tokens + req.output_tokens > cap.context_window_tokens {
        return fallback_or_deny(catalog, &cap, req, "context window exceeded", |c| {
            req.prompt_tokens + req.output_tokens <= c.context_window_tokens
        });
    }

    // Rule 6: max output tokens.
    if cap.max_output_tokens > 0 && req.output_tokens > cap.max_output_tokens {
        return fallback_or_deny(catalog, &cap, req, "max output tokens exceeded", |c| {
            c.max_output_tokens == 0 || req.output_tokens <= c.max_output_tokens
        });
    }

    // Rule 7: tool count cap.
    if req.tools.len() > max_tools_per_request {
        return Resolution::deny(format!(
            "tool count {} exceeds per-request cap {}",
            req.tools.len(),
            max_tools_per_request
        ));
    }

    // Rule 8: tools unsupported.
    if !req.tools.is_empty() && cap.supports_tools == pryx_domain::ToolSupport::None {
        return Resolution::deny("tools requested but model does not support tool calling");
    }

    // Rule 9: vision unsupported.
    if req.images && !cap.supports_vision {
        return Resolution::deny("images requested but model does not support vision");
    }

    // Rule 10: thinking unsupported.
    if req.thinking_tokens > 0 && !cap.supports_thinking {
        return Resolution::deny("thinking tokens requested but model does not support thinking");
    }

    // Rule 11: thinking budget.
    if cap.max_thinking_tokens > 0 && req.thinking_tokens > cap.max_thinking_tokens {
        return fallback_or_deny(catalog, &cap, req, "thinking budget exceeded", |c| {
            c.max_thinking_tokens == 0 || req.thinking_tokens <= c.max_thinking_tokens
        });
    }

    // Rule 12: allow.
    Resolution::allow("request satisfies all constraints", estimated)
}

/// Walk `cap.fallback_chain` in order; the first entry that exists in the
/// catalog and satisfies `admits` (evaluated on its own effective
/// capabilities) wins as a `fallback` resolution. Otherwise `deny`.
fn fallback_or_deny(
    catalog: &Catalog,
    cap: &ModelCapability,
    req: &Request,
    reason: &str,
    admits: impl Fn(&ModelCapability) -> bool,
) -> Resolution {
    for candidate_id in &cap.fallback_chain {
        if let Some(candidate) = catalog.effective(candidate_id, &req.provider) {
            if admits(&candidate) {
                let cost = candidate.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens);
                return Resolution::fallback(candidate_id.clone(), reason.to_string(), cost);
            }
        }
    }
    Resolution::deny(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn cap(id: &str, ctx: u32, in_price: f64, out_price: f64) -> ModelCapability {
        ModelCapability {
            model_id: id.to_string(),
            context_window_tokens: ctx,
            max_output_tokens: 0,
            max_thinking_tokens: 0,
            supports_tools: pryx_domain::ToolSupport::Basic,
            supports_vision: false,
            supports_thinking: false,
            supports_streaming: true,
            supports_caching: false,
            input_price_per_1m: in_price,
            output_price_per_1m: out_price,
            fixed_cost: 0.0,
            provider_overrides: Default::default(),
            fallback_chain: vec![],
        }
    }

    fn req(model: &str) -> Request {
        Request {
            model: model.to_string(),
            provider: "acme".to_string(),
            prompt_tokens: 100,
            output_tokens: 100,
            thinking_tokens: 0,
            tools: vec![],
            images: false,
            max_cost: None,
        }
    }

    // ── Rule 1: unknown model ──────────────────────────────────────

    #[test]
    fn unknown_model_allowed_with_warning_by_default() {
        let catalog = Catalog::new(true);
        let res = resolve(&catalog, &req("ghost"), 32, true);
        assert_eq!(res.action, Action::Allow);
        assert!(res.reason.contains("not in the catalog"));
    }

    #[test]
    fn unknown_model_denied_when_strict_flag_set() {
        let catalog = Catalog::new(true);
        let res = resolve(&catalog, &req("ghost"), 32, false);
        assert_eq!(res.action, Action::Deny);
    }

    // ── Rule 4: cost cap ─────────────────────────────────────────────

    #[test]
    fn exceeding_max_cost_denies() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("expensive", 200_000, 10.0, 30.0));
        let mut r = req("expensive");
        r.prompt_tokens = 1_000_000;
        r.output_tokens = 1_000_000;
        r.max_cost = Some(20.0);
        let res = resolve(&catalog, &r, 32, true);
        assert_eq!(res.action, Action::Deny);
    }

    // ── Rule 5: context window / fallback ───────────────────────────

    #[test]
    fn context_window_exceeded_falls_back_when_chain_admits() {
        let mut catalog = Catalog::new(true);
        let mut primary = cap("primary", 50, 1.0, 1.0);
        primary.fallback_chain = vec!["fallback".into()];
        catalog.insert(primary);
        catalog.insert(cap("fallback", 1000, 1.0, 1.0));

        let mut r = req("primary");
        r.prompt_tokens = 900;
        r.output_tokens = 50;
        let res = resolve(&catalog, &r, 32, true);
        assert_eq!(res.action, Action::Fallback);
        assert_eq!(res.target_model.as_deref(), Some("fallback"));
    }

    #[test]
    fn context_window_exceeded_denies_when_no_fallback_admits() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("primary", 50, 1.0, 1.0));
        let mut r = req("primary");
        r.prompt_tokens = 900;
        r.output_tokens = 50;
        let res = resolve(&catalog, &r, 32, true);
        assert_eq!(res.action, Action::Deny);
    }

    // ── Rule 9: vision ───────────────────────────────────────────────

    #[test]
    fn images_requested_without_vision_support_denies() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("text-only", 1000, 1.0, 1.0));
        let mut r = req("text-only");
        r.images = true;
        let res = resolve(&catalog, &r, 32, true);
        assert_eq!(res.action, Action::Deny);
        assert!(res.reason.contains("vision"));
    }

    // ── Rule monotonicity property (spec §8 invariant 5) ────────────

    #[test]
    fn resolver_is_monotonic_in_prompt_tokens() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("m", 1000, 1.0, 1.0));
        let mut small = req("m");
        small.prompt_tokens = 2000; // already exceeds context window alone
        small.output_tokens = 0;
        let mut large = small.clone();
        large.prompt_tokens = 5000;

        let small_res = resolve(&catalog, &small, 32, true);
        let large_res = resolve(&catalog, &large, 32, true);
        assert_eq!(small_res.action, Action::Deny);
        assert_eq!(large_res.action, Action::Deny);
    }

    // ── Rule 7/8: tools ──────────────────────────────────────────────

    #[test]
    fn tool_count_over_cap_denies() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("m", 1000, 1.0, 1.0));
        let mut r = req("m");
        r.tools = vec!["a".into(), "b".into(), "c".into()];
        let res = resolve(&catalog, &r, 2, true);
        assert_eq!(res.action, Action::Deny);
    }

    #[test]
    fn allow_reports_nonzero_cost_when_priced() {
        let mut catalog = Catalog::new(true);
        catalog.insert(cap("m", 1000, 1.0, 1.0));
        let res = resolve(&catalog, &req("m"), 32, true);
        assert_eq!(res.action, Action::Allow);
        assert!(res.estimated_cost > 0.0);
    }
}
