//! The Router: least-cost selection over a candidate set (spec §4.3).
//!
//! Grounded on `providers/src/smart_router.rs`'s `fallback_tiers()` shape
//! and `ModelPricing::estimate_cost`, generalized into full capability-
//! constrained, cost-sorted selection.

use pryx_domain::ModelCapability;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::resolver::{Action, Resolution};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub candidates: Vec<String>,
    pub fallback_chain: Vec<String>,
    pub provider: String,
    pub requires_tools: bool,
    pub requires_vision: bool,
    pub requires_thinking: bool,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub thinking_tokens: u32,
    pub max_cost: Option<f64>,
}

fn admits(cap: &ModelCapability, req: &RouteRequest) -> bool {
    if req.prompt_tokens + req.output_tokens > cap.context_window_tokens {
        return false;
    }
    if cap.max_output_tokens > 0 && req.output_tokens > cap.max_output_tokens {
        return false;
    }
    if req.requires_tools && cap.supports_tools == pryx_domain::ToolSupport::None {
        return false;
    }
    if req.requires_vision && !cap.supports_vision {
        return false;
    }
    if req.requires_thinking && !cap.supports_thinking {
        return false;
    }
    if cap.max_thinking_tokens > 0 && req.thinking_tokens > cap.max_thinking_tokens {
        return false;
    }
    let cost = cap.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens);
    if let Some(max_cost) = req.max_cost {
        if max_cost > 0.0 && cost > max_cost {
            return false;
        }
    }
    true
}

fn cost_key(cap: &ModelCapability, req: &RouteRequest) -> f64 {
    if cap.has_no_pricing() {
        f64::INFINITY
    } else {
        cap.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens)
    }
}

/// Select the cheapest compliant candidate. Ties at equal cost break by
/// model id, lexicographically ascending.
pub fn select(catalog: &Catalog, req: &RouteRequest) -> Resolution {
    let mut admitted: Vec<ModelCapability> = req
        .candidates
        .iter()
        .filter_map(|id| catalog.effective(id, &req.provider))
        .filter(|cap| admits(cap, req))
        .collect();

    admitted.sort_by(|a, b| {
        cost_key(a, req)
            .partial_cmp(&cost_key(b, req))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.model_id.cmp(&b.model_id))
    });

    if let Some(winner) = admitted.into_iter().next() {
        let cost = winner.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens);
        return Resolution {
            action: Action::Allow,
            target_model: Some(winner.model_id),
            reason: "cheapest compliant candidate".into(),
            estimated_cost: cost,
        };
    }

    for fb in &req.fallback_chain {
        if let Some(cap) = catalog.effective(fb, &req.provider) {
            if admits(&cap, req) {
                let cost = cap.estimate_cost(req.prompt_tokens, req.output_tokens, req.thinking_tokens);
                return Resolution {
                    action: Action::Fallback,
                    target_model: Some(cap.model_id),
                    reason: "no candidate qualified; used fallback chain".into(),
                    estimated_cost: cost,
                };
            }
        }
    }

    Resolution {
        action: Action::Deny,
        target_model: None,
        reason: "no candidate or fallback satisfies constraints".into(),
        estimated_cost: 0.0,
    }
}
