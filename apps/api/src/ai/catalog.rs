//! Model Catalog: the authoritative, read-only list of AI models the service may call.
//!
//! Models are grouped by tier. Each use case visits the tiers in its own order:
//! feedback is quality-first, chat is availability-first.

use serde::{Deserialize, Serialize};

/// Quality/availability classification of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Premium,
    Balanced,
    Free,
}

impl ModelTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelTier::Premium => "premium",
            ModelTier::Balanced => "balanced",
            ModelTier::Free => "free",
        }
    }
}

/// Which workflow is asking for a model. Drives tier order and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    Chat,
    Feedback,
}

impl UseCase {
    /// Tier visiting order for this use case.
    pub fn tier_order(self) -> [ModelTier; 3] {
        match self {
            UseCase::Feedback => [ModelTier::Premium, ModelTier::Balanced, ModelTier::Free],
            UseCase::Chat => [ModelTier::Balanced, ModelTier::Free, ModelTier::Premium],
        }
    }

    /// Log prefix, matches what operators grep for.
    pub fn label(self) -> &'static str {
        match self {
            UseCase::Chat => "AI Chat",
            UseCase::Feedback => "AI Analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub name: &'static str,
    pub provider: &'static str,
    pub tier: ModelTier,
}

const fn model(name: &'static str, provider: &'static str, tier: ModelTier) -> ModelDescriptor {
    ModelDescriptor {
        name,
        provider,
        tier,
    }
}

/// Every known model, grouped by tier and in priority order within each tier.
/// Names are unique across the whole catalog.
pub static CATALOG: &[ModelDescriptor] = &[
    // Premium: best quality
    model("claude-3-5-sonnet-20241022", "Anthropic", ModelTier::Premium),
    model("gpt-4o", "OpenAI", ModelTier::Premium),
    model("claude-3-7-sonnet", "Anthropic", ModelTier::Premium),
    // Balanced: good quality, better availability
    model("gpt-4o-mini", "OpenAI", ModelTier::Balanced),
    model("claude-3-haiku-20240307", "Anthropic", ModelTier::Balanced),
    model("gemini-1.5-pro", "Google", ModelTier::Balanced),
    model("gemini-1.5-flash", "Google", ModelTier::Balanced),
    // Free-tier friendly
    model("llama-3.1-405b-instruct", "Meta", ModelTier::Free),
    model("llama-3.1-70b-instruct", "Meta", ModelTier::Free),
    model("mistral-large-latest", "Mistral", ModelTier::Free),
    model("qwen2.5-72b-instruct", "Qwen", ModelTier::Free),
];

/// Models in one tier, catalog order preserved.
pub fn models_in_tier(tier: ModelTier) -> impl Iterator<Item = &'static ModelDescriptor> {
    CATALOG.iter().filter(move |m| m.tier == tier)
}

/// Looks up a model by exact name.
pub fn find_model(name: &str) -> Option<&'static ModelDescriptor> {
    CATALOG.iter().find(|m| m.name == name)
}

/// Builds the ordered candidate list for a use case.
///
/// A non-blank `preferred` model is placed first regardless of its tier (it does
/// not need to be in the catalog) and removed from its original position; the
/// rest keep their relative order.
pub fn models_for_use_case(use_case: UseCase, preferred: Option<&str>) -> Vec<String> {
    let ordered = use_case
        .tier_order()
        .into_iter()
        .flat_map(models_in_tier)
        .map(|m| m.name.to_string());

    match preferred.map(str::trim).filter(|p| !p.is_empty()) {
        Some(preferred) => std::iter::once(preferred.to_string())
            .chain(ordered.filter(|name| name != preferred))
            .collect(),
        None => ordered.collect(),
    }
}
