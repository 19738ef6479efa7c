use crate::domain::{
    classification::{
        fallback::{FallbackStrategy, LEGACY_CHAIN, LEGACY_REASONING, MODERN_CHAIN, MODERN_REASONING},
        value_objects::ApiCapabilities,
    },
    common::entities::app_errors::CoreError,
};

const RETIRED_VISION_MODEL: &str = "gpt-4-vision-preview";

const MODERN_PREFIXES: [&str; 2] = ["gpt-4o", "gpt-4.1"];

/// Collapses shorthand and deprecated names into canonical model ids.
pub fn normalize_model_name(name: &str) -> String {
    let name = name.trim();
    match name {
        "gpt-4-mini" | "gpt4-mini" | "gpt-4o-mini-vision" => "gpt-4o-mini".to_string(),
        "gpt-4.1mini" => "gpt-4.1-mini".to_string(),
        other => other.to_string(),
    }
}

fn legacy_model_alias(name: &str) -> &str {
    match name {
        "gpt-4o-mini-vision" | "gpt-4.1-mini-vision" => RETIRED_VISION_MODEL,
        other => other,
    }
}

fn requires_vision_surface(model: &str) -> bool {
    model.ends_with("-vision")
}

fn is_modern_model(model: &str) -> bool {
    requires_vision_surface(model) || MODERN_PREFIXES.iter().any(|p| model.starts_with(p))
}

/// How a model is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStyle {
    /// Image and prompt through the responses surface with the full fallback chain.
    Modern,
    /// Single text-only chat completion.
    Legacy,
}

impl InvocationStyle {
    pub fn strategies(self) -> &'static [FallbackStrategy] {
        match self {
            Self::Modern => &MODERN_CHAIN,
            Self::Legacy => &LEGACY_CHAIN,
        }
    }

    pub fn reasoning_strategy(self) -> &'static FallbackStrategy {
        match self {
            Self::Modern => &MODERN_REASONING,
            Self::Legacy => &LEGACY_REASONING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub style: InvocationStyle,
    pub model: String,
}

/// Picks the invocation style for `requested`. Pure; performs no I/O.
pub fn resolve_model(
    requested: &str,
    capabilities: ApiCapabilities,
) -> Result<ResolvedModel, CoreError> {
    if !capabilities.modern && !capabilities.legacy {
        return Err(CoreError::Setup(
            "no chat API surface is enabled; enable OPENAI_MODERN_API or OPENAI_LEGACY_API"
                .to_string(),
        ));
    }

    let model = normalize_model_name(requested);

    if requires_vision_surface(&model) && !capabilities.modern {
        return Err(CoreError::Configuration(format!(
            "model '{}' is a deprecated preview or unified vision model and needs the responses API; \
             enable OPENAI_MODERN_API and set CHAT_MODEL without the -vision suffix \
             (e.g. 'gpt-4o-mini' or 'gpt-4.1-mini')",
            model
        )));
    }

    if is_modern_model(&model) && capabilities.modern {
        return Ok(ResolvedModel {
            style: InvocationStyle::Modern,
            model,
        });
    }

    if !capabilities.legacy {
        return Err(CoreError::Setup(format!(
            "model '{}' needs the chat completions surface, which is disabled; \
             enable OPENAI_LEGACY_API or use a gpt-4o / gpt-4.1 model",
            model
        )));
    }

    let legacy = legacy_model_alias(&model);
    if legacy == RETIRED_VISION_MODEL {
        return Err(CoreError::Configuration(format!(
            "'{}' is no longer supported; set CHAT_MODEL='gpt-4o-mini'",
            RETIRED_VISION_MODEL
        )));
    }

    Ok(ResolvedModel {
        style: InvocationStyle::Legacy,
        model: legacy.to_string(),
    })
}
