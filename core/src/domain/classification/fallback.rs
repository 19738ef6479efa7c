use tracing::{debug, info, warn};

use crate::domain::{
    classification::{
        entities::ModelInvocation,
        ports::ChatTransport,
        prompts::ascii_clean,
        schema::FOOD_RESULT_SCHEMA_NAME,
        value_objects::{Channel, Endpoint, ResponseFormat, TransportRequest},
    },
    common::entities::app_errors::{CoreError, FailureKind},
};

const CLASSIFY_MAX_TOKENS: u32 = 500;
const LEGACY_MAX_TOKENS: u32 = 512;
const REASONING_MAX_TOKENS: u32 = 400;

/// Failure that started the chain and the most recent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureContext {
    pub trigger: FailureKind,
    pub last: FailureKind,
}

impl FailureContext {
    fn record(previous: Option<Self>, kind: FailureKind) -> Self {
        match previous {
            Some(ctx) => Self {
                trigger: ctx.trigger,
                last: kind,
            },
            None => Self {
                trigger: kind,
                last: kind,
            },
        }
    }
}

/// One named way of calling the model.
#[derive(Debug, Clone, Copy)]
pub struct FallbackStrategy {
    pub name: &'static str,
    pub channel: Channel,
    pub endpoint: Endpoint,
    pub structured: bool,
    pub ascii_prompt: bool,
    pub include_image: bool,
    pub max_tokens: u32,
    /// Whether this strategy handles the failures seen so far.
    pub applies: fn(&FailureContext) -> bool,
}

impl FallbackStrategy {
    pub fn request(&self, invocation: &ModelInvocation) -> TransportRequest {
        let prompt = if self.ascii_prompt {
            ascii_clean(&invocation.prompt.text)
        } else {
            invocation.prompt.text.clone()
        };

        let format = match (self.structured, self.endpoint) {
            (false, _) => ResponseFormat::None,
            (true, Endpoint::Responses) => match &invocation.prompt.schema {
                Some(schema) => ResponseFormat::JsonSchema {
                    name: FOOD_RESULT_SCHEMA_NAME.to_string(),
                    schema: schema.clone(),
                },
                None => ResponseFormat::None,
            },
            (true, Endpoint::ChatCompletions) => ResponseFormat::JsonObject,
        };

        TransportRequest {
            channel: self.channel,
            endpoint: self.endpoint,
            model: invocation.model.clone(),
            prompt,
            image_b64: self
                .include_image
                .then(|| invocation.image_b64.clone()),
            format,
            max_tokens: self.max_tokens,
        }
    }
}

fn always(_: &FailureContext) -> bool {
    true
}

fn schema_rejected(ctx: &FailureContext) -> bool {
    ctx.last == FailureKind::SchemaRejected
}

fn encoding_failed(ctx: &FailureContext) -> bool {
    ctx.last == FailureKind::Encoding
}

fn encoding_retry(ctx: &FailureContext) -> bool {
    ctx.trigger == FailureKind::Encoding
        && matches!(ctx.last, FailureKind::Encoding | FailureKind::SchemaRejected)
}

/// The environment rejected either the schema or the character set, so try
/// the bare wire paths with a sanitized prompt.
fn degraded_environment(ctx: &FailureContext) -> bool {
    matches!(
        ctx.trigger,
        FailureKind::Encoding | FailureKind::SchemaRejected
    )
}

const fn strategy(
    name: &'static str,
    channel: Channel,
    endpoint: Endpoint,
    structured: bool,
    applies: fn(&FailureContext) -> bool,
) -> FallbackStrategy {
    FallbackStrategy {
        name,
        channel,
        endpoint,
        structured,
        ascii_prompt: matches!(channel, Channel::Wire),
        include_image: true,
        max_tokens: CLASSIFY_MAX_TOKENS,
        applies,
    }
}

/// Ordered fallback chain for models on the responses surface.
///
/// Every structured strategy is immediately followed by its schema-less twin.
pub static MODERN_CHAIN: [FallbackStrategy; 8] = [
    strategy(
        "responses_client_structured",
        Channel::Client,
        Endpoint::Responses,
        true,
        always,
    ),
    strategy(
        "responses_client_plain",
        Channel::Client,
        Endpoint::Responses,
        false,
        schema_rejected,
    ),
    strategy(
        "chat_client_structured",
        Channel::Client,
        Endpoint::ChatCompletions,
        true,
        encoding_failed,
    ),
    strategy(
        "chat_client_plain",
        Channel::Client,
        Endpoint::ChatCompletions,
        false,
        encoding_retry,
    ),
    strategy(
        "responses_wire_structured",
        Channel::Wire,
        Endpoint::Responses,
        true,
        degraded_environment,
    ),
    strategy(
        "responses_wire_plain",
        Channel::Wire,
        Endpoint::Responses,
        false,
        degraded_environment,
    ),
    strategy(
        "chat_wire_structured",
        Channel::Wire,
        Endpoint::ChatCompletions,
        true,
        degraded_environment,
    ),
    strategy(
        "chat_wire_plain",
        Channel::Wire,
        Endpoint::ChatCompletions,
        false,
        degraded_environment,
    ),
];

pub static LEGACY_CHAIN: [FallbackStrategy; 1] = [FallbackStrategy {
    name: "legacy_chat",
    channel: Channel::Client,
    endpoint: Endpoint::ChatCompletions,
    structured: false,
    ascii_prompt: false,
    include_image: false,
    max_tokens: LEGACY_MAX_TOKENS,
    applies: always,
}];

pub static MODERN_REASONING: FallbackStrategy = FallbackStrategy {
    name: "responses_client_reasoning",
    channel: Channel::Client,
    endpoint: Endpoint::Responses,
    structured: false,
    ascii_prompt: false,
    include_image: true,
    max_tokens: REASONING_MAX_TOKENS,
    applies: always,
};

pub static LEGACY_REASONING: FallbackStrategy = FallbackStrategy {
    name: "legacy_chat_reasoning",
    channel: Channel::Client,
    endpoint: Endpoint::ChatCompletions,
    structured: false,
    ascii_prompt: false,
    include_image: false,
    max_tokens: REASONING_MAX_TOKENS,
    applies: always,
};

/// Index of the next strategy at or after `from` that handles `context`.
pub fn next_applicable(
    strategies: &[FallbackStrategy],
    from: usize,
    context: Option<&FailureContext>,
) -> Option<usize> {
    strategies
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, s)| context.is_none_or(|ctx| (s.applies)(ctx)))
        .map(|(idx, _)| idx)
}

/// Walks `strategies` in order until one call succeeds.
///
/// Configuration-type errors abort immediately; recoverable failures feed the
/// strategy predicates and surface as one aggregated error once nothing
/// applicable is left.
pub async fn run_strategies<T: ChatTransport>(
    transport: &T,
    strategies: &[FallbackStrategy],
    invocation: &ModelInvocation,
) -> Result<String, CoreError> {
    let mut context: Option<FailureContext> = None;
    let mut last_error: Option<CoreError> = None;
    let mut attempts = 0;
    let mut cursor = 0;

    while let Some(idx) = next_applicable(strategies, cursor, context.as_ref()) {
        let strategy = &strategies[idx];
        cursor = idx + 1;
        attempts += 1;

        debug!(
            strategy = strategy.name,
            model = %invocation.model,
            attempt = attempts,
            "calling model"
        );

        match transport.send(strategy.request(invocation)).await {
            Ok(text) => {
                info!(
                    strategy = strategy.name,
                    model = %invocation.model,
                    attempts,
                    "model call succeeded"
                );
                return Ok(text);
            }
            Err(err) => {
                let Some(kind) = err.failure_kind() else {
                    return Err(err);
                };
                warn!(
                    strategy = strategy.name,
                    model = %invocation.model,
                    error = %err,
                    "model call failed"
                );
                context = Some(FailureContext::record(context, kind));
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(last) => Err(CoreError::FallbackExhausted {
            attempts,
            last: Box::new(last),
        }),
        None => Err(CoreError::Setup("no call strategy configured".to_string())),
    }
}
