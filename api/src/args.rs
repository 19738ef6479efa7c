use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser, builder::BoolishValueParser};
use foodlens_core::domain::{
    classification::value_objects::{ApiCapabilities, ClassificationMode, OutputLanguage},
    common::{
        ClassifierConfig, DEFAULT_CHAT_MODEL, DEFAULT_FALLBACK_MODEL, DEFAULT_OPENAI_BASE_URL,
        FoodLensConfig, LLMConfig, LabelsConfig, LocalModelConfig,
    },
};

#[derive(Debug, Clone, Parser)]
#[command(name = "foodlens", version, about = "Food image classification API")]
pub struct Args {
    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub openai: OpenAiArgs,

    #[command(flatten)]
    pub classifier: ClassifierArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long = "server-host", env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "server-port", env = "PORT", default_value_t = 3333)]
    pub port: u16,

    /// Prefix for every route, e.g. `/api`.
    #[arg(long = "root-path", env = "ROOT_PATH", default_value = "")]
    pub root_path: String,

    #[arg(
        long = "allowed-origins",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://127.0.0.1:5173"
    )]
    pub allowed_origins: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OpenAiArgs {
    #[arg(long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "openai-base-url", env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub base_url: String,

    #[arg(long = "openai-org-id", env = "OPENAI_ORG_ID")]
    pub organization: Option<String>,

    #[arg(long = "openai-project-id", env = "OPENAI_PROJECT_ID")]
    pub project: Option<String>,

    #[arg(long = "chat-model", env = "CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    #[arg(
        long = "chat-model-fallback",
        env = "CHAT_MODEL_FALLBACK",
        default_value = DEFAULT_FALLBACK_MODEL
    )]
    pub fallback_model: String,

    /// Whether the `/responses` surface is available.
    #[arg(
        long = "openai-modern-api",
        env = "OPENAI_MODERN_API",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub modern_api: bool,

    /// Whether the `/chat/completions` surface is available.
    #[arg(
        long = "openai-legacy-api",
        env = "OPENAI_LEGACY_API",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub legacy_api: bool,

    #[arg(long = "openai-timeout-secs", env = "OPENAI_TIMEOUT_SECS", default_value_t = 90)]
    pub timeout_secs: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClassifierArgs {
    /// Mode used when a request does not name one.
    #[arg(long = "mode", env = "MODE", default_value = "chat")]
    pub mode: ClassificationMode,

    #[arg(
        long = "use-reasoning",
        env = "USE_REASONING",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub use_reasoning: bool,

    #[arg(long = "output-lang", env = "OUTPUT_LANG", default_value = "en")]
    pub output_lang: String,

    #[arg(long = "labels-path", env = "FOOD_LABELS_PATH", default_value = "food_labels.json")]
    pub labels_path: PathBuf,

    #[arg(long = "fuzzy-cutoff", env = "FUZZY_CUTOFF", default_value_t = 0.6)]
    pub fuzzy_cutoff: f64,

    #[arg(long = "local-model-path", env = "LOCAL_MODEL_PATH")]
    pub local_model_path: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct LogArgs {
    #[arg(long = "log-filter", env = "LOG_FILTER", default_value = "info")]
    pub filter: String,

    #[arg(
        long = "log-json",
        env = "LOG_JSON",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,
}

impl ClassifierArgs {
    /// Mode applied to a request, honouring the reasoning toggle.
    pub fn effective_mode(&self, requested: Option<ClassificationMode>) -> ClassificationMode {
        match requested.unwrap_or(self.mode) {
            ClassificationMode::Chat if self.use_reasoning => ClassificationMode::ChatReasoned,
            mode => mode,
        }
    }
}

impl From<Args> for FoodLensConfig {
    fn from(args: Args) -> Self {
        let fallback_model = Some(args.openai.fallback_model.trim().to_string())
            .filter(|model| !model.is_empty());

        FoodLensConfig {
            llm: LLMConfig {
                api_key: args
                    .openai
                    .api_key
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty()),
                base_url: args.openai.base_url,
                organization: args.openai.organization,
                project: args.openai.project,
                chat_model: args.openai.chat_model,
                fallback_model,
                capabilities: ApiCapabilities {
                    modern: args.openai.modern_api,
                    legacy: args.openai.legacy_api,
                },
                timeout: Duration::from_secs(args.openai.timeout_secs),
            },
            classifier: ClassifierConfig {
                output_language: OutputLanguage::from_code(&args.classifier.output_lang),
                fuzzy_cutoff: args.classifier.fuzzy_cutoff,
            },
            labels: LabelsConfig {
                path: args.classifier.labels_path,
            },
            local_model: LocalModelConfig {
                model_path: args.classifier.local_model_path,
            },
        }
    }
}
