use std::{path::PathBuf, time::Duration};

use uuid::{NoContext, Timestamp, Uuid};

use crate::domain::classification::value_objects::{ApiCapabilities, OutputLanguage};

pub mod entities;
pub mod services;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

#[derive(Clone, Debug)]
pub struct FoodLensConfig {
    pub llm: LLMConfig,
    pub classifier: ClassifierConfig,
    pub labels: LabelsConfig,
    pub local_model: LocalModelConfig,
}

#[derive(Clone, Debug)]
pub struct LLMConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub chat_model: String,
    pub fallback_model: Option<String>,
    pub capabilities: ApiCapabilities,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    pub output_language: OutputLanguage,
    pub fuzzy_cutoff: f64,
}

#[derive(Clone, Debug)]
pub struct LabelsConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct LocalModelConfig {
    pub model_path: Option<PathBuf>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            organization: None,
            project: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            capabilities: ApiCapabilities::default(),
            timeout: Duration::from_secs(90),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            output_language: OutputLanguage::En,
            fuzzy_cutoff: DEFAULT_FUZZY_CUTOFF,
        }
    }
}

pub fn generate_uuid_v7() -> Uuid {
    let seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Uuid::new_v7(Timestamp::from_unix(NoContext, seconds, 0))
}
