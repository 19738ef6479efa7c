use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::common::entities::app_errors::CoreError;

pub const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone)]
pub struct ClassifyImageInput {
    pub image_data: Vec<u8>,
    pub mode: ClassificationMode,
    /// Falls back to the configured language when absent.
    pub output_language: Option<OutputLanguage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    Chat,
    ChatReasoned,
    Local,
}

impl FromStr for ClassificationMode {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "chat_reasoned" | "reasoned" => Ok(Self::ChatReasoned),
            "local" => Ok(Self::Local),
            other => Err(CoreError::Invalid(format!(
                "unsupported mode '{}', expected chat, chat_reasoned or local",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    #[default]
    En,
    Ko,
}

impl OutputLanguage {
    /// Anything other than `ko` means English.
    pub fn from_code(code: &str) -> Self {
        if code.trim().eq_ignore_ascii_case("ko") {
            Self::Ko
        } else {
            Self::En
        }
    }

    pub fn is_korean(self) -> bool {
        matches!(self, Self::Ko)
    }
}

impl fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::En => f.write_str("en"),
            Self::Ko => f.write_str("ko"),
        }
    }
}

/// Which chat API surfaces the configured provider exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiCapabilities {
    /// The structured `/responses` surface.
    pub modern: bool,
    /// The `/chat/completions` surface.
    pub legacy: bool,
}

impl Default for ApiCapabilities {
    fn default() -> Self {
        Self {
            modern: true,
            legacy: true,
        }
    }
}

/// Permitted food labels, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowedLabels {
    labels: Vec<String>,
    lowered: Vec<String>,
}

impl AllowedLabels {
    pub fn new(labels: Vec<String>) -> Self {
        let lowered = labels.iter().map(|l| l.trim().to_lowercase()).collect();
        Self { labels, lowered }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Returns the canonical spelling of `label` when it is a member.
    pub fn find(&self, label: &str) -> Option<&str> {
        let needle = label.trim().to_lowercase();
        self.lowered
            .iter()
            .position(|l| *l == needle)
            .map(|idx| self.labels[idx].as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.find(label).is_some()
    }

    /// Pairs of (lower-cased, canonical) labels in configured order.
    pub fn lowered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lowered
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().map(String::as_str))
    }
}

/// How a call reaches the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Configured API client: proxy-aware, optional org/project headers, UTF-8 body.
    Client,
    /// Bare HTTP: no proxy, minimal headers, ASCII-escaped body.
    Wire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Responses,
    ChatCompletions,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Responses => "responses",
            Self::ChatCompletions => "chat/completions",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    None,
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
    JsonObject,
}

impl ResponseFormat {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// One concrete outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub channel: Channel,
    pub endpoint: Endpoint,
    pub model: String,
    pub prompt: String,
    pub image_b64: Option<String>,
    pub format: ResponseFormat,
    pub max_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_case_insensitive() {
        let labels = AllowedLabels::new(vec!["Pizza".to_string(), "burger".to_string()]);
        assert_eq!(labels.find("PIZZA"), Some("Pizza"));
        assert_eq!(labels.find(" burger "), Some("burger"));
        assert!(!labels.contains("ramen"));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "Chat".parse::<ClassificationMode>().unwrap(),
            ClassificationMode::Chat
        );
        assert_eq!(
            "chat_reasoned".parse::<ClassificationMode>().unwrap(),
            ClassificationMode::ChatReasoned
        );
        assert_eq!(
            "local".parse::<ClassificationMode>().unwrap(),
            ClassificationMode::Local
        );
        assert!("remote".parse::<ClassificationMode>().is_err());
    }

    #[test]
    fn test_language_from_code() {
        assert_eq!(OutputLanguage::from_code("KO"), OutputLanguage::Ko);
        assert_eq!(OutputLanguage::from_code("en"), OutputLanguage::En);
        assert_eq!(OutputLanguage::from_code("fr"), OutputLanguage::En);
    }
}
