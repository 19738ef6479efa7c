use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Normalized classification returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResult {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub calories_kcal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub serving: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub label_ko: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub serving_ko: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes_ko: Option<String>,
    /// Label as returned by the model, set only when it was corrected.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub label_original: Option<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<ReasoningTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReasoningTrace {
    pub primary_model: String,
    pub fallback_model: String,
    pub raw_reasoning: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocalCandidate {
    pub label: String,
    pub confidence: f64,
}

/// Output shape of the local fallback classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocalClassification {
    pub label: String,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub candidates: Vec<LocalCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocalClassification {
    pub fn from_candidates(candidates: Vec<LocalCandidate>, note: impl Into<String>) -> Self {
        let (label, confidence) = candidates
            .first()
            .map(|c| (c.label.clone(), c.confidence))
            .unwrap_or_else(|| (super::value_objects::UNKNOWN_LABEL.to_string(), 0.0));

        Self {
            label,
            confidence,
            tags: candidates.iter().map(|c| c.label.clone()).collect(),
            candidates,
            note: Some(note.into()),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            label: super::value_objects::UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            tags: Vec::new(),
            candidates: Vec::new(),
            note: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ClassifyOutput {
    Structured(ClassificationResult),
    /// The model answered but no JSON object could be recovered.
    Raw { raw: String },
    Local(LocalClassification),
}

/// Prompt text plus the optional structured-output schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub text: String,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInvocation {
    pub model: String,
    pub prompt: PromptSpec,
    pub image_b64: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_tolerates_loose_types() {
        let result: ClassificationResult = serde_json::from_value(json!({
            "label": "pizza",
            "confidence": "0.8",
            "calories_kcal": 285,
            "serving": null,
            "notes": "thin crust",
            "label_original": "injected"
        }))
        .unwrap();

        assert_eq!(result.label, "pizza");
        assert_eq!(result.confidence, Some(0.8));
        assert_eq!(result.calories_kcal, Some(285.0));
        assert_eq!(result.serving, "");
        assert_eq!(result.label_original, None);
    }

    #[test]
    fn test_local_classification_from_candidates() {
        let local = LocalClassification::from_candidates(
            vec![
                LocalCandidate {
                    label: "imagenet_class_963".to_string(),
                    confidence: 0.7,
                },
                LocalCandidate {
                    label: "imagenet_class_927".to_string(),
                    confidence: 0.2,
                },
            ],
            "MobileNetV2 (ImageNet)",
        );

        assert_eq!(local.label, "imagenet_class_963");
        assert_eq!(local.tags.len(), 2);
        assert!(local.error.is_none());
    }

    #[test]
    fn test_outputs_serialize_untagged() {
        let raw = ClassifyOutput::Raw {
            raw: "no json".to_string(),
        };
        assert_eq!(serde_json::to_value(raw).unwrap(), json!({"raw": "no json"}));

        let failed = ClassifyOutput::Local(LocalClassification::failed("decode"));
        let value = serde_json::to_value(failed).unwrap();
        assert_eq!(value["label"], "unknown");
        assert_eq!(value["error"], "decode");
    }
}
