use serde_json::Value;
use tracing::{debug, info};

use crate::domain::classification::{
    entities::{ClassificationResult, ClassifyOutput},
    similarity::{LabelMatcher, SimilarityScorer},
    value_objects::{AllowedLabels, UNKNOWN_LABEL},
};

pub const MAX_NOTES_CHARS: usize = 400;

const NO_MATCH_NOTE: &str = "no match in allow-list; set to unknown";

/// Parses `text` as JSON, falling back to the outermost `{...}` span.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Turns raw model text into a structured result, or hands the text back.
pub fn parse_model_output<S: SimilarityScorer>(
    text: &str,
    labels: &AllowedLabels,
    matcher: &LabelMatcher<S>,
) -> ClassifyOutput {
    let parsed = match extract_json(text) {
        Some(value @ Value::Object(_)) => serde_json::from_value::<ClassificationResult>(value).ok(),
        _ => None,
    };

    let Some(mut result) = parsed else {
        debug!("model output is not a JSON object, returning raw text");
        return ClassifyOutput::Raw {
            raw: text.to_string(),
        };
    };

    result.confidence = result.confidence.map(|c| c.clamp(0.0, 1.0));
    if !labels.is_empty() {
        correct_label(&mut result, labels, matcher);
    }
    ClassifyOutput::Structured(result)
}

/// Forces `result.label` to be an allow-list member or `unknown`.
pub fn correct_label<S: SimilarityScorer>(
    result: &mut ClassificationResult,
    labels: &AllowedLabels,
    matcher: &LabelMatcher<S>,
) {
    let label = result.label.trim().to_lowercase();

    if label.is_empty() || label == UNKNOWN_LABEL {
        result.label = UNKNOWN_LABEL.to_string();
        return;
    }

    if let Some(canonical) = labels.find(&label) {
        result.label = canonical.to_string();
        return;
    }

    match matcher.best_match(&label, labels) {
        Some(matched) => {
            info!(original = %label, corrected = %matched, "label corrected against allow-list");
            let note = format!("auto-corrected: '{}' -> '{}' (fuzzy)", label, matched);
            result.label = matched.to_string();
            result.label_original = Some(label);
            append_note(&mut result.notes, &note);
        }
        None => {
            info!(original = %label, "label not in allow-list, set to unknown");
            result.label = UNKNOWN_LABEL.to_string();
            result.label_original = Some(label);
            append_note(&mut result.notes, NO_MATCH_NOTE);
        }
    }
}

/// Appends with `"; "` and truncates to [`MAX_NOTES_CHARS`] characters.
pub fn append_note(notes: &mut String, note: &str) {
    if !notes.is_empty() {
        notes.push_str("; ");
    }
    notes.push_str(note);

    if let Some((byte_idx, _)) = notes.char_indices().nth(MAX_NOTES_CHARS) {
        notes.truncate(byte_idx);
    }
}
