use crate::domain::classification::{
    entities::PromptSpec,
    schema::get_food_result_schema,
    value_objects::{AllowedLabels, OutputLanguage},
};

pub const MAX_CANDIDATES: usize = 4;

const SCHEMA_SKETCH: &str = "{\n  \"label\": string,\n  \"confidence\": number,\n  \"calories_kcal\": number,\n  \"serving\": string,\n  \"notes\": string\n}\n";

/// Drops every non-ASCII character.
pub fn ascii_clean(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Builds the single-pass classification prompt.
///
/// The result is a pure function of its inputs, so identical arguments yield
/// byte-identical text. An override replaces the instructions but keeps the
/// schema for the requested language.
pub fn build_classification_prompt(
    labels: &AllowedLabels,
    language: OutputLanguage,
    prompt_override: Option<&str>,
) -> PromptSpec {
    let text = match prompt_override {
        Some(text) => text.to_string(),
        None => default_instructions(labels, language),
    };

    PromptSpec {
        text,
        schema: Some(get_food_result_schema(language)),
    }
}

fn default_instructions(labels: &AllowedLabels, language: OutputLanguage) -> String {
    let label_block = if labels.is_empty() {
        String::new()
    } else {
        let ascii_labels: Vec<String> = labels.iter().map(ascii_clean).collect();
        format!("\nAllowed labels: {}", ascii_labels.join(", "))
    };

    let korean_block = if language.is_korean() {
        "Output language: Korean fields requested. \
         Additionally, include 'label_ko', 'serving_ko', and 'notes_ko' with Korean strings. \
         'label' must still be from the English allowed list, but 'label_ko' is the Korean name.\n"
    } else {
        ""
    };

    let mut prompt = String::new();
    prompt.push_str(
        "Look at the image and return the best-matching food label \
         (use one from the allowed list or 'unknown') and an average calorie estimate.\n",
    );
    prompt.push_str("Respond with JSON only, no extra text. JSON schema (base):\n");
    prompt.push_str(SCHEMA_SKETCH);
    prompt.push_str(korean_block);
    prompt.push_str(
        "Rules:\n\
         - label must be from the allowed list or 'unknown'\n\
         - confidence is 0..1\n\
         - calories_kcal is a single representative value (put ranges in notes)\n\
         - notes should include uncertainty or 2-3 alternatives if relevant\n",
    );
    prompt.push_str(&label_block);
    prompt.push('\n');
    prompt.push_str(
        "Be conservative on calories; if not confident in the label, \
         use 'unknown' and list alternatives in notes.",
    );
    prompt
}

/// First pass of two-pass mode: free-form candidates, no schema.
pub fn build_reasoning_prompt(labels: &AllowedLabels) -> PromptSpec {
    let mut text = format!(
        "List up to {} food label candidates from the image with a short reason for each. \
         Exclude labels not in the allowed list. \
         Output format: 'label1 | reason; label2 | reason; ...'",
        MAX_CANDIDATES
    );
    if !labels.is_empty() {
        text.push_str(" Allowed list: ");
        text.push_str(&labels.iter().collect::<Vec<_>>().join(", "));
    }

    PromptSpec { text, schema: None }
}

/// Second pass of two-pass mode: commit to one candidate or `unknown`.
pub fn build_selection_prompt(candidates: &[String], language: OutputLanguage) -> String {
    let candidate_block = if candidates.is_empty() {
        "(none)".to_string()
    } else {
        candidates.join(", ")
    };

    let korean_addendum = if language.is_korean() {
        "Also include 'label_ko', 'serving_ko', and 'notes_ko' in Korean. \
         'label' remains from the English allowed list."
    } else {
        ""
    };

    format!(
        "Choose the single best label from the candidates for the image, \
         or use 'unknown' if not confident. Respond ONLY with JSON.\n\
         Candidates: {}\n\
         Follow the same JSON schema {{label, confidence, calories_kcal, serving, notes}}. \
         Put alternatives/uncertainty in notes. {}",
        candidate_block, korean_addendum
    )
}
