use crate::domain::classification::{prompts::MAX_CANDIDATES, value_objects::AllowedLabels};

/// Pulls candidate labels out of `label | reason; label | reason` text.
///
/// Candidates are lower-cased, restricted to the allow-list, deduplicated and
/// capped at [`MAX_CANDIDATES`]. With an empty allow-list every non-empty
/// candidate is kept.
pub fn extract_candidates(text: &str, labels: &AllowedLabels) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for part in text.split(';') {
        let head = part.split('|').next().unwrap_or_default();
        let candidate = head.trim().to_lowercase();
        if candidate.is_empty() {
            continue;
        }

        if !labels.is_empty() && !labels.contains(&candidate) {
            continue;
        }
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
        if candidates.len() == MAX_CANDIDATES {
            break;
        }
    }

    candidates
}

/// Model used for the selection pass: the fallback unless absent or equal to
/// the primary.
pub fn selection_model<'a>(primary: &'a str, fallback: Option<&'a str>) -> &'a str {
    match fallback.map(str::trim) {
        Some(model) if !model.is_empty() && model != primary => model,
        _ => primary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> AllowedLabels {
        AllowedLabels::new(
            ["pizza", "burger", "Ramen", "sushi", "salad"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_extracts_allowed_candidates() {
        let text = "Pizza | round crust; ramen | broth; tacos | folded; burger | bun";
        assert_eq!(
            extract_candidates(text, &labels()),
            vec!["pizza", "ramen", "burger"]
        );
    }

    #[test]
    fn test_deduplicates_and_caps() {
        let text = "pizza|a; PIZZA|b; burger; ramen; sushi; salad";
        let candidates = extract_candidates(text, &labels());
        assert_eq!(candidates, vec!["pizza", "burger", "ramen", "sushi"]);
        assert_eq!(candidates.len(), MAX_CANDIDATES);
    }

    #[test]
    fn test_empty_allow_list_keeps_everything() {
        let text = "bibimbap | rice bowl; ; kimchi";
        assert_eq!(
            extract_candidates(text, &AllowedLabels::default()),
            vec!["bibimbap", "kimchi"]
        );
    }

    #[test]
    fn test_unstructured_text_yields_nothing() {
        assert!(extract_candidates("I cannot tell what this is.", &labels()).is_empty());
    }

    #[test]
    fn test_selection_model() {
        assert_eq!(selection_model("gpt-4o-mini", Some("gpt-4.1-mini")), "gpt-4.1-mini");
        assert_eq!(selection_model("gpt-4o-mini", Some("gpt-4o-mini")), "gpt-4o-mini");
        assert_eq!(selection_model("gpt-4o-mini", Some("  ")), "gpt-4o-mini");
        assert_eq!(selection_model("gpt-4o-mini", None), "gpt-4o-mini");
    }
}
