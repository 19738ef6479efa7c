use foodlens_core::domain::classification::{
    entities::ClassificationResult, value_objects::OutputLanguage,
};

struct Headings {
    name: &'static str,
    confidence: &'static str,
    calories: &'static str,
    serving: &'static str,
    notes: &'static str,
    unknown: &'static str,
}

const EN: Headings = Headings {
    name: "Food",
    confidence: "confidence",
    calories: "Calories (avg)",
    serving: "Serving",
    notes: "Notes",
    unknown: "unknown",
};

const KO: Headings = Headings {
    name: "음식 이름",
    confidence: "신뢰도",
    calories: "칼로리 (평균)",
    serving: "1회 제공량",
    notes: "메모",
    unknown: "알 수 없음",
};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whole kcal when the fractional part is under one half, else one decimal.
fn format_calories(calories: f64) -> String {
    if (calories - calories.trunc()).abs() < 0.5 {
        format!("{} kcal", calories.round() as i64)
    } else {
        format!("{:.1} kcal", calories)
    }
}

/// Four-line human summary shown next to the structured result.
pub fn summarize(result: &ClassificationResult, language: OutputLanguage) -> String {
    let headings = if language.is_korean() { &KO } else { &EN };

    let label = non_empty(result.label_ko.as_deref())
        .or(non_empty(Some(result.label.as_str())))
        .unwrap_or(headings.unknown);
    let confidence = result
        .confidence
        .map(|c| format!(" ({}: {:.2})", headings.confidence, c))
        .unwrap_or_default();
    let calories = result
        .calories_kcal
        .map(format_calories)
        .unwrap_or_else(|| headings.unknown.to_string());
    let serving = non_empty(result.serving_ko.as_deref())
        .or(non_empty(Some(result.serving.as_str())))
        .unwrap_or("-");
    let notes = non_empty(result.notes_ko.as_deref()).unwrap_or(result.notes.as_str());

    format!(
        "{} : {}{}\n{} : {}\n{} : {}\n{} : {}",
        headings.name,
        label,
        confidence,
        headings.calories,
        calories,
        headings.serving,
        serving,
        headings.notes,
        notes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pizza() -> ClassificationResult {
        ClassificationResult {
            label: "pizza".to_string(),
            confidence: Some(0.8249),
            calories_kcal: Some(285.3),
            serving: "1 slice".to_string(),
            notes: "pepperoni".to_string(),
            ..ClassificationResult::default()
        }
    }

    #[test]
    fn test_english_summary() {
        assert_eq!(
            summarize(&pizza(), OutputLanguage::En),
            "Food : pizza (confidence: 0.82)\nCalories (avg) : 285 kcal\nServing : 1 slice\nNotes : pepperoni"
        );
    }

    #[test]
    fn test_korean_summary_prefers_korean_fields() {
        let mut result = pizza();
        result.label_ko = Some("피자".to_string());
        result.serving_ko = Some("1조각".to_string());
        result.calories_kcal = Some(285.7);

        assert_eq!(
            summarize(&result, OutputLanguage::Ko),
            "음식 이름 : 피자 (신뢰도: 0.82)\n칼로리 (평균) : 285.7 kcal\n1회 제공량 : 1조각\n메모 : pepperoni"
        );
    }

    #[test]
    fn test_missing_values() {
        let result = ClassificationResult::default();
        assert_eq!(
            summarize(&result, OutputLanguage::En),
            "Food : unknown\nCalories (avg) : unknown\nServing : -\nNotes : "
        );
    }
}
