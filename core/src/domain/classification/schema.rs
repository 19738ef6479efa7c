use serde_json::{Map, Value, json};

use crate::domain::classification::value_objects::OutputLanguage;

pub const FOOD_RESULT_SCHEMA_NAME: &str = "food_result";

const BASE_FIELDS: [(&str, &str); 5] = [
    ("label", "string"),
    ("confidence", "number"),
    ("calories_kcal", "number"),
    ("serving", "string"),
    ("notes", "string"),
];

const KOREAN_FIELDS: [(&str, &str); 3] = [
    ("label_ko", "string"),
    ("serving_ko", "string"),
    ("notes_ko", "string"),
];

/// Returns the closed JSON schema for a single food classification.
pub fn get_food_result_schema(language: OutputLanguage) -> Value {
    let mut fields: Vec<(&str, &str)> = BASE_FIELDS.to_vec();
    if language.is_korean() {
        fields.extend(KOREAN_FIELDS);
    }

    let mut properties = Map::new();
    for (name, kind) in &fields {
        properties.insert(name.to_string(), json!({ "type": kind }));
    }
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": required,
    })
}
