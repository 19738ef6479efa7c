use foodlens_core::domain::classification::{
    entities::{ClassificationResult, LocalClassification},
    value_objects::ClassificationMode,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Multipart body of `POST /classify`, documented for OpenAPI.
#[derive(Debug, ToSchema)]
pub struct ClassifyImageRequest {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    pub mode: Option<ClassificationMode>,
    #[schema(example = "en")]
    pub lang: Option<String>,
}

/// Fields collected from the multipart form.
#[derive(Debug, Default, Validate)]
pub struct ClassifyImageForm {
    #[validate(length(
        min = 1,
        max = 10485760,
        message = "image must be between 1 byte and 10 MiB"
    ))]
    pub image: Vec<u8>,
    pub mode: Option<String>,
    #[validate(length(max = 8, message = "lang must be a short language code"))]
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, ToSchema)]
#[serde(untagged)]
pub enum ClassifyImageResponse {
    /// Structured result plus a human-readable summary.
    Classified {
        text: String,
        data: ClassificationResult,
    },
    /// The model answered but no JSON could be recovered.
    Raw { raw: String },
    Local(LocalClassification),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_validation() {
        let form = ClassifyImageForm {
            image: vec![1, 2, 3],
            mode: Some("chat".to_string()),
            lang: Some("ko".to_string()),
        };
        assert!(form.validate().is_ok());

        let empty = ClassifyImageForm::default();
        assert!(empty.validate().is_err());

        let oversized = ClassifyImageForm {
            image: vec![0; MAX_IMAGE_SIZE + 1],
            ..ClassifyImageForm::default()
        };
        assert!(oversized.validate().is_err());
    }
}
