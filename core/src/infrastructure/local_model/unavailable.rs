use crate::domain::{
    classification::{entities::LocalClassification, ports::LocalClassifier},
    common::entities::app_errors::CoreError,
};

/// Stand-in used when the crate is built without `local-inference`.
#[derive(Debug, Clone, Default)]
pub struct UnavailableLocalClassifier;

impl LocalClassifier for UnavailableLocalClassifier {
    async fn classify(&self, _image_data: Vec<u8>) -> Result<LocalClassification, CoreError> {
        Err(CoreError::LocalModelUnavailable(
            "built without the local-inference feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_unavailable() {
        let err = UnavailableLocalClassifier
            .classify(vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::LocalModelUnavailable(_)));
    }
}
