use std::future::Future;

use crate::domain::{
    classification::{
        entities::{ClassifyOutput, LocalClassification},
        value_objects::{AllowedLabels, ClassifyImageInput, TransportRequest},
    },
    common::entities::app_errors::CoreError,
};

/// Outbound call to the remote chat API.
#[cfg_attr(test, mockall::automock)]
pub trait ChatTransport: Send + Sync {
    /// Sends one request and returns the model's text output.
    fn send(
        &self,
        request: TransportRequest,
    ) -> impl Future<Output = Result<String, CoreError>> + Send;
}

/// Source of the allow-list, read once at start-up.
#[cfg_attr(test, mockall::automock)]
pub trait LabelRepository: Send + Sync {
    fn load_labels(&self) -> impl Future<Output = Result<AllowedLabels, CoreError>> + Send;
}

/// In-process fallback classifier.
#[cfg_attr(test, mockall::automock)]
pub trait LocalClassifier: Send + Sync {
    fn classify(
        &self,
        image_data: Vec<u8>,
    ) -> impl Future<Output = Result<LocalClassification, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait ClassificationService: Send + Sync {
    fn classify_image(
        &self,
        input: ClassifyImageInput,
    ) -> impl Future<Output = Result<ClassifyOutput, CoreError>> + Send;
}
