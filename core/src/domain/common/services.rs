use std::sync::Arc;

use crate::domain::{
    classification::{
        ports::{ChatTransport, LocalClassifier},
        similarity::{LabelMatcher, SimilarityScorer},
        value_objects::{AllowedLabels, ApiCapabilities, OutputLanguage},
    },
    common::{ClassifierConfig, LLMConfig},
};

/// Read-only settings shared by every request.
#[derive(Clone, Debug)]
pub struct ClassifierSettings {
    pub api_key: Option<String>,
    pub chat_model: String,
    pub fallback_model: Option<String>,
    pub capabilities: ApiCapabilities,
    pub output_language: OutputLanguage,
}

impl ClassifierSettings {
    pub fn new(llm: &LLMConfig, classifier: &ClassifierConfig) -> Self {
        Self {
            api_key: llm.api_key.clone(),
            chat_model: llm.chat_model.clone(),
            fallback_model: llm.fallback_model.clone(),
            capabilities: llm.capabilities,
            output_language: classifier.output_language,
        }
    }
}

pub struct Service<T, L, S>
where
    T: ChatTransport,
    L: LocalClassifier,
    S: SimilarityScorer,
{
    pub(crate) transport: Arc<T>,
    pub(crate) local_classifier: Arc<L>,
    pub(crate) matcher: Arc<LabelMatcher<S>>,
    pub(crate) labels: Arc<AllowedLabels>,
    pub(crate) settings: Arc<ClassifierSettings>,
}

impl<T, L, S> Clone for Service<T, L, S>
where
    T: ChatTransport,
    L: LocalClassifier,
    S: SimilarityScorer,
{
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            local_classifier: Arc::clone(&self.local_classifier),
            matcher: Arc::clone(&self.matcher),
            labels: Arc::clone(&self.labels),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<T, L, S> Service<T, L, S>
where
    T: ChatTransport,
    L: LocalClassifier,
    S: SimilarityScorer,
{
    pub fn new(
        transport: T,
        local_classifier: L,
        matcher: LabelMatcher<S>,
        labels: AllowedLabels,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            local_classifier: Arc::new(local_classifier),
            matcher: Arc::new(matcher),
            labels: Arc::new(labels),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }
}
