use tracing::{info, warn};

use crate::{
    domain::{
        classification::{
            ports::LabelRepository,
            services::validate_api_key,
            similarity::{LabelMatcher, SequenceRatio},
        },
        common::{
            FoodLensConfig,
            entities::app_errors::CoreError,
            services::{ClassifierSettings, Service},
        },
    },
    infrastructure::{labels::JsonFileLabelRepository, llm::OpenAiTransport},
};

#[cfg(feature = "local-inference")]
pub type LocalModel = crate::infrastructure::local_model::OnnxLocalClassifier;

#[cfg(not(feature = "local-inference"))]
pub type LocalModel = crate::infrastructure::local_model::UnavailableLocalClassifier;

pub type FoodLensService = Service<OpenAiTransport, LocalModel, SequenceRatio>;

#[cfg(feature = "local-inference")]
fn local_model(config: &FoodLensConfig) -> LocalModel {
    LocalModel::new(config.local_model.model_path.clone())
}

#[cfg(not(feature = "local-inference"))]
fn local_model(_config: &FoodLensConfig) -> LocalModel {
    LocalModel::default()
}

pub async fn create_service(config: FoodLensConfig) -> Result<FoodLensService, CoreError> {
    let labels = JsonFileLabelRepository::new(&config.labels.path)
        .load_labels()
        .await?;

    if let Err(e) = validate_api_key(config.llm.api_key.as_deref()) {
        warn!("{}; chat modes will fail until it is fixed", e);
    }

    let transport = OpenAiTransport::new(&config.llm)?;
    let matcher = LabelMatcher::new(SequenceRatio, config.classifier.fuzzy_cutoff);
    let settings = ClassifierSettings::new(&config.llm, &config.classifier);

    info!(
        chat_model = %settings.chat_model,
        fallback_model = ?settings.fallback_model,
        labels = labels.len(),
        "classification service ready"
    );

    Ok(Service::new(
        transport,
        local_model(&config),
        matcher,
        labels,
        settings,
    ))
}
