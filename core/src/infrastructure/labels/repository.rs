use std::{io::ErrorKind, path::PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{
    classification::{ports::LabelRepository, value_objects::AllowedLabels},
    common::entities::app_errors::CoreError,
};

/// Reads the allow-list from a JSON array of strings.
///
/// A missing or malformed file yields an empty list, which disables label
/// constraints rather than failing start-up.
#[derive(Debug, Clone)]
pub struct JsonFileLabelRepository {
    path: PathBuf,
}

impl JsonFileLabelRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, content: &str) -> AllowedLabels {
        let entries = match serde_json::from_str::<Value>(content) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(path = %self.path.display(), "label file is not a JSON array, ignoring it");
                return AllowedLabels::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "label file is not valid JSON, ignoring it");
                return AllowedLabels::default();
            }
        };

        let labels = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        AllowedLabels::new(labels)
    }
}

impl LabelRepository for JsonFileLabelRepository {
    async fn load_labels(&self) -> Result<AllowedLabels, CoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "label file not found, labels are unconstrained");
                return Ok(AllowedLabels::default());
            }
            Err(e) => {
                return Err(CoreError::Setup(format!(
                    "failed to read label file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let labels = self.parse(&content);
        info!(path = %self.path.display(), count = labels.len(), "loaded allowed labels");
        Ok(labels)
    }
}
