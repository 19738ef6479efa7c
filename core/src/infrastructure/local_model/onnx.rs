use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use image::imageops::{self, FilterType};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::{
    classification::{
        entities::{LocalCandidate, LocalClassification},
        ports::LocalClassifier,
    },
    common::entities::app_errors::CoreError,
};

const RESIZE_SHORTER_SIDE: u32 = 256;
const CROP_SIZE: u32 = 224;
const TOP_K: usize = 3;
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];
const MODEL_NOTE: &str = "MobileNetV2 (ImageNet)";

/// ImageNet classifier backed by an ONNX model file.
///
/// The session is created on first use and shared behind a mutex; inference
/// runs on the blocking pool.
pub struct OnnxLocalClassifier {
    model_path: Option<PathBuf>,
    session: OnceCell<Arc<Mutex<Session>>>,
}

impl OnnxLocalClassifier {
    pub fn new(model_path: Option<PathBuf>) -> Self {
        Self {
            model_path,
            session: OnceCell::new(),
        }
    }

    async fn session(&self) -> Result<Arc<Mutex<Session>>, CoreError> {
        let path = self.model_path.clone().ok_or_else(|| {
            CoreError::LocalModelUnavailable("LOCAL_MODEL_PATH is not set".to_string())
        })?;

        self.session
            .get_or_try_init(|| async move {
                let session = tokio::task::spawn_blocking(move || build_session(&path))
                    .await
                    .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))??;
                Ok::<_, CoreError>(Arc::new(Mutex::new(session)))
            })
            .await
            .cloned()
    }
}

fn build_session(model_path: &Path) -> Result<Session, CoreError> {
    let session = Session::builder()
        .map_err(|e| CoreError::LocalModelUnavailable(format!("failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| CoreError::LocalModelUnavailable(format!("failed to set optimization level: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| CoreError::LocalModelUnavailable(format!("failed to load ONNX model: {}", e)))?;

    info!(path = %model_path.display(), "loaded local ONNX classifier");
    Ok(session)
}

/// Decodes, resizes the shorter side to 256, centre-crops 224 and normalizes
/// into a `1x3x224x224` CHW tensor.
fn preprocess(image_data: &[u8]) -> Result<Vec<f32>, String> {
    let rgb = image::load_from_memory(image_data)
        .map_err(|e| format!("failed to decode image: {}", e))?
        .to_rgb8();

    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err("image has no pixels".to_string());
    }

    let scale = RESIZE_SHORTER_SIDE as f32 / width.min(height) as f32;
    let resized_w = ((width as f32 * scale).round() as u32).max(CROP_SIZE);
    let resized_h = ((height as f32 * scale).round() as u32).max(CROP_SIZE);
    let resized = imageops::resize(&rgb, resized_w, resized_h, FilterType::Triangle);

    let left = (resized_w - CROP_SIZE) / 2;
    let top = (resized_h - CROP_SIZE) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, CROP_SIZE, CROP_SIZE).to_image();

    let plane = (CROP_SIZE * CROP_SIZE) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in cropped.enumerate_pixels() {
        let idx = (y * CROP_SIZE + x) as usize;
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            tensor[channel * plane + idx] = (value - MEAN[channel]) / STD[channel];
        }
    }
    Ok(tensor)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|x| x / sum).collect()
}

fn top_candidates(probabilities: &[f32], k: usize) -> Vec<LocalCandidate> {
    let mut ranked: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(k)
        .map(|(idx, p)| LocalCandidate {
            label: format!("imagenet_class_{}", idx),
            confidence: f64::from(p),
        })
        .collect()
}

fn run_inference(session: &Mutex<Session>, image_data: &[u8]) -> Result<Vec<LocalCandidate>, String> {
    let input = preprocess(image_data)?;
    let shape = [1_usize, 3, CROP_SIZE as usize, CROP_SIZE as usize];
    let tensor = TensorRef::from_array_view((shape, input.as_slice()))
        .map_err(|e| format!("failed to create input tensor: {}", e))?;

    let mut session = session
        .lock()
        .map_err(|_| "local model session is poisoned".to_string())?;
    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| format!("ONNX inference failed: {}", e))?;

    let (_, logits) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| format!("failed to extract logits: {}", e))?;

    Ok(top_candidates(&softmax(logits), TOP_K))
}

impl LocalClassifier for OnnxLocalClassifier {
    async fn classify(&self, image_data: Vec<u8>) -> Result<LocalClassification, CoreError> {
        let session = self.session().await?;

        let outcome = tokio::task::spawn_blocking(move || run_inference(&session, &image_data))
            .await
            .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))?;

        Ok(match outcome {
            Ok(candidates) if !candidates.is_empty() => {
                LocalClassification::from_candidates(candidates, MODEL_NOTE)
            }
            Ok(_) => LocalClassification::failed("model produced no scores"),
            Err(e) => {
                warn!(error = %e, "local classification failed");
                LocalClassification::failed(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_top_candidates_are_ranked() {
        let candidates = top_candidates(&[0.1, 0.5, 0.05, 0.3, 0.05], 3);
        let labels: Vec<&str> = candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["imagenet_class_1", "imagenet_class_3", "imagenet_class_0"]
        );
    }

    #[test]
    fn test_preprocess_shape() {
        let image = image::RgbImage::from_pixel(320, 240, image::Rgb([255, 0, 0]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let tensor = preprocess(png.get_ref()).unwrap();
        assert_eq!(tensor.len(), 3 * 224 * 224);
        assert!((tensor[0] - (1.0 - 0.485) / 0.229).abs() < 1e-4);
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        assert!(preprocess(b"not an image").is_err());
    }

    #[tokio::test]
    async fn test_missing_model_path_is_unavailable() {
        let classifier = OnnxLocalClassifier::new(None);
        let err = classifier.classify(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, CoreError::LocalModelUnavailable(_)));
    }
}
