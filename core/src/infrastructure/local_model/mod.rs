#[cfg(feature = "local-inference")]
pub mod onnx;
pub mod unavailable;

#[cfg(feature = "local-inference")]
pub use onnx::OnnxLocalClassifier;
pub use unavailable::UnavailableLocalClassifier;
