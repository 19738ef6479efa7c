pub mod labels;
pub mod llm;
pub mod local_model;
