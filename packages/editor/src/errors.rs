//! Error types for the style engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Step error: {0}")]
    Step(#[from] stylecascade_document::StepError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
