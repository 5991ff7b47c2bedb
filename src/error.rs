use thiserror::Error;

use crate::config::ConfigError;
use crate::loader::LoadError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("No ledger files match pattern {0:?}")]
    NoFiles(String),
    #[error("Amount out of range in {0}")]
    Overflow(String),
    #[error("Output error: {0}")]
    Output(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Output(err.to_string())
    }
}
