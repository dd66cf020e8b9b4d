use indicatif::style::TemplateError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Fatal at construction time, never recovered.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("history persistence failed: {0}")]
    Persistence(String),

    #[error("history file error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed configuration file: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("progress bar template: {0}")]
    Progress(#[from] TemplateError),
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
