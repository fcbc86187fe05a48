use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlowGraphError>;

#[derive(Debug, Error)]
pub enum FlowGraphError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} is not a session or flow export: {reason}")]
    UnrecognizedExport { path: PathBuf, reason: String },

    #[error("not a session or flow export: {0}")]
    UnrecognizedShape(String),

    #[error("invalid layout config: {0}")]
    InvalidConfig(String),
}
