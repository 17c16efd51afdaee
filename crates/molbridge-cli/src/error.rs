use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Unknown endpoint '{0}'")]
    Endpoint(String),

    #[error("Failed to parse request file '{path}': {source}", path = path.display())]
    RequestParsing {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {0}")]
    Request(#[from] serde_json::Error),

    #[error("Endpoint answered with status 'failed'")]
    Failed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
