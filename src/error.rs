use thiserror::Error;

/// Error type for registry pull operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Json error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
