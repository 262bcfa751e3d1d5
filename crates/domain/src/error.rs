use std::path::PathBuf;

use thiserror::Error;

/// Failures building tempo, tuning or settings values.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid value: {0}")]
    Validation(String),
    #[error("malformed settings: {0}")]
    Serialization(String),
    #[error("settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DomainError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
