use std::path::PathBuf;

use thiserror::Error;

use crate::types::Kind;

pub type Result<T> = std::result::Result<T, LakesideError>;

#[derive(Error, Debug)]
pub enum LakesideError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Duplicate {kind} id '{id}' in {path}")]
    DuplicateId {
        kind: Kind,
        id: String,
        path: PathBuf,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preferences error: {0}")]
    Preferences(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
