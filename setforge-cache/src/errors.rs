use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize cache entry: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("source file no longer exists: {0}")]
    SourceMissing(PathBuf),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
