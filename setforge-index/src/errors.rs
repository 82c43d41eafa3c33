use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("the index has not been built yet")]
    NotBuilt,
    #[error("track not present in the index: {0}")]
    UnknownTrack(String),
    #[error("nearest-neighbor index construction failed: {0}")]
    Build(String),
    #[error("nearest-neighbor query failed: {0}")]
    Query(String),
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;
