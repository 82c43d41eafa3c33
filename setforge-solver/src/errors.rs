use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("the candidate pool is empty")]
    EmptyPool,
    #[error("target length must be at least 1")]
    InvalidLength,
    #[error(transparent)]
    Index(#[from] setforge_index::IndexError),
    #[error("the solve was cancelled")]
    Cancelled,
}

pub type SolverResult<T> = std::result::Result<T, SolverError>;
