use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error(transparent)]
    Index(#[from] setforge_index::IndexError),
}

pub type SuggestResult<T> = std::result::Result<T, SuggestError>;
