use thiserror::Error;

/// Aggregates the error types of every crate the `Library` facade wires
/// together, plus the ambient concerns (`config`, directory resolution)
/// that only exist at this layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    InvalidWeights(String),
    #[error("could not build thread pool: {0}")]
    ThreadPool(String),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Extraction(#[from] setforge_features::ExtractionError),
    #[error(transparent)]
    Cache(#[from] setforge_cache::CacheError),
    #[error(transparent)]
    Index(#[from] setforge_index::IndexError),
    #[error(transparent)]
    Suggest(#[from] setforge_suggest::SuggestError),
    #[error(transparent)]
    Solver(#[from] setforge_solver::SolverError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("could not determine the data directory for this platform")]
    Data,
    #[error("could not determine the config directory for this platform")]
    Config,
}
