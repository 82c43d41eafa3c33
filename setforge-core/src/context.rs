//! Wires the workspace's independent crates (C2-C7) into one shared handle:
//! a rayon thread pool sized off configuration, the on-disk analysis cache,
//! and the suggestion engine's and solver's internal memoization state.
//! [`crate::library::Library`] is the thing callers actually drive; this is
//! just what it's built from.

use std::num::NonZeroUsize;

use setforge_cache::AnalysisCache;
use setforge_solver::TransitionMemo;
use setforge_suggest::SuggestionEngine;

use crate::config::Settings;
use crate::errors::CoreError;

/// Folds the decoder-affecting settings into the cache key prefix so that
/// changing `decoder.sample_rate` or `decoder.max_seconds` invalidates
/// every existing cache entry rather than silently reusing stale features.
fn decoder_profile_id(settings: &Settings) -> String {
    format!(
        "sr{}-max{}",
        settings.decoder.sample_rate, settings.decoder.max_seconds as u64
    )
}

pub struct CoreContext {
    pub settings: Settings,
    pub thread_pool: rayon::ThreadPool,
    pub cache: AnalysisCache,
    pub suggestions: SuggestionEngine,
    pub memo: TransitionMemo,
}

impl CoreContext {
    /// Opens the on-disk cache at `settings.cache.dir` (creating it if
    /// missing) and builds a rayon pool capped at `solver.max_workers`
    /// (falling back to the number of logical CPUs).
    ///
    /// # Errors
    /// Returns an error if the cache directory cannot be created or the
    /// thread pool cannot be built.
    #[inline]
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let profile_id = decoder_profile_id(&settings);
        let cache = AnalysisCache::open(&settings.cache.dir, profile_id)?;

        let workers = settings
            .solver
            .max_workers
            .map(NonZeroUsize::get)
            .unwrap_or(0);
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| CoreError::ThreadPool(e.to_string()))?;

        Ok(Self {
            settings,
            thread_pool,
            cache,
            suggestions: SuggestionEngine::new(),
            memo: TransitionMemo::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_against_a_temp_cache_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.cache.dir = temp_dir.path().to_path_buf();

        let ctx = CoreContext::new(settings).unwrap();
        assert_eq!(ctx.cache.stats().total_files, 0);
    }
}
