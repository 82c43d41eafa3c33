//! The `Library` facade: one typed surface over C2-C8, the way
//! `mecomp_core` exposes a typed surface over `mecomp_storage` and
//! `mecomp_analysis`. Carries no algorithmic content of its own — every
//! method is a thin dispatch to the crate that owns that concern.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use setforge_features::{
    extract, EnergyDirection, ExtractorConfig, FeatureRecord, RodioDecoder, RuleMoodClassifier,
    TrackId,
};
use setforge_index::SimilarityIndex;
use setforge_solver::{solve, Constraints, Curve, SolverConfig, SolverOutcome, SolverResult};
use setforge_suggest::{Suggestion, SuggestResult, SuggestionEngine};
use setforge_validator::{apply_fixes, validate, CategoryWeights, Issue, Playlist, QualityScore};

use crate::context::CoreContext;
use crate::errors::CoreError;

/// Audio file extensions C2 is expected to decode, via `rodio`'s own
/// format support.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac"];

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Queries that need the current track population alongside C5/C6: a thin
/// wrapper so `library.suggest().similar(...)` reads the way spec.md's
/// Library API describes it, without `SuggestionEngine` itself needing to
/// know about `Library`'s record/index bookkeeping.
pub struct Suggester<'a, 'ctx> {
    library: &'a Library<'ctx>,
}

impl Suggester<'_, '_> {
    /// # Errors
    /// Propagates [`setforge_index::SimilarityIndex::k_nearest`] failures.
    pub fn similar(
        &self,
        base: &FeatureRecord,
        k: usize,
        exclude: &HashSet<TrackId>,
        min_compat: f64,
    ) -> SuggestResult<Vec<Suggestion>> {
        let index = self.library.index().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let records = self.library.records.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.library
            .ctx
            .suggestions
            .similar(&index, &records, base, k, exclude, min_compat)
    }

    #[must_use]
    pub fn surprise(&self, base: &FeatureRecord, pool: &[FeatureRecord], k: usize) -> Vec<Suggestion> {
        SuggestionEngine::surprise(base, pool, k)
    }

    #[must_use]
    pub fn next_keys(
        &self,
        base: &FeatureRecord,
        direction: EnergyDirection,
    ) -> Vec<(setforge_features::CamelotCode, &'static str, f64)> {
        base.camelot.suggest_next_keys(direction)
    }
}

pub struct Library<'a> {
    ctx: &'a CoreContext,
    decoder: RodioDecoder,
    mood_classifier: RuleMoodClassifier,
    records: RwLock<HashMap<TrackId, FeatureRecord>>,
    index: RwLock<SimilarityIndex>,
    index_dirty: AtomicBool,
}

impl<'a> Library<'a> {
    #[must_use]
    #[inline]
    pub fn new(ctx: &'a CoreContext) -> Self {
        Self {
            ctx,
            decoder: RodioDecoder,
            mood_classifier: RuleMoodClassifier,
            records: RwLock::new(HashMap::new()),
            index: RwLock::new(SimilarityIndex::empty()),
            index_dirty: AtomicBool::new(false),
        }
    }

    /// Analyzes (or reuses the cached analysis for) one file. Every
    /// successful analysis is folded into the in-memory record set and
    /// marks the similarity index stale; call [`Self::index`] to rebuild
    /// it before querying.
    ///
    /// # Errors
    /// Propagates [`setforge_features::ExtractionError`] for
    /// `FileMissing`/`FileTooShort`/`DecodeFailed`, or a [`CoreError::Cache`]
    /// if the cache itself can't be read/written. Stage failures past
    /// decoding degrade to a sentinel record instead of erroring — matching
    /// spec.md's `ExtractionError` surface, with cache I/O folded in since
    /// [`setforge_cache::AnalysisCache::get_or_extract`]'s generic error
    /// bound can't name `ExtractionError` directly without a circular
    /// dependency between `setforge-features` and `setforge-cache`.
    #[inline]
    pub fn analyze_file(&self, path: &Path) -> Result<FeatureRecord, CoreError> {
        let track_id = TrackId::new(path);
        let config = self.extractor_config();
        let decoder = &self.decoder;
        let mood_classifier = &self.mood_classifier;
        let path = path.to_path_buf();

        let record = self.ctx.cache.get_or_extract(&track_id, || {
            extract(&path, decoder, mood_classifier, &config).map_err(CoreError::from)
        })?;

        self.records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(track_id, record.clone());
        self.index_dirty.store(true, Ordering::Release);

        Ok(record)
    }

    /// Walks `dir` for recognized audio files and analyzes each one,
    /// reporting partial progress via `progress_cb(done, total)`. A single
    /// file's failure is collected, not propagated — the batch never
    /// aborts early.
    pub fn analyze_directory(
        &self,
        dir: &Path,
        mut progress_cb: impl FnMut(usize, usize),
    ) -> Vec<Result<FeatureRecord, CoreError>> {
        let paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
            .map(|entry| entry.path().to_path_buf())
            .collect();

        let total = paths.len();
        let results = self.ctx.thread_pool.install(|| {
            use rayon::prelude::*;
            paths
                .par_iter()
                .map(|path| self.analyze_file(path))
                .collect::<Vec<_>>()
        });

        for (done, _) in results.iter().enumerate() {
            progress_cb(done + 1, total);
        }

        results
    }

    #[must_use]
    #[inline]
    pub fn cache(&self) -> &setforge_cache::AnalysisCache {
        &self.ctx.cache
    }

    /// Rebuilds the similarity index from the in-memory record set if any
    /// analysis has happened since the last access, then returns it.
    #[must_use]
    pub fn index(&self) -> &RwLock<SimilarityIndex> {
        if self.index_dirty.swap(false, Ordering::AcqRel) {
            let records: Vec<FeatureRecord> = self
                .records
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .values()
                .cloned()
                .collect();
            *self.index.write().unwrap_or_else(std::sync::PoisonError::into_inner) =
                SimilarityIndex::rebuild(&records);
        }
        &self.index
    }

    #[must_use]
    #[inline]
    pub fn suggest(&self) -> Suggester<'_, 'a> {
        Suggester { library: self }
    }

    /// # Errors
    /// Propagates [`setforge_solver::SolverError`] for an empty pool or a
    /// zero target length.
    #[inline]
    pub fn solve(
        &self,
        pool: &[FeatureRecord],
        curve: &Curve,
        target_length: usize,
        constraints: &Constraints,
        seed: Option<&[TrackId]>,
        config: &SolverConfig,
    ) -> SolverResult<SolverOutcome> {
        let index = self.index().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let config = SolverConfig {
            weights: self.ctx.settings.solver.weights.into(),
            ..*config
        };
        solve(pool, target_length, curve, constraints, seed, &config, &index, &self.ctx.memo)
    }

    #[must_use]
    #[inline]
    pub fn validate(&self, playlist: &Playlist, weights: CategoryWeights) -> (QualityScore, Vec<Issue>) {
        let report = validate(playlist, weights, self.ctx.settings.validator.level);
        (report.score, report.issues)
    }

    /// Applies every safe auto-fix in place and returns the fixed playlist.
    /// `_issues` mirrors the shape spec.md's Library API describes
    /// (`apply_fixes(playlist, issues)`); the fix set is recomputed
    /// internally rather than threaded through from the caller's issue
    /// list, since a fix can only be judged non-regressing against a fresh
    /// aggregation (see [`setforge_validator::autofix::apply_fixes`]).
    #[must_use]
    pub fn apply_fixes(&self, mut playlist: Playlist, _issues: &[Issue], weights: CategoryWeights) -> Playlist {
        apply_fixes(&mut playlist, weights);
        playlist
    }

    fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            max_seconds: self.ctx.settings.decoder.max_seconds,
            timeout: setforge_features::extractor::EXTRACTION_TIMEOUT,
            energy_weights: self.ctx.settings.extractor.weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn context() -> CoreContext {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.cache.dir = temp_dir.path().to_path_buf();
        CoreContext::new(settings).unwrap()
    }

    #[test]
    fn a_fresh_library_has_an_empty_index() {
        let ctx = context();
        let library = Library::new(&ctx);
        assert!(library.index().read().unwrap().is_empty());
    }

    #[test]
    fn analyzing_a_missing_file_reports_an_error_not_a_panic() {
        let ctx = context();
        let library = Library::new(&ctx);
        let result = library.analyze_file(Path::new("/does/not/exist.flac"));
        assert!(result.is_err());
    }
}
