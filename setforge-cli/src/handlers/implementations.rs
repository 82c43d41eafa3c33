use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use setforge_core::formats;
use setforge_core::library::Library;
use setforge_features::{read_tags, FeatureRecord, TrackId};
use setforge_solver::{Constraints, Curve, SolverConfig};
use setforge_validator::{CategoryWeights, Playlist, PlaylistEntry};

use super::printing;
use super::{CacheCommand, Command, CommandHandler, OutputFormat, SuggestCommand};

fn entry_from_record(path: &Path, record: FeatureRecord) -> PlaylistEntry {
    let metadata = read_tags(path).unwrap_or_default();
    PlaylistEntry::new(path, record, metadata)
}

fn print_playlist(name: &str, library: &Library<'_>, playlist: Playlist, format: OutputFormat) -> anyhow::Result<()> {
    let (quality, issues) = library.validate(&playlist, CategoryWeights::default());
    eprint!("{}", printing::quality(&quality)?);
    eprint!("{}", printing::issues(&issues)?);

    let text = match format {
        OutputFormat::Json => formats::to_json(name, &playlist, &quality, None)?,
        OutputFormat::M3u8 => formats::to_m3u8(&playlist),
        OutputFormat::Rekordbox => formats::to_rekordbox(&playlist),
        OutputFormat::Traktor => formats::to_traktor(&playlist),
        OutputFormat::Serato => formats::to_serato(&playlist),
        OutputFormat::Csv => formats::to_csv(&playlist)?,
    };
    println!("{text}");
    Ok(())
}

/// Re-analyzes (cache-hit, in practice) every file the on-disk cache has
/// ever seen, folding each into `library`'s in-memory record set so
/// `suggest similar` can query the index over the whole cached population
/// rather than just whatever this process has touched so far.
fn warm_library_from_cache(library: &Library<'_>) -> usize {
    let mut warmed = 0;
    for entry in library.cache().list_entries() {
        if library.analyze_file(&entry.file_path).is_ok() {
            warmed += 1;
        }
    }
    warmed
}

#[derive(Debug, Deserialize)]
struct CurvePoint {
    position: f64,
    energy: f64,
}

fn load_curve(path: &Path) -> anyhow::Result<Curve> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading curve file {}", path.display()))?;
    let points: Vec<CurvePoint> = serde_json::from_str(&text).with_context(|| format!("parsing curve file {}", path.display()))?;
    anyhow::ensure!(!points.is_empty(), "curve file {} has no control points", path.display());
    Ok(Curve::new(points.into_iter().map(|p| (p.position, p.energy)).collect()))
}

fn analyze_pool(library: &Library<'_>, dir: &Path) -> Vec<FeatureRecord> {
    library
        .analyze_directory(dir, |done, total| {
            log::debug!("analyzed {done}/{total}");
        })
        .into_iter()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(e) => {
                eprintln!("skipping unanalyzable file: {e}");
                None
            }
        })
        .collect()
}

impl super::CommandHandler for Command {
    type Output = anyhow::Result<()>;

    fn handle(&self, library: &Library<'_>) -> Self::Output {
        match self {
            Self::Analyze { path, format } => {
                let record = library.analyze_file(path).with_context(|| format!("analyzing {}", path.display()))?;
                let playlist = vec![entry_from_record(path, record)];
                print_playlist(&path.display().to_string(), library, playlist, *format)
            }
            Self::AnalyzeDir { dir, format } => {
                let results = library.analyze_directory(dir, |done, total| {
                    log::info!("analyzed {done}/{total}");
                });
                let mut failed = 0usize;
                let playlist: Playlist = results
                    .into_iter()
                    .filter_map(|result| match result {
                        Ok(record) => {
                            let path = record.track_id.as_path().to_path_buf();
                            Some(entry_from_record(&path, record))
                        }
                        Err(e) => {
                            failed += 1;
                            log::warn!("failed to analyze a file: {e}");
                            None
                        }
                    })
                    .collect();
                if failed > 0 {
                    eprintln!("{failed} file(s) failed to analyze");
                }
                print_playlist(&dir.display().to_string(), library, playlist, *format)
            }
            Self::Cache { command } => command.handle(library),
            Self::Suggest { command } => command.handle(library),
            Self::Solve { pool, curve, len, seed, format } => {
                let records = analyze_pool(library, pool);
                anyhow::ensure!(!records.is_empty(), "no analyzable audio files found under {}", pool.display());
                let records_by_id: HashMap<TrackId, FeatureRecord> =
                    records.iter().map(|r| (r.track_id.clone(), r.clone())).collect();

                let curve = load_curve(curve)?;
                let constraints = Constraints::default();
                let config = SolverConfig::default();
                let seed_ids: Vec<TrackId> = seed.iter().map(TrackId::new).collect();
                let seed_arg = if seed_ids.is_empty() { None } else { Some(seed_ids.as_slice()) };

                let outcome = library
                    .solve(&records, &curve, *len, &constraints, seed_arg, &config)
                    .context("solving playlist")?;

                log::info!(
                    "score {:.3} ({} iterations, early_stopped={})",
                    outcome.metrics.score,
                    outcome.iterations,
                    outcome.early_stopped
                );

                let playlist: Playlist = outcome
                    .playlist
                    .into_iter()
                    .filter_map(|id| {
                        let record = records_by_id.get(&id)?.clone();
                        Some(entry_from_record(id.as_path(), record))
                    })
                    .collect();
                print_playlist("solved", library, playlist, *format)
            }
            Self::Validate { playlist, fix, format } => {
                let text = std::fs::read_to_string(playlist).with_context(|| format!("reading {}", playlist.display()))?;
                let mut entries: Playlist =
                    serde_json::from_str(&text).with_context(|| format!("parsing {} as a playlist", playlist.display()))?;

                if *fix {
                    let (_, issues) = library.validate(&entries, CategoryWeights::default());
                    entries = library.apply_fixes(entries, &issues, CategoryWeights::default());
                }

                print_playlist(&playlist.display().to_string(), library, entries, *format)
            }
        }
    }
}

impl super::CommandHandler for CacheCommand {
    type Output = anyhow::Result<()>;

    fn handle(&self, library: &Library<'_>) -> Self::Output {
        match self {
            Self::Stats => {
                let stats = library.cache().stats();
                print!("{}", printing::cache_stats(&stats)?);
                Ok(())
            }
            Self::Optimize => library.cache().optimize().context("optimizing cache"),
            Self::Evict { max_age_days, max_size_mb } => library
                .cache()
                .evict(max_age_days.unwrap_or(90), max_size_mb.unwrap_or(500) * 1_000_000)
                .context("evicting cache entries"),
            Self::Clear => library.cache().clear().context("clearing cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use setforge_core::config::Settings;
    use setforge_core::context::CoreContext;
    use setforge_features::TrackId;

    fn library(ctx: &CoreContext) -> Library<'_> {
        Library::new(ctx)
    }

    fn context() -> CoreContext {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.cache.dir = temp_dir.path().to_path_buf();
        CoreContext::new(settings).unwrap()
    }

    #[test]
    fn load_curve_parses_control_points_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        std::fs::write(&path, r#"[{"position": 0.0, "energy": 4.0}, {"position": 1.0, "energy": 8.0}]"#).unwrap();

        let curve = load_curve(&path).unwrap();
        assert!((curve.at(0.0) - 4.0).abs() < 1e-9);
        assert!((curve.at(1.0) - 8.0).abs() < 1e-9);
        assert!((curve.at(0.5) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn load_curve_rejects_an_empty_control_point_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");
        std::fs::write(&path, "[]").unwrap();

        assert!(load_curve(&path).is_err());
    }

    #[test]
    fn load_curve_reports_a_missing_file() {
        let result = load_curve(Path::new("/does/not/exist/curve.json"));
        assert!(result.is_err());
    }

    #[test]
    fn entry_from_record_falls_back_to_default_metadata_for_an_unreadable_path() {
        let track_id = TrackId::new("missing.flac");
        let record = FeatureRecord::sentinel(track_id, 180.0, 0, 0);
        let entry = entry_from_record(Path::new("missing.flac"), record);
        assert_eq!(entry.metadata, setforge_features::TrackMetadata::default());
    }

    #[test]
    fn warm_library_from_cache_is_a_noop_against_an_empty_cache() {
        let ctx = context();
        let library = library(&ctx);
        assert_eq!(warm_library_from_cache(&library), 0);
    }

    #[test]
    fn cache_stats_reports_an_empty_cache() {
        let ctx = context();
        let library = library(&ctx);
        let result = CacheCommand::Stats.handle(&library);
        assert!(result.is_ok());
    }

    #[test]
    fn analyzing_a_missing_file_is_reported_as_an_error_not_a_panic() {
        let ctx = context();
        let library = library(&ctx);
        let result = Command::Analyze {
            path: PathBuf::from("/does/not/exist.flac"),
            format: OutputFormat::Json,
        }
        .handle(&library);
        assert!(result.is_err());
    }
}

impl super::CommandHandler for SuggestCommand {
    type Output = anyhow::Result<()>;

    fn handle(&self, library: &Library<'_>) -> Self::Output {
        match self {
            Self::Similar { path, k, min_compat } => {
                let base = library.analyze_file(path).with_context(|| format!("analyzing {}", path.display()))?;
                let warmed = warm_library_from_cache(library);
                log::info!("warmed {warmed} tracks from cache before querying the index");

                let suggestions = library
                    .suggest()
                    .similar(&base, *k, &HashSet::new(), *min_compat)
                    .context("querying the similarity index")?;
                print!("{}", printing::suggestions("Similar tracks", &suggestions)?);
                Ok(())
            }
            Self::Surprise { path, pool, k } => {
                let base = library.analyze_file(path).with_context(|| format!("analyzing {}", path.display()))?;
                let pool_records = analyze_pool(library, pool);
                let suggestions = library.suggest().surprise(&base, &pool_records, *k);
                print!("{}", printing::suggestions("Surprise picks", &suggestions)?);
                Ok(())
            }
        }
    }
}
