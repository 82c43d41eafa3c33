//! Playlist solver (C7): beam search over a track pool toward an energy
//! curve, subject to constraints, scored on curve fit, harmonic flow, energy
//! flow and diversity.

pub mod constraints;
pub mod curve;
pub mod errors;
pub mod memo;

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use setforge_features::{CamelotCode, FeatureRecord, TrackId};
use setforge_index::SimilarityIndex;
use setforge_suggest::transition_camelot;

pub use constraints::Constraints;
pub use curve::Curve;
pub use errors::{SolverError, SolverResult};
pub use memo::TransitionMemo;

const DEFAULT_BEAM_WIDTH: usize = 5;
const DEFAULT_PRUNING_THRESHOLD: f64 = 0.1;
const NEIGHBOR_FANOUT: usize = 15;
const ENERGY_MATCH_FANOUT: usize = 10;
const ENERGY_MATCH_TOLERANCE: f64 = 1.5;
const CHILDREN_PER_PARENT: usize = 5;
const EARLY_STOP_SCORE: f64 = 0.95;
const EARLY_STOP_LENGTH_FRACTION: f64 = 0.8;

/// Weights for the four terms of [`Metrics::score`]. Distinct from a
/// playlist's own curve/constraints: this tunes how the *search* ranks
/// candidate prefixes against each other, not what the playlist contains.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub curve_match: f64,
    pub harmonic: f64,
    pub flow: f64,
    pub diversity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            curve_match: 0.4,
            harmonic: 0.3,
            flow: 0.2,
            diversity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub beam_width: usize,
    pub pruning_enabled: bool,
    pub pruning_threshold: f64,
    pub weights: ScoreWeights,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            beam_width: DEFAULT_BEAM_WIDTH,
            pruning_enabled: true,
            pruning_threshold: DEFAULT_PRUNING_THRESHOLD,
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    pub score: f64,
    pub curve_match: f64,
    pub harmonic: f64,
    pub flow: f64,
    pub diversity: f64,
}

#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub playlist: Vec<TrackId>,
    pub metrics: Metrics,
    pub iterations: usize,
    pub early_stopped: bool,
}

#[derive(Debug, Clone)]
struct BeamState {
    prefix: Vec<TrackId>,
    used: HashSet<TrackId>,
    keys_used: HashSet<CamelotCode>,
    metrics: Metrics,
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

fn compute_metrics(prefix: &[&FeatureRecord], curve: &Curve, n: usize, weights: ScoreWeights) -> Metrics {
    let len = prefix.len();
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };

    let curve_errors: Vec<f64> = prefix
        .iter()
        .enumerate()
        .map(|(i, record)| (record.energy_score - curve.at(i as f64 / denom)).abs())
        .collect();
    let mean_curve_error = curve_errors.iter().sum::<f64>() / len.max(1) as f64;
    let curve_match = (1.0 - mean_curve_error / 5.0).clamp(0.0, 1.0);

    let (harmonic, flow) = if len < 2 {
        (1.0, 1.0)
    } else {
        let mut harmonic_sum = 0.0;
        let mut flow_sum = 0.0;
        for window in prefix.windows(2) {
            harmonic_sum += transition_camelot(window[0], window[1]);
            let delta_energy = (window[1].energy_score - window[0].energy_score).abs();
            flow_sum += (1.0 - delta_energy / 4.0).max(0.0);
        }
        let pairs = (len - 1) as f64;
        (harmonic_sum / pairs, flow_sum / pairs)
    };

    let energies: Vec<f64> = prefix.iter().map(|r| r.energy_score).collect();
    let energy_variance_term = (variance(&energies) / 4.0).clamp(0.0, 1.0);
    let unique_keys: HashSet<CamelotCode> = prefix.iter().map(|r| r.camelot).collect();
    let unique_keys_term = (unique_keys.len() as f64 / len.max(1).min(12) as f64).clamp(0.0, 1.0);
    let diversity = (energy_variance_term + unique_keys_term) / 2.0;

    let score = (weights.curve_match * curve_match
        + weights.harmonic * harmonic
        + weights.flow * flow
        + weights.diversity * diversity)
        .clamp(0.0, 1.0);

    Metrics {
        score,
        curve_match,
        harmonic,
        flow,
        diversity,
    }
}

fn records_for<'a>(
    prefix: &[TrackId],
    records_by_id: &'a HashMap<TrackId, FeatureRecord>,
) -> Vec<&'a FeatureRecord> {
    prefix.iter().filter_map(|id| records_by_id.get(id)).collect()
}

fn candidate_score(
    last: &FeatureRecord,
    candidate: &FeatureRecord,
    target_energy: f64,
    constraints: &Constraints,
    keys_used: &HashSet<CamelotCode>,
    prefix_energies: &[f64],
    memo: &TransitionMemo,
) -> f64 {
    let base = memo.score(last, candidate, target_energy) * constraints.multiplier(candidate);

    let mut with_candidate = prefix_energies.to_vec();
    with_candidate.push(candidate.energy_score);
    let variance_delta = (variance(&with_candidate) - variance(prefix_energies)).max(0.0);
    let key_novelty = f64::from(u8::from(!keys_used.contains(&candidate.camelot)));

    base + 0.5 * variance_delta + 0.3 * key_novelty
}

/// Run the beam search.
///
/// # Errors
/// Returns [`SolverError::EmptyPool`] if `pool` is empty, or
/// [`SolverError::InvalidLength`] if `target_length` is zero.
#[allow(clippy::too_many_arguments)]
pub fn solve(
    pool: &[FeatureRecord],
    target_length: usize,
    curve: &Curve,
    constraints: &Constraints,
    seed: Option<&[TrackId]>,
    config: &SolverConfig,
    index: &SimilarityIndex,
    memo: &TransitionMemo,
) -> SolverResult<SolverOutcome> {
    if pool.is_empty() {
        return Err(SolverError::EmptyPool);
    }
    if target_length == 0 {
        return Err(SolverError::InvalidLength);
    }

    let records_by_id: HashMap<TrackId, FeatureRecord> =
        pool.iter().map(|r| (r.track_id.clone(), r.clone())).collect();

    let mut beam = initial_states(pool, &records_by_id, curve, target_length, seed, config);
    let mut best = beam.iter().max_by(|a, b| a.metrics.score.partial_cmp(&b.metrics.score).unwrap()).cloned();
    let mut iterations = 0;
    let mut early_stopped = false;

    while iterations < target_length.saturating_sub(1) {
        if beam.iter().any(|s| s.prefix.len() >= target_length) {
            break;
        }

        let position = beam[0].prefix.len();
        let target_energy = curve.at(position as f64 / (target_length.saturating_sub(1)).max(1) as f64);

        let expanded: Vec<BeamState> = beam
            .par_iter()
            .flat_map(|parent| expand(parent, pool, &records_by_id, index, constraints, target_energy, curve, target_length, memo, config.weights))
            .collect();

        if expanded.is_empty() {
            break;
        }

        let best_score_in_step = expanded.iter().map(|s| s.metrics.score).fold(f64::MIN, f64::max);
        let mut pruned: Vec<BeamState> = if config.pruning_enabled {
            expanded
                .into_iter()
                .filter(|s| s.metrics.score >= config.pruning_threshold * best_score_in_step)
                .collect()
        } else {
            expanded
        };
        pruned.sort_by(|a, b| b.metrics.score.partial_cmp(&a.metrics.score).unwrap());
        pruned.truncate(config.beam_width);
        beam = pruned;

        for state in &beam {
            if best.as_ref().is_none_or(|b| state.metrics.score > b.metrics.score) {
                best = Some(state.clone());
            }
        }

        iterations += 1;

        if let Some(candidate) = best.as_ref() {
            if candidate.metrics.score >= EARLY_STOP_SCORE
                && candidate.prefix.len() as f64 >= EARLY_STOP_LENGTH_FRACTION * target_length as f64
            {
                early_stopped = true;
                break;
            }
        }
    }

    let winner = best.unwrap_or_else(|| beam.into_iter().next().expect("beam is nonempty"));
    Ok(SolverOutcome {
        playlist: winner.prefix,
        metrics: winner.metrics,
        iterations,
        early_stopped,
    })
}

fn initial_states(
    pool: &[FeatureRecord],
    records_by_id: &HashMap<TrackId, FeatureRecord>,
    curve: &Curve,
    target_length: usize,
    seed: Option<&[TrackId]>,
    config: &SolverConfig,
) -> Vec<BeamState> {
    if let Some(seed_ids) = seed {
        if !seed_ids.is_empty() {
            let prefix: Vec<TrackId> = seed_ids.to_vec();
            let used: HashSet<TrackId> = prefix.iter().cloned().collect();
            let records = records_for(&prefix, records_by_id);
            let keys_used = records.iter().map(|r| r.camelot).collect();
            let metrics = compute_metrics(&records, curve, target_length, config.weights);
            return vec![BeamState {
                prefix,
                used,
                keys_used,
                metrics,
            }];
        }
    }

    let target_energy_at_zero = curve.at(0.0);
    let mut by_fit: Vec<&FeatureRecord> = pool.iter().collect();
    by_fit.sort_by(|a, b| {
        (a.energy_score - target_energy_at_zero)
            .abs()
            .partial_cmp(&(b.energy_score - target_energy_at_zero).abs())
            .unwrap()
    });

    by_fit
        .into_iter()
        .take(config.beam_width)
        .map(|record| {
            let prefix = vec![record.track_id.clone()];
            let used: HashSet<TrackId> = prefix.iter().cloned().collect();
            let keys_used: HashSet<CamelotCode> = [record.camelot].into_iter().collect();
            let metrics = compute_metrics(&[record], curve, target_length, config.weights);
            BeamState {
                prefix,
                used,
                keys_used,
                metrics,
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn expand(
    parent: &BeamState,
    pool: &[FeatureRecord],
    records_by_id: &HashMap<TrackId, FeatureRecord>,
    index: &SimilarityIndex,
    constraints: &Constraints,
    target_energy: f64,
    curve: &Curve,
    target_length: usize,
    memo: &TransitionMemo,
    weights: ScoreWeights,
) -> Vec<BeamState> {
    if parent.prefix.len() >= target_length {
        return vec![parent.clone()];
    }

    let Some(last_id) = parent.prefix.last() else {
        return Vec::new();
    };
    let Some(last) = records_by_id.get(last_id) else {
        return Vec::new();
    };

    let mut candidates: HashSet<TrackId> = HashSet::new();

    if let Ok(neighbors) = index.k_nearest(last, NEIGHBOR_FANOUT, &parent.used) {
        candidates.extend(neighbors.into_iter().map(|(track_id, _distance)| track_id));
    }

    let mut energy_matches: Vec<&FeatureRecord> = pool
        .iter()
        .filter(|r| !parent.used.contains(&r.track_id) && (r.energy_score - target_energy).abs() <= ENERGY_MATCH_TOLERANCE)
        .collect();
    energy_matches.sort_by(|a, b| {
        (a.energy_score - target_energy)
            .abs()
            .partial_cmp(&(b.energy_score - target_energy).abs())
            .unwrap()
    });
    candidates.extend(energy_matches.into_iter().take(ENERGY_MATCH_FANOUT).map(|r| r.track_id.clone()));

    let prefix_energies: Vec<f64> = records_for(&parent.prefix, records_by_id)
        .iter()
        .map(|r| r.energy_score)
        .collect();

    let mut scored: Vec<(f64, &FeatureRecord)> = candidates
        .into_iter()
        .filter_map(|track_id| records_by_id.get(&track_id))
        .map(|candidate| {
            let score = candidate_score(last, candidate, target_energy, constraints, &parent.keys_used, &prefix_energies, memo);
            (score, candidate)
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    scored
        .into_iter()
        .take(CHILDREN_PER_PARENT)
        .map(|(_, candidate)| {
            let mut prefix = parent.prefix.clone();
            prefix.push(candidate.track_id.clone());
            let mut used = parent.used.clone();
            used.insert(candidate.track_id.clone());
            let mut keys_used = parent.keys_used.clone();
            keys_used.insert(candidate.camelot);

            let records = records_for(&prefix, records_by_id);
            let metrics = compute_metrics(&records, curve, target_length, weights);
            BeamState {
                prefix,
                used,
                keys_used,
                metrics,
            }
        })
        .collect()
}
