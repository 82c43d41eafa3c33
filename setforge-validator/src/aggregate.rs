//! Rolls per-category issues into a single `QualityScore`.

use std::collections::HashMap;

use crate::issue::{Category, Issue};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CategoryWeights {
    pub harmonic: f64,
    pub energy: f64,
    pub tempo: f64,
    pub mood: f64,
    pub diversity: f64,
    pub technical: f64,
    pub crowd: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            harmonic: 0.25,
            energy: 0.20,
            tempo: 0.15,
            mood: 0.15,
            diversity: 0.10,
            technical: 0.10,
            crowd: 0.05,
        }
    }
}

impl CategoryWeights {
    fn weight_for(self, category: Category) -> f64 {
        match category {
            Category::HarmonicFlow => self.harmonic,
            Category::EnergyFlow => self.energy,
            Category::TempoFlow => self.tempo,
            Category::MoodProgression => self.mood,
            Category::Diversity => self.diversity,
            Category::TechnicalMixing => self.technical,
            Category::CrowdEngagement => self.crowd,
            // file_existence and audio_quality are reported but not part of
            // the weighted percent score; a missing file is always surfaced
            // as an Error regardless of the aggregate number.
            Category::FileExistence | Category::AudioQuality => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QualityScore {
    pub percent: f64,
    pub category_scores: HashMap<&'static str, f64>,
}

fn category_name(category: Category) -> &'static str {
    match category {
        Category::FileExistence => "file_existence",
        Category::AudioQuality => "audio_quality",
        Category::HarmonicFlow => "harmonic_flow",
        Category::EnergyFlow => "energy_flow",
        Category::TempoFlow => "tempo_flow",
        Category::MoodProgression => "mood_progression",
        Category::Diversity => "diversity",
        Category::TechnicalMixing => "technical_mixing",
        Category::CrowdEngagement => "crowd_engagement",
    }
}

const WEIGHTED_CATEGORIES: [Category; 7] = [
    Category::HarmonicFlow,
    Category::EnergyFlow,
    Category::TempoFlow,
    Category::MoodProgression,
    Category::Diversity,
    Category::TechnicalMixing,
    Category::CrowdEngagement,
];

/// `score = 1 - mean(severity of its issues)`, `1.0` if a category raised no
/// issues.
fn category_score(issues: &[Issue], category: Category) -> f64 {
    let severities: Vec<f64> = issues.iter().filter(|i| i.category == category).map(|i| i.severity).collect();
    if severities.is_empty() {
        return 1.0;
    }
    1.0 - severities.iter().sum::<f64>() / severities.len() as f64
}

#[must_use]
pub fn aggregate(issues: &[Issue], weights: CategoryWeights) -> QualityScore {
    let mut category_scores = HashMap::new();
    let mut weighted_sum = 0.0;

    for category in [
        Category::FileExistence,
        Category::AudioQuality,
        Category::HarmonicFlow,
        Category::EnergyFlow,
        Category::TempoFlow,
        Category::MoodProgression,
        Category::Diversity,
        Category::TechnicalMixing,
        Category::CrowdEngagement,
    ] {
        let score = category_score(issues, category);
        category_scores.insert(category_name(category), score);
        if WEIGHTED_CATEGORIES.contains(&category) {
            weighted_sum += score * weights.weight_for(category);
        }
    }

    QualityScore {
        percent: (weighted_sum * 100.0).clamp(0.0, 100.0),
        category_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;

    #[test]
    fn no_issues_scores_one_hundred() {
        let score = aggregate(&[], CategoryWeights::default());
        assert!((score.percent - 100.0).abs() < 1e-6);
    }

    #[test]
    fn a_single_harmonic_warning_reduces_only_its_weighted_share() {
        let issues = vec![Issue::new(IssueKind::Warning, Category::HarmonicFlow, "bad transition", 0.7, false)];
        let score = aggregate(&issues, CategoryWeights::default());
        // harmonic category score drops to 0.3, weighted by 0.25, the rest stay at 1.0
        let expected = (0.3 * 0.25 + 1.0 * 0.75) * 100.0;
        assert!((score.percent - expected).abs() < 1e-6);
    }
}
