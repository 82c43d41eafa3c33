//! The issue model every category check reports through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    Error,
    Warning,
    Info,
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    FileExistence,
    AudioQuality,
    HarmonicFlow,
    EnergyFlow,
    TempoFlow,
    MoodProgression,
    Diversity,
    TechnicalMixing,
    CrowdEngagement,
}

impl Category {
    #[must_use]
    #[inline]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::HarmonicFlow => 0.25,
            Self::EnergyFlow => 0.20,
            Self::TempoFlow => 0.15,
            Self::MoodProgression => 0.15,
            Self::Diversity => 0.10,
            Self::TechnicalMixing => 0.10,
            Self::CrowdEngagement => 0.05,
            Self::FileExistence | Self::AudioQuality => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub category: Category,
    pub message: String,
    /// Index of the later track in the offending pair/position, where
    /// applicable.
    pub track_index: Option<usize>,
    pub severity: f64,
    pub auto_fixable: bool,
}

impl Issue {
    #[must_use]
    #[inline]
    pub fn new(kind: IssueKind, category: Category, message: impl Into<String>, severity: f64, auto_fixable: bool) -> Self {
        Self {
            kind,
            category,
            message: message.into(),
            track_index: None,
            severity: severity.clamp(0.0, 1.0),
            auto_fixable,
        }
    }

    #[must_use]
    #[inline]
    pub fn at(mut self, track_index: usize) -> Self {
        self.track_index = Some(track_index);
        self
    }
}
