// Alert events produced by the detector and consumed by the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::post::Post;

/// Why a post was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Engagement is rising at or above the configured per-hour rate
    RapidGrowth,
    /// Total engagement is at or above the configured absolute threshold
    AbsoluteThreshold,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RapidGrowth => "rapid_growth",
            AlertKind::AbsoluteThreshold => "absolute_threshold",
        }
    }

    /// Human-readable label for emails and terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::RapidGrowth => "Rapid Growth",
            AlertKind::AbsoluteThreshold => "Threshold Reached",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One qualifying condition for one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub post_id: String,
    pub kind: AlertKind,
    /// Growth rate (engagement/hour) for RapidGrowth, total engagement for
    /// AbsoluteThreshold
    pub metric: f64,
    pub current_total: u64,
    /// Total at the previous observation, when there was one
    pub previous_total: Option<u64>,
    pub detected_at: DateTime<Utc>,
    pub post: Post,
}

impl AlertEvent {
    /// Growth rate if this is a RapidGrowth event.
    pub fn growth_rate(&self) -> Option<f64> {
        match self.kind {
            AlertKind::RapidGrowth => Some(self.metric),
            AlertKind::AbsoluteThreshold => None,
        }
    }
}
