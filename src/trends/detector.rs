// Trend detector: classify fetched posts against the previous snapshot.
//
// For each post:
//   total       = likes + reposts + replies + quotes
//   growth rate = (total - previous total) / max(hours since previous, 1 min)
// A post is RapidGrowth when the rate reaches the per-hour threshold and
// AbsoluteThreshold when the total reaches the absolute threshold. Posts
// already in the ledger are never alerted on again, but their history entry
// is still refreshed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::alert::{AlertEvent, AlertKind};
use crate::source::post::Post;
use crate::state::{AlertedLedger, EngagementHistory, EngagementSnapshot};

/// Floor for the elapsed time between observations (one minute), so
/// back-to-back runs can't divide by ~zero.
pub const MIN_ELAPSED_HOURS: f64 = 1.0 / 60.0;

/// The two alert conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Engagement gained per hour that counts as rapid growth
    pub rapid_growth_per_hour: f64,
    /// Total engagement that triggers an alert on its own
    pub absolute_total: u64,
}

/// A fetched record that can't be classified. Skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("post by @{author} has no identifier")]
    MissingId { author: String },

    #[error("post {post_id} has a negative {field} count ({value})")]
    NegativeCount {
        post_id: String,
        field: &'static str,
        value: i64,
    },
}

/// Result of one detection pass.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Alerts to send, in input order (RapidGrowth before AbsoluteThreshold
    /// for the same post)
    pub events: Vec<AlertEvent>,
    /// History with every processed post's snapshot replaced by `now`'s
    pub history: EngagementHistory,
    pub skipped: Vec<MalformedRecord>,
    /// Posts that were classified (valid, first occurrence in the batch)
    pub processed: usize,
    /// Alerts withheld because the post was already in the ledger
    pub suppressed: usize,
}

/// Check that a post has an id and non-negative counts.
pub fn validate(post: &Post) -> Result<(), MalformedRecord> {
    if post.id.trim().is_empty() {
        return Err(MalformedRecord::MissingId {
            author: post.author.clone(),
        });
    }

    let counts = [
        ("likes", post.likes),
        ("reposts", post.reposts),
        ("replies", post.replies),
        ("quotes", post.quotes),
    ];
    if let Some(&(field, value)) = counts.iter().find(|(_, v)| *v < 0) {
        return Err(MalformedRecord::NegativeCount {
            post_id: post.id.clone(),
            field,
            value,
        });
    }

    Ok(())
}

/// Engagement gained per hour since `previous`.
///
/// A total lower than before (deleted likes, API inconsistency) counts as
/// zero growth, never negative.
pub fn growth_rate(previous: &EngagementSnapshot, total: u64, now: DateTime<Utc>) -> f64 {
    if total < previous.total {
        return 0.0;
    }
    let elapsed_hours =
        ((now - previous.observed_at).num_milliseconds() as f64 / 3_600_000.0).max(MIN_ELAPSED_HOURS);
    (total - previous.total) as f64 / elapsed_hours
}

/// Which alert kinds apply. RapidGrowth comes first when both do.
pub fn classify(total: u64, growth: Option<f64>, thresholds: &Thresholds) -> Vec<AlertKind> {
    let mut kinds = Vec::with_capacity(2);
    if growth.is_some_and(|rate| rate >= thresholds.rapid_growth_per_hour) {
        kinds.push(AlertKind::RapidGrowth);
    }
    if total >= thresholds.absolute_total {
        kinds.push(AlertKind::AbsoluteThreshold);
    }
    kinds
}

/// Classify `posts` and return the alerts plus the updated history.
///
/// Malformed posts are skipped and reported in `Detection::skipped`. A post
/// id seen twice in the same batch is only processed the first time.
pub fn detect(
    posts: &[Post],
    mut history: EngagementHistory,
    ledger: &AlertedLedger,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Detection {
    let mut events = Vec::new();
    let mut skipped = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut processed = 0;
    let mut suppressed = 0;

    for post in posts {
        if let Err(reason) = validate(post) {
            warn!(error = %reason, "Skipping malformed post");
            skipped.push(reason);
            continue;
        }
        if !seen.insert(post.id.as_str()) {
            debug!(post_id = %post.id, "Duplicate post in batch, ignoring");
            continue;
        }
        processed += 1;

        let total = post.total_engagement();
        let previous = history.get(&post.id).copied();
        let growth = previous.map(|prev| growth_rate(&prev, total, now));

        history.record(&post.id, total, now);

        let kinds = classify(total, growth, thresholds);
        if kinds.is_empty() {
            continue;
        }

        if ledger.contains(&post.id) {
            debug!(post_id = %post.id, "Already alerted, suppressing");
            suppressed += kinds.len();
            continue;
        }

        for kind in kinds {
            let metric = match kind {
                AlertKind::RapidGrowth => growth.unwrap_or(0.0),
                AlertKind::AbsoluteThreshold => total as f64,
            };
            debug!(
                post_id = %post.id,
                kind = %kind,
                metric = metric,
                total = total,
                "Post qualifies"
            );
            events.push(AlertEvent {
                post_id: post.id.clone(),
                kind,
                metric,
                current_total: total,
                previous_total: previous.map(|p| p.total),
                detected_at: now,
                post: post.clone(),
            });
        }
    }

    Detection {
        events,
        history,
        skipped,
        processed,
        suppressed,
    }
}
