// Engagement history — the last observed engagement total per post.
//
// The detector compares each fetched post against this to compute an
// hourly growth rate, then overwrites the entry with the new observation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store;

/// Engagement total for one post at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    pub total: u64,
    pub observed_at: DateTime<Utc>,
}

/// Post id → latest snapshot. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngagementHistory {
    entries: BTreeMap<String, EngagementSnapshot>,
}

impl EngagementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`; an absent file is an empty history.
    pub fn load(path: &Path) -> Result<Self> {
        store::load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::save_json_atomic(path, self)
    }

    pub fn get(&self, post_id: &str) -> Option<&EngagementSnapshot> {
        self.entries.get(post_id)
    }

    /// Replace the snapshot for `post_id` with a new observation.
    pub fn record(&mut self, post_id: &str, total: u64, observed_at: DateTime<Utc>) {
        self.entries
            .insert(post_id.to_string(), EngagementSnapshot { total, observed_at });
    }

    /// Drop snapshots last observed before `cutoff`. Returns how many were removed.
    ///
    /// Posts that stop showing up in results (aged out of search, deleted)
    /// would otherwise accumulate forever.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, snap| snap.observed_at >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EngagementSnapshot)> {
        self.entries.iter()
    }

    /// Most recent observation time across all entries.
    pub fn last_observed(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|s| s.observed_at).max()
    }
}
