// Alerted-post ledger — ids we've already sent a notification for.
//
// Stored as `{ "<post id>": "<alerted at>" }`. The timestamp lets old
// entries expire once the post can no longer be returned by the source.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::store;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertedLedger {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl AlertedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        store::load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        store::save_json_atomic(path, self)
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.entries.contains_key(post_id)
    }

    /// Mark `post_id` as alerted. Returns false if it was already present
    /// (the original alert time is kept).
    pub fn insert(&mut self, post_id: &str, alerted_at: DateTime<Utc>) -> bool {
        if self.entries.contains_key(post_id) {
            return false;
        }
        self.entries.insert(post_id.to_string(), alerted_at);
        true
    }

    /// Forget entries alerted before `cutoff`. Returns how many were removed.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, at| *at >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DateTime<Utc>)> {
        self.entries.iter()
    }
}
