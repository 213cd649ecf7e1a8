// The Post type shared by every source backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as fetched from the source, with its current engagement counts.
///
/// Counts are signed so that a broken upstream record (negative values) can
/// be recognized and skipped by the detector instead of wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub reposts: i64,
    pub replies: i64,
    pub quotes: i64,
    pub url: String,
    /// The search keyword that surfaced this post (None for account timelines)
    #[serde(default)]
    pub matched_keyword: Option<String>,
}

impl Post {
    /// Sum of likes, reposts, replies and quotes.
    ///
    /// Only meaningful for posts whose counts are all non-negative; the
    /// detector checks that before calling this. Saturates at `u64::MAX`.
    pub fn total_engagement(&self) -> u64 {
        [self.likes, self.reposts, self.replies, self.quotes]
            .iter()
            .fold(0u64, |total, &c| total.saturating_add(c.max(0) as u64))
    }
}

/// Build the public permalink for a post.
pub fn permalink(author: &str, id: &str) -> String {
    format!("https://x.com/{author}/status/{id}")
}
