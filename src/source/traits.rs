// PostSource trait — the swap-ready abstraction over post providers.
//
// Implementations answer two kinds of query (keyword search, account
// timeline). The provided `fetch` method runs a whole batch of queries,
// merges the results and decides whether the batch failed as a whole.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::client::FetchError;
use super::post::Post;
use crate::error::RunError;

/// Posts older than this are never returned by `fetch`.
pub const RECENCY_WINDOW_DAYS: i64 = 7;

/// What to fetch in one run.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub keywords: Vec<String>,
    pub accounts: Vec<String>,
    /// Upper bound on posts per keyword / per account
    pub max_results_per_query: usize,
    pub now: DateTime<Utc>,
}

/// A single query that failed. The rest of the batch may still succeed.
#[derive(Debug, Clone)]
pub struct QueryFailure {
    pub query: String,
    pub error: String,
}

/// The merged result of a batch of queries.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub posts: Vec<Post>,
    pub failures: Vec<QueryFailure>,
    /// Posts dropped because they fell outside the recency window
    pub stale: usize,
}

/// Trait for post providers. Async because every provider is an HTTP API.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Short name for logs ("x-api-v2", "rapidapi").
    fn name(&self) -> &'static str;

    /// Most recent posts matching `keyword`, newest first.
    async fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<Post>, FetchError>;

    /// Most recent posts authored by `account` (a handle without the `@`).
    async fn user_posts(&self, account: &str, max_results: usize)
        -> Result<Vec<Post>, FetchError>;

    /// Run every keyword search and account lookup in `request`.
    ///
    /// Results are tagged with the keyword that found them, de-duplicated by
    /// post id (first occurrence wins) and filtered to the recency window.
    /// Individual query failures are collected; only when every query fails
    /// does this return `RunError::SourceFetch`.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, RunError> {
        let total_queries = request.keywords.len() + request.accounts.len();
        let mut outcome = FetchOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();
        let cutoff = request.now - Duration::days(RECENCY_WINDOW_DAYS);

        let progress = ProgressBar::new(total_queries as u64);
        progress.set_style(
            ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut merge = |posts: Vec<Post>, keyword: Option<&str>, outcome: &mut FetchOutcome| {
            for mut post in posts {
                if post.created_at < cutoff {
                    outcome.stale += 1;
                    continue;
                }
                // Records without an id can't collide; let the detector reject them.
                if !post.id.is_empty() && !seen.insert(post.id.clone()) {
                    continue;
                }
                if post.matched_keyword.is_none() {
                    post.matched_keyword = keyword.map(str::to_string);
                }
                outcome.posts.push(post);
            }
        };

        for keyword in &request.keywords {
            progress.set_message(format!("searching \"{keyword}\""));
            match self.search(keyword, request.max_results_per_query).await {
                Ok(posts) => {
                    debug!(keyword = %keyword, count = posts.len(), "Keyword search returned");
                    merge(posts, Some(keyword.as_str()), &mut outcome);
                }
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "Keyword search failed");
                    outcome.failures.push(QueryFailure {
                        query: format!("search \"{keyword}\""),
                        error: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }

        for account in &request.accounts {
            let handle = account.strip_prefix('@').unwrap_or(account);
            progress.set_message(format!("checking @{handle}"));
            match self.user_posts(handle, request.max_results_per_query).await {
                Ok(posts) => {
                    debug!(account = %handle, count = posts.len(), "Account timeline returned");
                    merge(posts, None, &mut outcome);
                }
                Err(e) => {
                    warn!(account = %handle, error = %e, "Account timeline fetch failed");
                    outcome.failures.push(QueryFailure {
                        query: format!("timeline @{handle}"),
                        error: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();

        if total_queries > 0 && outcome.failures.len() == total_queries {
            let detail = outcome
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.query, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RunError::SourceFetch(format!(
                "all {total_queries} queries to {} failed ({detail})",
                self.name()
            )));
        }

        info!(
            source = self.name(),
            posts = outcome.posts.len(),
            failed_queries = outcome.failures.len(),
            stale = outcome.stale,
            "Fetch complete"
        );

        Ok(outcome)
    }
}
