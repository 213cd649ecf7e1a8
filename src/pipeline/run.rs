// One polling run, start to finish.
//
// 1. Load engagement history and the alerted-post ledger
// 2. Fetch posts for every keyword and followed account
// 3. Run the trend detector
// 4. Send one notification per alert event; ledger fully delivered posts
// 5. Prune and persist both state files
//
// A source failure aborts before anything is written. Notification failures
// are collected in the summary and never stop the run.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::MonitorSettings;
use crate::error::RunError;
use crate::notify::Notifier;
use crate::source::traits::{FetchRequest, PostSource, QueryFailure};
use crate::state::{AlertedLedger, EngagementHistory};
use crate::trends::{detect, AlertEvent, AlertKind, MalformedRecord};

/// Where the state documents live.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub history: PathBuf,
    pub ledger: PathBuf,
}

/// Whether this run may send email and write state.
#[derive(Clone, Copy)]
pub enum RunMode<'a> {
    Live(&'a dyn Notifier),
    /// Detect and report only. Nothing is sent, nothing is persisted.
    DryRun,
}

/// A notification that couldn't be delivered.
#[derive(Debug, Clone)]
pub struct NotifyFailure {
    pub post_id: String,
    pub kind: AlertKind,
    pub error: String,
}

/// Everything an operator needs to know about one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub processed: usize,
    pub skipped: Vec<MalformedRecord>,
    pub failed_queries: Vec<QueryFailure>,
    pub alerts: Vec<AlertEvent>,
    pub sent: usize,
    pub failed: Vec<NotifyFailure>,
    pub suppressed: usize,
    pub history_pruned: usize,
    pub ledger_pruned: usize,
    pub dry_run: bool,
}

impl RunSummary {
    /// True when something went wrong that didn't abort the run.
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.failed_queries.is_empty() || !self.failed.is_empty()
    }
}

/// Outcome of sending a batch of events.
#[derive(Debug, Default)]
pub struct Delivery {
    pub sent: usize,
    pub failures: Vec<NotifyFailure>,
}

/// Send every event in order. A post is added to the ledger only when every
/// one of its events in this batch was delivered, so a post with one failed
/// kind is retried in full on the next run. A failed send is recorded and
/// the batch continues.
pub async fn deliver(
    notifier: &dyn Notifier,
    events: &[AlertEvent],
    ledger: &mut AlertedLedger,
    now: DateTime<Utc>,
) -> Delivery {
    let mut delivery = Delivery::default();
    let mut delivered: Vec<&str> = Vec::new();
    let mut failed: HashSet<&str> = HashSet::new();

    for event in events {
        match notifier.send(event).await {
            Ok(()) => {
                delivered.push(&event.post_id);
                delivery.sent += 1;
            }
            Err(e) => {
                warn!(
                    post_id = %event.post_id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to send alert"
                );
                failed.insert(&event.post_id);
                delivery.failures.push(NotifyFailure {
                    post_id: event.post_id.clone(),
                    kind: event.kind,
                    error: e.to_string(),
                });
            }
        }
    }

    for post_id in delivered {
        if !failed.contains(post_id) {
            ledger.insert(post_id, now);
        }
    }

    delivery
}

/// Execute one polling run.
pub async fn run(
    source: &dyn PostSource,
    mode: RunMode<'_>,
    settings: &MonitorSettings,
    paths: &StatePaths,
    now: DateTime<Utc>,
) -> Result<RunSummary, RunError> {
    let history = EngagementHistory::load(&paths.history).map_err(|source| {
        RunError::StateLoad {
            what: "engagement history",
            source,
        }
    })?;
    let mut ledger = AlertedLedger::load(&paths.ledger).map_err(|source| RunError::StateLoad {
        what: "alerted-post ledger",
        source,
    })?;

    let ledger_pruned =
        ledger.prune_older_than(now - Duration::days(i64::from(settings.ledger_retention_days)));

    info!(
        history = history.len(),
        ledger = ledger.len(),
        "Loaded state"
    );

    let request = FetchRequest {
        keywords: settings.keywords.clone(),
        accounts: settings.followed_accounts.clone(),
        max_results_per_query: settings.max_results_per_query,
        now,
    };
    // On failure nothing has been written yet.
    let fetched = source.fetch(&request).await?;

    let detection = detect(
        &fetched.posts,
        history,
        &ledger,
        &settings.thresholds(),
        now,
    );
    let mut history = detection.history;

    info!(
        processed = detection.processed,
        alerts = detection.events.len(),
        suppressed = detection.suppressed,
        skipped = detection.skipped.len(),
        "Detection complete"
    );

    let mut summary = RunSummary {
        fetched: fetched.posts.len(),
        processed: detection.processed,
        skipped: detection.skipped,
        failed_queries: fetched.failures,
        suppressed: detection.suppressed,
        ledger_pruned,
        ..RunSummary::default()
    };

    let notifier = match mode {
        RunMode::Live(notifier) => notifier,
        RunMode::DryRun => {
            summary.alerts = detection.events;
            summary.dry_run = true;
            return Ok(summary);
        }
    };

    let delivery = deliver(notifier, &detection.events, &mut ledger, now).await;
    summary.sent = delivery.sent;
    summary.failed = delivery.failures;
    summary.alerts = detection.events;

    summary.history_pruned = history
        .prune_older_than(now - Duration::hours(i64::from(settings.history_retention_hours)));

    history
        .save(&paths.history)
        .map_err(|source| RunError::Persistence {
            what: "engagement history",
            source,
        })?;
    ledger
        .save(&paths.ledger)
        .map_err(|source| RunError::Persistence {
            what: "alerted-post ledger",
            source,
        })?;

    info!(
        fetched = summary.fetched,
        alerts = summary.alerts.len(),
        sent = summary.sent,
        failed = summary.failed.len(),
        "Run complete"
    );

    Ok(summary)
}
