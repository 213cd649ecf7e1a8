// Unit tests for the trend detector.
//
// The detector is a pure function of (posts, history, ledger, thresholds,
// now), so every case builds its inputs in memory and checks the returned
// events and history. No network or filesystem access.

use chrono::{DateTime, Duration, TimeZone, Utc};

use trendwatch::source::post::{permalink, Post};
use trendwatch::state::{AlertedLedger, EngagementHistory};
use trendwatch::trends::{detect, AlertKind, MalformedRecord, Thresholds};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn thresholds(rapid: f64, absolute: u64) -> Thresholds {
    Thresholds {
        rapid_growth_per_hour: rapid,
        absolute_total: absolute,
    }
}

/// A post whose whole engagement is in `likes`.
fn post(id: &str, likes: i64) -> Post {
    Post {
        id: id.to_string(),
        author: "analyst".to_string(),
        text: format!("post {id} about LLM benchmarks"),
        created_at: t0() - Duration::hours(3),
        likes,
        reposts: 0,
        replies: 0,
        quotes: 0,
        url: permalink("analyst", id),
        matched_keyword: Some("LLM".to_string()),
    }
}

fn history_with(entries: &[(&str, u64, DateTime<Utc>)]) -> EngagementHistory {
    let mut history = EngagementHistory::new();
    for (id, total, at) in entries {
        history.record(id, *total, *at);
    }
    history
}

// ============================================================
// First sighting
// ============================================================

#[test]
fn first_sighting_never_reports_rapid_growth() {
    let posts = vec![post("1", 999_999)];
    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1.0, u64::MAX),
        t0(),
    );

    assert!(
        result.events.is_empty(),
        "No snapshot means no growth rate, got {:?}",
        result.events
    );
    assert_eq!(result.processed, 1);
}

#[test]
fn first_sighting_can_reach_absolute_threshold() {
    let posts = vec![post("P", 5200)];
    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].kind, AlertKind::AbsoluteThreshold);
    assert_eq!(result.events[0].metric, 5200.0);
    assert_eq!(result.events[0].previous_total, None);
    assert_eq!(result.history.get("P").map(|s| s.total), Some(5200));
}

#[test]
fn first_sighting_records_snapshot() {
    let posts = vec![post("1", 42)];
    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    let snap = result.history.get("1").expect("snapshot recorded");
    assert_eq!(snap.total, 42);
    assert_eq!(snap.observed_at, t0());
}

// ============================================================
// Growth rate
// ============================================================

#[test]
fn growth_exactly_at_threshold_alerts() {
    // 1000 -> 3000 over two hours is exactly 1000/hour
    let now = t0();
    let history = history_with(&[("1", 1000, now - Duration::hours(2))]);
    let posts = vec![post("1", 3000)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        now,
    );

    assert_eq!(result.events.len(), 1);
    let event = &result.events[0];
    assert_eq!(event.kind, AlertKind::RapidGrowth);
    assert!((event.metric - 1000.0).abs() < 1e-9);
    assert_eq!(event.previous_total, Some(1000));
    assert_eq!(event.current_total, 3000);
}

#[test]
fn growth_just_below_threshold_does_not_alert() {
    let now = t0();
    let history = history_with(&[("1", 1000, now - Duration::hours(2))]);
    let posts = vec![post("1", 2999)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        now,
    );

    assert!(result.events.is_empty());
}

#[test]
fn growth_rate_over_one_hour() {
    let now = t0();
    let history = history_with(&[("1", 1000, now - Duration::hours(1))]);
    let posts = vec![post("1", 3500)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        now,
    );

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.events[0].kind, AlertKind::RapidGrowth);
    assert!((result.events[0].metric - 2500.0).abs() < 1e-9);
}

#[test]
fn decreasing_engagement_is_zero_growth() {
    let now = t0();
    let history = history_with(&[("1", 4000, now - Duration::hours(1))]);
    let posts = vec![post("1", 1000)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(0.5, 5000),
        now,
    );

    assert!(result.events.is_empty());
    assert_eq!(result.history.get("1").map(|s| s.total), Some(1000));
}

#[test]
fn back_to_back_observation_uses_one_minute_floor() {
    let now = t0();
    let history = history_with(&[("1", 0, now - Duration::seconds(5))]);
    // 20 gained in 5s is measured over one minute: 1200/hour
    let posts = vec![post("1", 20)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        now,
    );

    assert_eq!(result.events.len(), 1);
    assert!((result.events[0].metric - 1200.0).abs() < 1e-6);
}

// ============================================================
// Both conditions
// ============================================================

#[test]
fn both_conditions_emit_rapid_growth_first() {
    let now = t0();
    let history = history_with(&[("1", 200, now - Duration::hours(1))]);
    let posts = vec![post("1", 5200)];

    let result = detect(
        &posts,
        history,
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        now,
    );

    let kinds: Vec<AlertKind> = result.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![AlertKind::RapidGrowth, AlertKind::AbsoluteThreshold]
    );
    assert!((result.events[0].metric - 5000.0).abs() < 1e-9);
    assert_eq!(result.events[1].metric, 5200.0);
}

#[test]
fn events_follow_input_order() {
    let posts = vec![post("b", 9000), post("a", 8000), post("c", 7000)];
    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    let ids: Vec<&str> = result.events.iter().map(|e| e.post_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

// ============================================================
// Ledger suppression
// ============================================================

#[test]
fn ledgered_post_is_suppressed_but_history_updates() {
    let now = t0();
    let mut ledger = AlertedLedger::new();
    ledger.insert("1", now - Duration::hours(5));
    let history = history_with(&[("1", 10_000, now - Duration::hours(1))]);
    let posts = vec![post("1", 50_000)];

    let result = detect(&posts, history, &ledger, &thresholds(1000.0, 5000), now);

    assert!(result.events.is_empty());
    assert_eq!(result.suppressed, 2);
    let snap = result.history.get("1").expect("history still updated");
    assert_eq!(snap.total, 50_000);
    assert_eq!(snap.observed_at, now);
}

// ============================================================
// Malformed and duplicate records
// ============================================================

#[test]
fn malformed_record_is_skipped_and_batch_continues() {
    let mut missing_id = post("", 9000);
    missing_id.author = "ghost".to_string();
    let posts = vec![post("1", 9000), missing_id, post("2", 9500)];

    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    assert_eq!(result.events.len(), 2);
    assert_eq!(result.processed, 2);
    assert_eq!(
        result.skipped,
        vec![MalformedRecord::MissingId {
            author: "ghost".to_string()
        }]
    );
    assert_eq!(result.history.len(), 2);
}

#[test]
fn negative_count_is_skipped() {
    let mut bad = post("7", 100);
    bad.replies = -3;
    let result = detect(
        &[bad],
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    assert!(result.events.is_empty());
    assert!(result.history.is_empty(), "Malformed posts leave no snapshot");
    assert_eq!(
        result.skipped,
        vec![MalformedRecord::NegativeCount {
            post_id: "7".to_string(),
            field: "replies",
            value: -3,
        }]
    );
}

#[test]
fn duplicate_id_in_batch_is_processed_once() {
    let posts = vec![post("1", 6000), post("1", 6000)];
    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &thresholds(1000.0, 5000),
        t0(),
    );

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.processed, 1);
}

// ============================================================
// Determinism
// ============================================================

#[test]
fn same_inputs_give_same_outputs() {
    let now = t0();
    let history = history_with(&[
        ("1", 1000, now - Duration::hours(2)),
        ("2", 10, now - Duration::hours(1)),
    ]);
    let posts = vec![post("1", 4000), post("2", 20), post("3", 7000)];
    let th = thresholds(1000.0, 5000);
    let ledger = AlertedLedger::new();

    let first = detect(&posts, history.clone(), &ledger, &th, now);
    let second = detect(&posts, history, &ledger, &th, now);

    assert_eq!(first.events, second.events);
    assert_eq!(first.history, second.history);
}

#[test]
fn unchanged_post_does_not_alert_on_rate() {
    let now = t0();
    let history = history_with(&[("1", 500, now - Duration::minutes(15))]);
    let result = detect(
        &[post("1", 500)],
        history,
        &AlertedLedger::new(),
        &thresholds(1.0, 5000),
        now,
    );
    assert!(result.events.is_empty());
}

#[test]
fn immediate_rerun_with_unchanged_counts_has_zero_growth() {
    let now = t0();
    let posts = vec![post("1", 800), post("2", 4999)];
    let th = thresholds(1000.0, 5000);
    let ledger = AlertedLedger::new();

    let first = detect(&posts, EngagementHistory::new(), &ledger, &th, now);
    assert!(first.events.is_empty());

    // Same instant: elapsed time is clamped to the one-minute floor
    let second = detect(&posts, first.history, &ledger, &th, now);
    assert!(
        second.events.is_empty(),
        "Unchanged counts must not produce RapidGrowth, got {:?}",
        second.events
    );
    assert_eq!(second.history.get("1").map(|s| s.observed_at), Some(now));
}
