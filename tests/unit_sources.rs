// Unit tests for post sources: payload parsing for both backends and the
// batch `fetch` logic shared by every PostSource.
//
// `fetch` is exercised through an in-memory source, so no network access.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::json;

use trendwatch::error::RunError;
use trendwatch::source::client::FetchError;
use trendwatch::source::official::TweetsResponse;
use trendwatch::source::post::{permalink, Post};
use trendwatch::source::rapidapi::{parse_record, parse_timeline};
use trendwatch::source::traits::{FetchRequest, PostSource};
use trendwatch::state::{AlertedLedger, EngagementHistory};
use trendwatch::trends::{detect, MalformedRecord, Thresholds};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

// ============================================================
// Official API v2 payloads
// ============================================================

#[test]
fn official_search_payload_resolves_authors_from_includes() {
    let body = json!({
        "data": [
            {
                "id": "1801",
                "text": "New LLM eval results",
                "author_id": "42",
                "created_at": "2026-03-01T10:00:00.000Z",
                "public_metrics": {
                    "like_count": 120,
                    "retweet_count": 30,
                    "reply_count": 8,
                    "quote_count": 2
                }
            }
        ],
        "includes": { "users": [ { "id": "42", "username": "evalbot" } ] }
    });

    let response: TweetsResponse = serde_json::from_value(body).unwrap();
    let posts = response.into_posts(None, 100);

    assert_eq!(posts.len(), 1);
    let p = &posts[0];
    assert_eq!(p.id, "1801");
    assert_eq!(p.author, "evalbot");
    assert_eq!(p.likes, 120);
    assert_eq!(p.reposts, 30);
    assert_eq!(p.replies, 8);
    assert_eq!(p.quotes, 2);
    assert_eq!(p.total_engagement(), 160);
    assert_eq!(p.url, "https://x.com/evalbot/status/1801");
    assert_eq!(p.created_at, Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
}

#[test]
fn official_timeline_payload_uses_fallback_author() {
    let body = json!({
        "data": [
            { "id": "1", "text": "a", "public_metrics": { "like_count": 5 } },
            { "id": "2", "text": "b" }
        ]
    });

    let response: TweetsResponse = serde_json::from_value(body).unwrap();
    let posts = response.into_posts(Some("datanerd"), 100);

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.author == "datanerd"));
    assert_eq!(posts[0].likes, 5);
    assert_eq!(posts[1].total_engagement(), 0, "Missing metrics count as zero");
}

#[test]
fn official_empty_result_has_no_data_field() {
    let body = json!({ "meta": { "result_count": 0 } });
    let response: TweetsResponse = serde_json::from_value(body).unwrap();
    assert!(response.into_posts(None, 100).is_empty());
}

#[test]
fn official_payload_respects_max_results() {
    let data: Vec<_> = (0..20)
        .map(|i| json!({ "id": i.to_string(), "text": "t" }))
        .collect();
    let response: TweetsResponse = serde_json::from_value(json!({ "data": data })).unwrap();
    assert_eq!(response.into_posts(Some("x"), 5).len(), 5);
}

#[test]
fn official_record_without_id_does_not_sink_the_response() {
    let body = r#"{
        "data": [
            { "id": "1", "text": "ok", "public_metrics": { "like_count": 7 } },
            { "text": "no id" },
            { "id": "3" }
        ]
    }"#;

    let response: TweetsResponse = serde_json::from_str(body).unwrap();
    let posts = response.into_posts(Some("someone"), 100);

    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].id, "1");
    assert!(posts[1].id.is_empty());
    assert_eq!(posts[2].text, "");

    let result = detect(
        &posts,
        EngagementHistory::new(),
        &AlertedLedger::new(),
        &Thresholds {
            rapid_growth_per_hour: 1000.0,
            absolute_total: 5000,
        },
        t0(),
    );
    assert_eq!(result.processed, 2);
    assert_eq!(
        result.skipped,
        vec![MalformedRecord::MissingId {
            author: "someone".to_string()
        }]
    );
}

// ============================================================
// RapidAPI payloads
// ============================================================

#[test]
fn rapidapi_record_parses_counts_and_timestamp() {
    let record = json!({
        "tweet_id": "1900",
        "screen_name": "mlops",
        "text": "GPT pipelines in prod",
        "created_at": "Sun Mar 01 09:30:00 +0000 2026",
        "favorites": 900,
        "retweets": "150",
        "replies": 40,
        "quotes": 10
    });

    let p = parse_record(&record, None);
    assert_eq!(p.id, "1900");
    assert_eq!(p.author, "mlops");
    assert_eq!(p.likes, 900);
    assert_eq!(p.reposts, 150, "Counts may arrive as strings");
    assert_eq!(p.total_engagement(), 1100);
    assert_eq!(p.created_at, Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap());
    assert_eq!(p.url, permalink("mlops", "1900"));
}

#[test]
fn rapidapi_record_without_id_yields_empty_id() {
    let p = parse_record(&json!({ "text": "orphan", "favorites": 3 }), Some("someone"));
    assert!(p.id.is_empty());
    assert_eq!(p.author, "someone");
}

#[test]
fn rapidapi_huge_string_counts_saturate_total() {
    let record = json!({
        "tweet_id": "1",
        "favorites": "9223372036854775807",
        "retweets": "9223372036854775807",
        "replies": "9223372036854775807"
    });

    let p = parse_record(&record, Some("u"));
    assert_eq!(p.likes, i64::MAX);
    assert_eq!(p.total_engagement(), u64::MAX);
}

#[test]
fn rapidapi_timeline_reads_timeline_or_tweets_key() {
    let under_timeline = json!({ "timeline": [ { "tweet_id": "1", "text": "a" } ] });
    let under_tweets = json!({ "tweets": [ { "tweet_id": "2", "text": "b" } ] });

    assert_eq!(parse_timeline(&under_timeline, Some("u"), 10)[0].id, "1");
    assert_eq!(parse_timeline(&under_tweets, Some("u"), 10)[0].id, "2");
    assert!(parse_timeline(&json!({}), Some("u"), 10).is_empty());
}

#[test]
fn rapidapi_timeline_respects_max_results() {
    let records: Vec<_> = (0..8).map(|i| json!({ "tweet_id": i.to_string() })).collect();
    let body = json!({ "timeline": records });
    assert_eq!(parse_timeline(&body, Some("u"), 3).len(), 3);
}

// ============================================================
// FetchError classification
// ============================================================

#[test]
fn rate_limit_and_server_errors_are_transient() {
    let status = |code: u16| FetchError::Status {
        endpoint: "/2/tweets/search/recent".to_string(),
        status: StatusCode::from_u16(code).unwrap(),
        body: String::new(),
    };

    assert!(status(429).is_transient());
    assert!(status(503).is_transient());
    assert!(!status(401).is_transient());
    assert!(!status(404).is_transient());
}

// ============================================================
// PostSource::fetch
// ============================================================

/// In-memory source: canned results per keyword / account, and a list of
/// queries that fail.
#[derive(Default)]
struct FakeSource {
    searches: HashMap<String, Vec<Post>>,
    timelines: HashMap<String, Vec<Post>>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

fn unavailable(query: &str) -> FetchError {
    FetchError::Status {
        endpoint: query.to_string(),
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "over capacity".to_string(),
    }
}

#[async_trait]
impl PostSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(&self, keyword: &str, _max_results: usize) -> Result<Vec<Post>, FetchError> {
        self.calls.lock().unwrap().push(format!("search:{keyword}"));
        if self.failing.iter().any(|f| f == keyword) {
            return Err(unavailable(keyword));
        }
        Ok(self.searches.get(keyword).cloned().unwrap_or_default())
    }

    async fn user_posts(&self, account: &str, _max_results: usize) -> Result<Vec<Post>, FetchError> {
        self.calls.lock().unwrap().push(format!("user:{account}"));
        if self.failing.iter().any(|f| f == account) {
            return Err(unavailable(account));
        }
        Ok(self.timelines.get(account).cloned().unwrap_or_default())
    }
}

fn post(id: &str, created_at: DateTime<Utc>) -> Post {
    Post {
        id: id.to_string(),
        author: "author".to_string(),
        text: "text".to_string(),
        created_at,
        likes: 1,
        reposts: 0,
        replies: 0,
        quotes: 0,
        url: permalink("author", id),
        matched_keyword: None,
    }
}

fn request(keywords: &[&str], accounts: &[&str]) -> FetchRequest {
    FetchRequest {
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        accounts: accounts.iter().map(|s| s.to_string()).collect(),
        max_results_per_query: 100,
        now: t0(),
    }
}

#[tokio::test]
async fn fetch_tags_keyword_and_dedupes_by_id() {
    let recent = t0() - Duration::hours(1);
    let mut source = FakeSource::default();
    source
        .searches
        .insert("AI".to_string(), vec![post("1", recent), post("2", recent)]);
    source
        .searches
        .insert("GPT".to_string(), vec![post("2", recent), post("3", recent)]);
    source
        .timelines
        .insert("openai".to_string(), vec![post("3", recent), post("4", recent)]);

    let outcome = source
        .fetch(&request(&["AI", "GPT"], &["openai"]))
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);

    let keyword_of = |id: &str| {
        outcome
            .posts
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.matched_keyword.clone())
    };
    assert_eq!(keyword_of("2"), Some("AI".to_string()), "First occurrence wins");
    assert_eq!(keyword_of("3"), Some("GPT".to_string()));
    assert_eq!(keyword_of("4"), None, "Timeline posts carry no keyword");
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn fetch_drops_posts_outside_recency_window() {
    let mut source = FakeSource::default();
    source.searches.insert(
        "LLM".to_string(),
        vec![
            post("old", t0() - Duration::days(8)),
            post("new", t0() - Duration::days(6)),
        ],
    );

    let outcome = source.fetch(&request(&["LLM"], &[])).await.unwrap();

    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.posts[0].id, "new");
    assert_eq!(outcome.stale, 1);
}

#[tokio::test]
async fn fetch_strips_at_sign_from_accounts() {
    let source = FakeSource::default();
    source.fetch(&request(&[], &["@karpathy"])).await.unwrap();

    let calls = source.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["user:karpathy".to_string()]);
}

#[tokio::test]
async fn fetch_partial_failure_keeps_other_results() {
    let recent = t0() - Duration::hours(1);
    let mut source = FakeSource::default();
    source.searches.insert("AI".to_string(), vec![post("1", recent)]);
    source.failing.push("GPT".to_string());

    let outcome = source.fetch(&request(&["AI", "GPT"], &[])).await.unwrap();

    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].query.contains("GPT"));
}

#[tokio::test]
async fn fetch_total_failure_is_source_fetch_error() {
    let mut source = FakeSource::default();
    source.failing.push("AI".to_string());
    source.failing.push("openai".to_string());

    let err = source
        .fetch(&request(&["AI"], &["openai"]))
        .await
        .unwrap_err();

    assert!(
        matches!(err, RunError::SourceFetch(_)),
        "Expected SourceFetch, got {err:?}"
    );
}

#[tokio::test]
async fn fetch_with_no_queries_is_empty_not_an_error() {
    let source = FakeSource::default();
    let outcome = source.fetch(&request(&[], &[])).await.unwrap();
    assert!(outcome.posts.is_empty());
}
