// RapidAPI `twitter-api45` backend.
//
// A third-party proxy for accounts without official API access. Its payloads
// are loosely typed (counts arrive as numbers or numeric strings, the id
// field name varies between endpoints), so records are parsed from raw JSON
// values. A record missing its id still becomes a Post with an empty id;
// the detector rejects it as malformed and reports it.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use super::client::{ApiClient, FetchError};
use super::post::{permalink, Post};
use super::retry::with_retry;
use super::traits::PostSource;

/// Default RapidAPI host for the twitter-api45 proxy.
pub const DEFAULT_RAPIDAPI_HOST: &str = "twitter-api45.p.rapidapi.com";

/// Timestamp format used by the proxy, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// RapidAPI proxy client.
pub struct RapidApi {
    client: ApiClient,
}

impl RapidApi {
    pub fn new(api_key: &str, api_host: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(&format!("https://{api_host}"), api_key, api_host, timeout)
    }

    /// Point the client at a different URL while keeping the RapidAPI headers.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        api_host: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .context("RapidAPI key contains invalid header characters")?;
        key.set_sensitive(true);
        headers.insert("x-rapidapi-key", key);
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(api_host).context("Invalid RapidAPI host")?,
        );

        Ok(Self {
            client: ApiClient::new(base_url, headers, timeout)?,
        })
    }

    async fn get_timeline(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        with_retry(path, || self.client.get_json::<Value>(path, params)).await
    }
}

#[async_trait]
impl PostSource for RapidApi {
    fn name(&self) -> &'static str {
        "rapidapi"
    }

    async fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<Post>, FetchError> {
        let body = self
            .get_timeline(
                "/search.php",
                &[("query", keyword), ("search_type", "Latest")],
            )
            .await?;
        Ok(parse_timeline(&body, None, max_results))
    }

    async fn user_posts(
        &self,
        account: &str,
        max_results: usize,
    ) -> Result<Vec<Post>, FetchError> {
        let body = self
            .get_timeline("/timeline.php", &[("screenname", account)])
            .await?;
        // The timeline endpoint omits screen_name on each record.
        Ok(parse_timeline(&body, Some(account), max_results))
    }
}

/// Extract posts from a search or timeline payload.
///
/// Records live under `timeline` (or `tweets` on some proxy versions).
pub fn parse_timeline(body: &Value, fallback_author: Option<&str>, max_results: usize) -> Vec<Post> {
    let records = ["timeline", "tweets"]
        .iter()
        .filter_map(|key| body.get(key).and_then(Value::as_array))
        .find(|arr| !arr.is_empty());

    let Some(records) = records else {
        debug!("Response contained no timeline records");
        return Vec::new();
    };

    records
        .iter()
        .take(max_results)
        .map(|record| parse_record(record, fallback_author))
        .collect()
}

/// Parse one proxy record into a Post.
pub fn parse_record(record: &Value, fallback_author: Option<&str>) -> Post {
    let id = string_field(record, &["tweet_id", "id"]).unwrap_or_default();
    let author = string_field(record, &["screen_name", "username"])
        .or_else(|| fallback_author.map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());
    let created_at = record
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_str(s, CREATED_AT_FORMAT).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Post {
        url: permalink(&author, &id),
        text: string_field(record, &["text"]).unwrap_or_default(),
        created_at,
        likes: count_field(record, &["favorites", "like_count"]),
        reposts: count_field(record, &["retweets", "retweet_count"]),
        replies: count_field(record, &["replies", "reply_count"]),
        quotes: count_field(record, &["quotes", "quote_count"]),
        id,
        author,
        matched_keyword: None,
    }
}

/// First non-empty value among `keys`, accepting strings or numbers.
fn string_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First present count among `keys`, accepting numbers or numeric strings.
/// Missing or unparseable counts are treated as zero.
fn count_field(record: &Value, keys: &[&str]) -> i64 {
    keys.iter()
        .find_map(|key| match record.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
}
