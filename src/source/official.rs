// Official X API v2 backend.
//
// Uses the recent-search endpoint for keywords and the user timeline
// endpoint for followed accounts. Authenticated with an app bearer token.
//
// API docs: https://docs.x.com/x-api/posts/search-recent-posts

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use super::client::{ApiClient, FetchError};
use super::post::{permalink, Post};
use super::retry::with_retry;
use super::traits::PostSource;

/// Default endpoint for the official API.
pub const DEFAULT_API_URL: &str = "https://api.twitter.com";

const TWEET_FIELDS: &str = "created_at,public_metrics,author_id";

/// The v2 API rejects `max_results` outside 10..=100.
fn clamp_max_results(max: usize) -> usize {
    max.clamp(10, 100)
}

/// X API v2 client authenticated with a bearer token.
pub struct OfficialApi {
    client: ApiClient,
}

impl OfficialApi {
    pub fn new(bearer_token: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, bearer_token, timeout)
    }

    /// Point the client at a different host (for proxies or testing).
    pub fn with_base_url(base_url: &str, bearer_token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {bearer_token}"))
            .context("Bearer token contains invalid header characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            client: ApiClient::new(base_url, headers, timeout)?,
        })
    }

    async fn get_tweets(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        max_results: usize,
    ) -> Result<TweetsResponse, FetchError> {
        let max = clamp_max_results(max_results).to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("max_results", max.as_str()),
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ];
        params.extend_from_slice(extra);

        with_retry(path, || self.client.get_json::<TweetsResponse>(path, &params)).await
    }
}

#[async_trait]
impl PostSource for OfficialApi {
    fn name(&self) -> &'static str {
        "x-api-v2"
    }

    async fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<Post>, FetchError> {
        let response = self
            .get_tweets("/2/tweets/search/recent", &[("query", keyword)], max_results)
            .await?;
        Ok(response.into_posts(None, max_results))
    }

    async fn user_posts(
        &self,
        account: &str,
        max_results: usize,
    ) -> Result<Vec<Post>, FetchError> {
        let lookup_path = format!("/2/users/by/username/{account}");
        let user: UserLookupResponse = with_retry(&lookup_path, || {
            self.client.get_json::<UserLookupResponse>(&lookup_path, &[])
        })
        .await?;

        let Some(user) = user.data else {
            debug!(account = account, "User not found");
            return Ok(Vec::new());
        };

        let path = format!("/2/users/{}/tweets", user.id);
        let response = self.get_tweets(&path, &[], max_results).await?;
        Ok(response.into_posts(Some(account), max_results))
    }
}

// -- Serde types for the v2 responses --

/// Response shape shared by the search and timeline endpoints.
#[derive(Debug, Deserialize)]
pub struct TweetsResponse {
    #[serde(default)]
    pub data: Vec<ApiTweet>,
    #[serde(default)]
    pub includes: Option<Includes>,
}

/// One tweet. `id` and `text` default to empty so a broken record becomes a
/// Post the detector rejects, rather than failing the whole response.
#[derive(Debug, Deserialize)]
pub struct ApiTweet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(default)]
    pub quote_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<ApiUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    data: Option<ApiUser>,
}

impl TweetsResponse {
    /// Convert the API payload into Posts.
    ///
    /// Author handles come from the `includes.users` expansion; `fallback_author`
    /// is used for timeline responses where the author is already known.
    pub fn into_posts(self, fallback_author: Option<&str>, max_results: usize) -> Vec<Post> {
        let users: HashMap<String, String> = self
            .includes
            .map(|inc| inc.users.into_iter().map(|u| (u.id, u.username)).collect())
            .unwrap_or_default();

        self.data
            .into_iter()
            .take(max_results)
            .map(|tweet| {
                let author = tweet
                    .author_id
                    .as_ref()
                    .and_then(|id| users.get(id).cloned())
                    .or_else(|| fallback_author.map(str::to_string))
                    .unwrap_or_else(|| "unknown".to_string());
                let metrics = tweet.public_metrics.unwrap_or_default();

                Post {
                    url: permalink(&author, &tweet.id),
                    id: tweet.id,
                    author,
                    text: tweet.text,
                    created_at: tweet.created_at.unwrap_or_else(Utc::now),
                    likes: metrics.like_count,
                    reposts: metrics.retweet_count,
                    replies: metrics.reply_count,
                    quotes: metrics.quote_count,
                    matched_keyword: None,
                }
            })
            .collect()
    }
}
