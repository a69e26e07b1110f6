use crate::metrics::{MetricsCollector, RequestMetrics};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use digest_core::{
    timefmt, ConfigError, CoreError, ListingQuery, RawPost, RedditApiError, ReplyNode, SortMode,
};
use reqwest::{Client, Method, Response};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// Listing entry for a post. Everything except `id` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub num_comments: Option<u64>,
}

/// Second element of the `/comments/{id}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentListing {
    pub data: RedditCommentListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentListingData {
    #[serde(default)]
    pub children: Vec<RedditCommentThing>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum RedditCommentThing {
    #[serde(rename = "t1")]
    Comment(RedditCommentData),
    #[serde(rename = "more")]
    More(RedditMoreData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub replies: Option<RedditReplies>,
}

/// Reddit sends `""` instead of a listing when a comment has no replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RedditReplies {
    Listing(Box<RedditCommentListing>),
    Empty(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditMoreData {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    metrics: Arc<MetricsCollector>,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String, rate_config: RateLimitConfig) -> Result<Self, CoreError> {
        Self::with_base_url(user_agent, rate_config, REDDIT_API_BASE)
    }

    pub fn with_base_url(
        user_agent: String,
        rate_config: RateLimitConfig,
        base_url: &str,
    ) -> Result<Self, CoreError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "api_base_url".to_string(),
            value: format!("{base_url} ({e})"),
        })?;

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(rate_config)),
            metrics: Arc::new(MetricsCollector::new()),
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        info!("Making Reddit API request: {} {}", method, endpoint);
        let start_time = Instant::now();
        let outcome = match request_builder.send().await {
            Ok(response) => classify_response(response, endpoint),
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    Err(CoreError::RedditApi(RedditApiError::RequestTimeout))
                } else {
                    Err(CoreError::Network(e))
                }
            }
        };

        let (status_code, error_type, rate_limited) = match &outcome {
            Ok(response) => (Some(response.status().as_u16()), None, false),
            Err(CoreError::RedditApi(api_error)) => (
                None,
                Some(error_type_of(api_error).to_string()),
                matches!(api_error, RedditApiError::RateLimitExceeded { .. }),
            ),
            Err(_) => (None, Some("network_error".to_string()), false),
        };

        self.metrics
            .record_request(RequestMetrics {
                endpoint: endpoint.to_string(),
                method: method.to_string(),
                status_code,
                response_time: start_time.elapsed(),
                success: outcome.is_ok(),
                rate_limited,
                error_type,
            })
            .await;

        outcome
    }

    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        query: &ListingQuery,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/{}", subreddit, query.sort.as_str());
        let limit_str = query.limit.to_string();
        let mut params = vec![("limit", limit_str.as_str()), ("raw_json", "1")];

        if query.sort == SortMode::Top {
            if let Some(period) = query.period {
                params.push(("t", period.as_str()));
            }
        }

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(params.as_slice()))
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    /// Reply tree as delivered in a single response; `more` stubs are kept
    /// as continuation nodes and never followed.
    pub async fn get_comment_tree(
        &self,
        access_token: &str,
        post_id: &str,
    ) -> Result<Vec<ReplyNode>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let params = [("raw_json", "1")];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params[..]))
            .await?;

        let (_post, comments): (IgnoredAny, RedditCommentListing) =
            response.json().await.map_err(|e| {
                error!("Failed to parse comments for {}: {}", post_id, e);
                CoreError::RedditApi(RedditApiError::InvalidResponse {
                    details: format!("Failed to parse comments for post {}", post_id),
                })
            })?;

        let replies = comments.into_reply_nodes();
        debug!("Retrieved {} top-level replies for {}", replies.len(), post_id);
        Ok(replies)
    }

    pub async fn get_metrics(&self) -> crate::metrics::ApiMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn log_metrics(&self) {
        self.metrics.log_summary().await;
    }

    pub async fn get_rate_limit_status(&self) -> crate::rate_limiter::RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }

    pub async fn reset_metrics(&self) {
        self.metrics.reset_metrics().await;
    }
}

fn classify_response(response: Response, endpoint: &str) -> Result<Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        debug!("Request successful: {} {}", status, endpoint);
        return Ok(response);
    }

    error!("Request failed with status: {} for {}", status, endpoint);
    let api_error = match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(60);
            warn!("Rate limited, Reddit asked to wait {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: endpoint.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    };
    Err(CoreError::RedditApi(api_error))
}

fn error_type_of(error: &RedditApiError) -> &'static str {
    match error {
        RedditApiError::RateLimitExceeded { .. } => "rate_limited",
        RedditApiError::InvalidToken => "unauthorized",
        RedditApiError::Forbidden { .. } => "forbidden",
        RedditApiError::SubredditNotFound { .. } => "not_found",
        RedditApiError::ServerError { .. } => "server_error",
        RedditApiError::RequestTimeout => "timeout",
        RedditApiError::AuthenticationFailed { .. } => "auth_failed",
        RedditApiError::InvalidResponse { .. } => "invalid_response",
    }
}

impl RedditCommentListing {
    pub fn into_reply_nodes(self) -> Vec<ReplyNode> {
        self.data
            .children
            .into_iter()
            .map(ReplyNode::from)
            .collect()
    }
}

impl From<RedditCommentThing> for ReplyNode {
    fn from(thing: RedditCommentThing) -> Self {
        match thing {
            RedditCommentThing::Comment(comment) => {
                let children = match comment.replies {
                    Some(RedditReplies::Listing(listing)) => listing.into_reply_nodes(),
                    Some(RedditReplies::Empty(_)) | None => Vec::new(),
                };
                ReplyNode::reply_with_children(comment.body.unwrap_or_default(), children)
            }
            RedditCommentThing::More(more) => ReplyNode::Continuation { count: more.count },
        }
    }
}

impl RedditPostData {
    /// Adapts a listing entry to the value type the pipeline consumes.
    ///
    /// Missing text and counters degrade to empty/zero; a post without a
    /// permalink or creation time cannot be recorded.
    pub fn into_raw_post(self, replies: Vec<ReplyNode>) -> Result<RawPost, CoreError> {
        let permalink = self
            .permalink
            .filter(|p| !p.is_empty())
            .ok_or_else(|| CoreError::malformed("permalink", format!("post {} has none", self.id)))?;

        let created_utc = self
            .created_utc
            .and_then(timefmt::from_epoch_seconds)
            .ok_or_else(|| {
                CoreError::malformed("created_utc", format!("post {} has none", self.id))
            })?;

        Ok(RawPost {
            title: self.title.unwrap_or_default(),
            selftext: self.selftext.unwrap_or_default(),
            score: self.score.unwrap_or_default(),
            created_utc,
            num_comments: self.num_comments.unwrap_or_default(),
            replies,
            permalink,
        })
    }
}
