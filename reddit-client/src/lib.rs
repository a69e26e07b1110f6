pub mod api;
pub mod auth;
pub mod metrics;
pub mod rate_limiter;


pub use api::RedditApiClient;
pub use auth::{RedditOAuth2Config, RedditToken};
pub use rate_limiter::RateLimitConfig;

use digest_core::{CoreError, ListingQuery, PostSource, RawPost, RedditApiError};
use std::time::Duration;
use tracing::{debug, warn};

/// Authenticated handle to the Reddit API, constructed once by the caller
/// and passed to the pipeline.
#[derive(Debug)]
pub struct RedditClient {
    config: RedditOAuth2Config,
    api: RedditApiClient,
    auth_http: reqwest::Client,
    token: Option<RedditToken>,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config, rate_config: RateLimitConfig) -> Result<Self, CoreError> {
        let api = RedditApiClient::with_base_url(
            config.user_agent.clone(),
            rate_config,
            &config.api_base_url,
        )?;
        let auth_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config,
            api,
            auth_http,
            token: None,
        })
    }

    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        let token = auth::request_token(&self.config, &self.auth_http).await?;
        self.token = Some(token);
        Ok(())
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.token = Some(token);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    pub fn needs_refresh(&self) -> bool {
        self.token.as_ref().is_some_and(RedditToken::is_expired)
    }

    fn access_token(&self) -> Result<&str, CoreError> {
        match &self.token {
            Some(token) if !token.is_expired() => Ok(&token.access_token),
            Some(_) => Err(CoreError::RedditApi(RedditApiError::InvalidToken)),
            None => Err(CoreError::RedditApi(
                RedditApiError::AuthenticationFailed {
                    reason: "Not authenticated".to_string(),
                },
            )),
        }
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api
    }

    pub async fn get_api_metrics(&self) -> metrics::ApiMetrics {
        self.api.get_metrics().await
    }

    pub async fn get_rate_limit_status(&self) -> rate_limiter::RateLimitStatus {
        self.api.get_rate_limit_status().await
    }
}

impl PostSource for RedditClient {
    /// One listing request, then one comment request per usable post to
    /// materialize its reply tree.
    async fn fetch_listing(
        &self,
        subreddit: &str,
        query: &ListingQuery,
    ) -> Result<Vec<RawPost>, CoreError> {
        let token = self.access_token()?;
        let listing = self.api.get_subreddit_posts(token, subreddit, query).await?;

        let mut posts = Vec::with_capacity(listing.data.children.len());
        for child in listing.data.children.into_iter().take(query.limit as usize) {
            let post_id = child.data.id.clone();
            let mut raw = match child.data.into_raw_post(Vec::new()) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(subreddit, post_id = post_id.as_str(), "Skipping post: {}", e);
                    continue;
                }
            };
            raw.replies = self.api.get_comment_tree(token, &post_id).await?;
            posts.push(raw);
        }

        debug!(subreddit, posts = posts.len(), "Adapted listing");
        Ok(posts)
    }
}
