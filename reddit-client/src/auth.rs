//! Application-only OAuth2 (client-credentials grant) for the Reddit API.

use digest_core::{ConfigError, CoreError, RedditApiError};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens without an `expires_in` are treated as valid for an hour.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub token_url: String,
    pub api_base_url: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
            token_url: REDDIT_TOKEN_URL.to_string(),
            api_base_url: crate::api::REDDIT_API_BASE.to_string(),
        }
    }

    pub fn with_endpoints(mut self, token_url: &str, api_base_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.api_base_url = api_base_url.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

pub fn get_required_scopes() -> Vec<&'static str> {
    vec!["read"]
}

/// Exchanges the configured client id/secret for an access token.
pub async fn request_token(
    config: &RedditOAuth2Config,
    http_client: &reqwest::Client,
) -> Result<RedditToken, CoreError> {
    let token_url = TokenUrl::new(config.token_url.clone()).map_err(|e| {
        ConfigError::InvalidValue {
            field: "token_url".to_string(),
            value: format!("{} ({e})", config.token_url),
        }
    })?;
    let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
        ConfigError::InvalidValue {
            field: "auth_url".to_string(),
            value: e.to_string(),
        }
    })?;

    let client = BasicClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.clone())),
        auth_url,
        Some(token_url),
    );

    let mut request = client.exchange_client_credentials();
    for scope in get_required_scopes() {
        request = request.add_scope(Scope::new(scope.to_string()));
    }

    debug!("Requesting client-credentials token from {}", config.token_url);
    let http = http_client.clone();
    let user_agent = config.user_agent.clone();
    let response = request
        .request_async(move |req| send_token_request(http, user_agent, req))
        .await
        .map_err(|e| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: e.to_string(),
            })
        })?;

    let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
    let scope = response
        .scopes()
        .map(|scopes| scopes.iter().map(|s| (**s).clone()).collect())
        .unwrap_or_else(|| {
            get_required_scopes()
                .into_iter()
                .map(str::to_string)
                .collect()
        });

    info!("Obtained Reddit access token valid for {:?}", lifetime);
    Ok(RedditToken {
        access_token: response.access_token().secret().clone(),
        expires_at: SystemTime::now() + lifetime,
        scope,
    })
}

/// The token endpoint rejects requests without a descriptive User-Agent,
/// so the exchange goes through our own client instead of oauth2's default.
async fn send_token_request(
    http_client: reqwest::Client,
    user_agent: String,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .header(reqwest::header::USER_AGENT, user_agent)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
