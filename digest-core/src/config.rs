//! Credentials, forum catalog and output location.
//!
//! Values come from an optional TOML file, then environment variables
//! (a `.env` file is loaded first) override them.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUBREDDITS: [&str; 4] = ["Nepal", "technepal", "NepalSocial", "NepalPlusTwo"];
pub const DEFAULT_OUTPUT_PATH: &str = "reddit_posts.json";
pub const DEFAULT_USER_AGENT: &str = "reddit-digest/0.1";
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    /// Forum catalog, queried in this order.
    pub subreddits: Vec<String>,
    pub output_path: PathBuf,
    pub requests_per_minute: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    reddit: RedditSection,
    subreddits: Option<Vec<String>>,
    output_path: Option<PathBuf>,
    requests_per_minute: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RedditSection {
    client_id: Option<String>,
    client_secret: Option<String>,
    user_agent: Option<String>,
}

/// Load configuration from `path` (if given) and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<DigestConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let file = match path {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })?;
            toml::from_str(&contents)?
        }
        None => FileConfig::default(),
    };

    build_config(file, |key| std::env::var(key))
}

/// Parse a TOML document and resolve it against `lookup` instead of the
/// real environment.
pub fn config_from_toml<F>(contents: &str, lookup: F) -> Result<DigestConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let file: FileConfig = toml::from_str(contents)?;
    build_config(file, lookup)
}

fn build_config<F>(file: FileConfig, lookup: F) -> Result<DigestConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env = |var: &str| lookup(var).ok().filter(|v| !v.trim().is_empty());

    let reddit_client_id = env("REDDIT_CLIENT_ID")
        .or(file.reddit.client_id)
        .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
            var_name: "REDDIT_CLIENT_ID".to_string(),
        })?;

    let reddit_client_secret = env("REDDIT_CLIENT_SECRET")
        .or(file.reddit.client_secret)
        .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
            var_name: "REDDIT_CLIENT_SECRET".to_string(),
        })?;

    let reddit_user_agent = env("REDDIT_USER_AGENT")
        .or(file.reddit.user_agent)
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let subreddits = match env("REDDIT_DIGEST_SUBREDDITS") {
        Some(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
        None => file
            .subreddits
            .unwrap_or_else(|| DEFAULT_SUBREDDITS.iter().map(|s| s.to_string()).collect()),
    };

    if subreddits.is_empty() {
        return Err(ConfigError::MissingField {
            field: "subreddits".to_string(),
        });
    }
    if let Some(bad) = subreddits.iter().find(|s| s.is_empty() || s.contains('/')) {
        return Err(ConfigError::InvalidValue {
            field: "subreddits".to_string(),
            value: bad.clone(),
        });
    }

    let output_path = env("REDDIT_DIGEST_OUTPUT")
        .map(PathBuf::from)
        .or(file.output_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

    let requests_per_minute = match env("REDDIT_DIGEST_REQUESTS_PER_MINUTE") {
        Some(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
            field: "requests_per_minute".to_string(),
            value: raw.clone(),
        })?,
        None => file
            .requests_per_minute
            .unwrap_or(DEFAULT_REQUESTS_PER_MINUTE),
    };
    if requests_per_minute == 0 {
        return Err(ConfigError::InvalidValue {
            field: "requests_per_minute".to_string(),
            value: "0".to_string(),
        });
    }

    Ok(DigestConfig {
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
        subreddits,
        output_path,
        requests_per_minute,
    })
}
