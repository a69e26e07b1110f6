use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Joins flattened reply bodies inside `PostRecord::comments`.
///
/// Reply bodies are not escaped, so a body containing this sequence splits
/// into extra pieces on the consuming side.
pub const COMMENT_DELIMITER: &str = "|||";

/// Prefixed to the relative permalink to build `PostRecord::url`.
pub const REDDIT_ORIGIN: &str = "https://www.reddit.com";

/// One of the four named collection windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Day,
    Week,
    FourteenDays,
    Month,
}

impl Timeframe {
    /// Declared order; also the key order of the output document.
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::FourteenDays,
        Timeframe::Month,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::FourteenDays => "14_days",
            Timeframe::Month => "month",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.key() == s)
            .ok_or_else(|| CoreError::InvalidWindow { key: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Recency-ranked listing.
    Hot,
    /// Score-ranked listing within a period.
    Top,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Hot => "hot",
            SortMode::Top => "top",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopPeriod {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TopPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopPeriod::Day => "day",
            TopPeriod::Week => "week",
            TopPeriod::Month => "month",
            TopPeriod::Year => "year",
            TopPeriod::All => "all",
        }
    }
}

/// Parameters of a single upstream listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingQuery {
    pub sort: SortMode,
    /// Only meaningful for `SortMode::Top`.
    pub period: Option<TopPeriod>,
    pub limit: u32,
}

/// A node of a post's reply tree as delivered by the upstream service.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyNode {
    Reply(Reply),
    /// "Load more replies" placeholder; never expanded.
    Continuation { count: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: String,
    pub children: Vec<ReplyNode>,
}

impl ReplyNode {
    pub fn reply(body: impl Into<String>) -> Self {
        ReplyNode::Reply(Reply {
            body: body.into(),
            children: Vec::new(),
        })
    }

    pub fn reply_with_children(body: impl Into<String>, children: Vec<ReplyNode>) -> Self {
        ReplyNode::Reply(Reply {
            body: body.into(),
            children,
        })
    }
}

/// Fields of an upstream post that the normalizer and flattener consume.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub title: String,
    pub selftext: String,
    pub score: i64,
    pub created_utc: DateTime<Utc>,
    pub num_comments: u64,
    pub replies: Vec<ReplyNode>,
    /// Relative path, e.g. `/r/rust/comments/abc123/title/`.
    pub permalink: String,
}

/// The unit persisted and consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub subreddit: String,
    pub heading: String,
    pub body: String,
    pub upvotes: i64,
    pub time_posted: String,
    pub comment_counts: u64,
    pub comments: String,
    pub url: String,
}

/// Timeframe key to records, plus the generation stamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeDocument {
    #[serde(default)]
    pub day: Vec<PostRecord>,
    #[serde(default)]
    pub week: Vec<PostRecord>,
    #[serde(default, rename = "14_days")]
    pub fourteen_days: Vec<PostRecord>,
    #[serde(default)]
    pub month: Vec<PostRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl TimeframeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, timeframe: Timeframe) -> &[PostRecord] {
        match timeframe {
            Timeframe::Day => &self.day,
            Timeframe::Week => &self.week,
            Timeframe::FourteenDays => &self.fourteen_days,
            Timeframe::Month => &self.month,
        }
    }

    pub fn records_mut(&mut self, timeframe: Timeframe) -> &mut Vec<PostRecord> {
        match timeframe {
            Timeframe::Day => &mut self.day,
            Timeframe::Week => &mut self.week,
            Timeframe::FourteenDays => &mut self.fourteen_days,
            Timeframe::Month => &mut self.month,
        }
    }

    pub fn total_records(&self) -> usize {
        Timeframe::ALL.iter().map(|tf| self.records(*tf).len()).sum()
    }
}
