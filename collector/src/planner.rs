//! Timeframe to upstream query strategy. Nothing else in the crate decides
//! sort modes, periods or cutoffs.

use chrono::{DateTime, Duration, Utc};
use digest_core::{CoreError, ListingQuery, SortMode, Timeframe, TopPeriod};

/// Upper bound on posts requested per subreddit and timeframe.
pub const ITEM_CAP: u32 = 30;

/// Width of the client-side window used for `14_days`.
pub const FOURTEEN_DAY_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPlan {
    pub timeframe: Timeframe,
    pub query: ListingQuery,
    /// Posts created before this instant are dropped after fetching.
    pub cutoff: Option<DateTime<Utc>>,
}

pub fn plan(timeframe: Timeframe, run_start: DateTime<Utc>) -> QueryPlan {
    let (sort, period, cutoff) = match timeframe {
        Timeframe::Day => (SortMode::Hot, None, None),
        Timeframe::Week => (SortMode::Top, Some(TopPeriod::Week), None),
        // No native two-week period upstream: ask for the month, trim locally.
        Timeframe::FourteenDays => (
            SortMode::Top,
            Some(TopPeriod::Month),
            Some(run_start - Duration::days(FOURTEEN_DAY_WINDOW_DAYS)),
        ),
        Timeframe::Month => (SortMode::Top, Some(TopPeriod::Month), None),
    };

    QueryPlan {
        timeframe,
        query: ListingQuery {
            sort,
            period,
            limit: ITEM_CAP,
        },
        cutoff,
    }
}

pub fn plan_for_key(key: &str, run_start: DateTime<Utc>) -> Result<QueryPlan, CoreError> {
    Ok(plan(key.parse()?, run_start))
}

/// Plans for every timeframe in document order, sharing one cutoff base.
pub fn plan_all(run_start: DateTime<Utc>) -> Vec<QueryPlan> {
    Timeframe::ALL
        .iter()
        .map(|timeframe| plan(*timeframe, run_start))
        .collect()
}
