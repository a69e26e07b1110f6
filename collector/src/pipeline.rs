//! One collection run: plan, fetch, cut off, flatten, normalize, aggregate,
//! and finally write.

use crate::aggregate::Aggregator;
use crate::cutoff::apply_cutoff;
use crate::fetcher::fetch_posts;
use crate::normalize::build_record;
use crate::planner::plan_all;
use crate::writer::write_document;
use chrono::{DateTime, Utc};
use digest_core::{timefmt, CoreError, PostRecord, PostSource, Timeframe, TimeframeDocument};
use std::path::Path;
use tracing::info;

/// Builds the full document in memory. Requests run one at a time, every
/// timeframe for a subreddit before moving to the next subreddit; the first
/// failure aborts the run.
///
/// `run_start` is truncated to the minute first, so the `14_days` cutoff,
/// `last_updated` and every `time_posted` share one precision.
pub async fn collect<S: PostSource>(
    source: &S,
    subreddits: &[String],
    run_start: DateTime<Utc>,
) -> Result<TimeframeDocument, CoreError> {
    let run_start = timefmt::truncate_to_minute(run_start);
    let plans = plan_all(run_start);
    let mut aggregator = Aggregator::new();

    for subreddit in subreddits {
        for plan in &plans {
            let fetched = fetch_posts(source, subreddit, plan).await?;
            let fetched_count = fetched.len();

            let records: Vec<PostRecord> = apply_cutoff(fetched, plan.cutoff)
                .map(|post| build_record(subreddit, &post))
                .collect();

            info!(
                subreddit = subreddit.as_str(),
                timeframe = %plan.timeframe,
                fetched = fetched_count,
                kept = records.len(),
                "Collected posts"
            );
            aggregator.append(plan.timeframe, records);
        }
    }

    for timeframe in Timeframe::ALL {
        info!(timeframe = %timeframe, records = aggregator.len(timeframe), "Timeframe complete");
    }

    Ok(aggregator.finish(Some(timefmt::format_minute(run_start))))
}

/// Collects and then overwrites `output_path`. Nothing is written unless
/// every fetch succeeded.
pub async fn run<S: PostSource>(
    source: &S,
    subreddits: &[String],
    output_path: &Path,
    run_start: DateTime<Utc>,
) -> Result<TimeframeDocument, CoreError> {
    let document = collect(source, subreddits, run_start).await?;
    write_document(output_path, &document).await?;
    Ok(document)
}
