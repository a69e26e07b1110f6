use crate::planner::QueryPlan;
use digest_core::{CoreError, PostSource, RawPost};
use tracing::{debug, error};

/// Posts from one listing query, in upstream order. Consumed once.
#[derive(Debug)]
pub struct FetchedPosts {
    posts: std::vec::IntoIter<RawPost>,
}

impl Iterator for FetchedPosts {
    type Item = RawPost;

    fn next(&mut self) -> Option<RawPost> {
        self.posts.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.posts.size_hint()
    }
}

impl ExactSizeIterator for FetchedPosts {}

/// Runs exactly one listing query for `subreddit`. Any failure becomes
/// `UpstreamUnavailable` and is not retried.
pub async fn fetch_posts<S: PostSource>(
    source: &S,
    subreddit: &str,
    plan: &QueryPlan,
) -> Result<FetchedPosts, CoreError> {
    let mut posts = source
        .fetch_listing(subreddit, &plan.query)
        .await
        .map_err(|e| {
            error!(subreddit, timeframe = %plan.timeframe, "Listing query failed: {}", e);
            upstream_unavailable(subreddit, e)
        })?;

    posts.truncate(plan.query.limit as usize);
    debug!(subreddit, timeframe = %plan.timeframe, posts = posts.len(), "Fetched listing");

    Ok(FetchedPosts {
        posts: posts.into_iter(),
    })
}

fn upstream_unavailable(subreddit: &str, error: CoreError) -> CoreError {
    match error {
        CoreError::UpstreamUnavailable { .. } => error,
        other => CoreError::UpstreamUnavailable {
            subreddit: subreddit.to_string(),
            reason: other.to_string(),
        },
    }
}
