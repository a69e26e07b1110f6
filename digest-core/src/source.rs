use crate::error::CoreError;
use crate::types::{ListingQuery, RawPost};

/// The upstream query surface, owned by the caller and handed to the fetcher.
///
/// Implementations return posts in upstream order with their reply trees
/// already materialized, adapted to [`RawPost`].
// Callers stay generic over the source and never need a `Send` future; the
// in-memory test sources hold `RefCell` state.
#[allow(async_fn_in_trait)]
pub trait PostSource {
    async fn fetch_listing(
        &self,
        subreddit: &str,
        query: &ListingQuery,
    ) -> Result<Vec<RawPost>, CoreError>;
}
