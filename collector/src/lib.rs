pub mod aggregate;
pub mod cutoff;
pub mod fetcher;
pub mod flatten;
pub mod normalize;
pub mod pipeline;
pub mod planner;
pub mod writer;

pub use aggregate::Aggregator;
pub use fetcher::{fetch_posts, FetchedPosts};
pub use pipeline::{collect, run};
pub use planner::{plan, plan_all, plan_for_key, QueryPlan};
pub use writer::{read_document, write_document};
