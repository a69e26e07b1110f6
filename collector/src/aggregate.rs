use digest_core::{PostRecord, Timeframe, TimeframeDocument};

/// Builds the per-timeframe lists. Callers append forums in catalog order;
/// records are never re-sorted or deduplicated.
#[derive(Debug, Default)]
pub struct Aggregator {
    document: TimeframeDocument,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<I>(&mut self, timeframe: Timeframe, records: I)
    where
        I: IntoIterator<Item = PostRecord>,
    {
        self.document.records_mut(timeframe).extend(records);
    }

    pub fn len(&self, timeframe: Timeframe) -> usize {
        self.document.records(timeframe).len()
    }

    pub fn finish(mut self, last_updated: Option<String>) -> TimeframeDocument {
        self.document.last_updated = last_updated;
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subreddit: &str, heading: &str) -> PostRecord {
        PostRecord {
            subreddit: subreddit.to_string(),
            heading: heading.to_string(),
            body: String::new(),
            upvotes: 1,
            time_posted: "2024-01-01 00:00".to_string(),
            comment_counts: 0,
            comments: String::new(),
            url: format!("https://www.reddit.com/r/{subreddit}/comments/{heading}/"),
        }
    }

    #[test]
    fn test_catalog_order_preserved() {
        let mut aggregator = Aggregator::new();
        aggregator.append(Timeframe::Week, vec![record("A", "a1"), record("A", "a2")]);
        aggregator.append(Timeframe::Day, vec![record("A", "a3")]);
        aggregator.append(Timeframe::Week, vec![record("B", "b1")]);

        assert_eq!(aggregator.len(Timeframe::Week), 3);
        let doc = aggregator.finish(None);
        let headings: Vec<&str> = doc.week.iter().map(|r| r.heading.as_str()).collect();
        assert_eq!(headings, vec!["a1", "a2", "b1"]);
        assert_eq!(doc.day.len(), 1);
        assert!(doc.month.is_empty());
        assert!(doc.last_updated.is_none());
    }

    #[test]
    fn test_same_post_in_two_timeframes() {
        let mut aggregator = Aggregator::new();
        aggregator.append(Timeframe::Week, vec![record("A", "same")]);
        aggregator.append(Timeframe::Month, vec![record("A", "same")]);

        let doc = aggregator.finish(Some("2024-01-01 00:00".to_string()));
        assert_eq!(doc.week, doc.month);
        assert_eq!(doc.total_records(), 2);
    }
}
