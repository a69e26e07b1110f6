//! End-to-end runs against an in-memory `PostSource`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use collector::flatten::{flatten_replies, split_comments};
use collector::{collect, read_document, run};
use digest_core::{
    timefmt, CoreError, ListingQuery, PostSource, RawPost, RedditApiError, ReplyNode, SortMode,
    Timeframe, TopPeriod,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

struct CannedSource {
    posts: HashMap<String, Vec<RawPost>>,
    fail_on: Option<(String, SortMode)>,
    calls: RefCell<Vec<(String, ListingQuery)>>,
}

impl CannedSource {
    fn new(posts: HashMap<String, Vec<RawPost>>) -> Self {
        Self {
            posts,
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(mut self, subreddit: &str, sort: SortMode) -> Self {
        self.fail_on = Some((subreddit.to_string(), sort));
        self
    }
}

impl PostSource for CannedSource {
    async fn fetch_listing(
        &self,
        subreddit: &str,
        query: &ListingQuery,
    ) -> Result<Vec<RawPost>, CoreError> {
        self.calls
            .borrow_mut()
            .push((subreddit.to_string(), *query));

        if let Some((fail_subreddit, fail_sort)) = &self.fail_on {
            if fail_subreddit == subreddit && *fail_sort == query.sort {
                return Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: 503,
                }));
            }
        }

        Ok(self.posts.get(subreddit).cloned().unwrap_or_default())
    }
}

fn run_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 30).unwrap()
}

fn post(subreddit: &str, n: u32, created_utc: DateTime<Utc>, title: &str) -> RawPost {
    RawPost {
        title: title.to_string(),
        selftext: format!("body of {subreddit}{n}\nनेपाली पाठ"),
        score: 100 - n as i64 * 7,
        created_utc,
        num_comments: n as u64 * 2,
        replies: vec![
            ReplyNode::reply_with_children(
                format!("reply to {subreddit}{n}"),
                vec![ReplyNode::Continuation { count: 4 }],
            ),
            ReplyNode::reply("धन्यवाद\nfriend"),
        ],
        permalink: format!("/r/{subreddit}/comments/{subreddit}{n}/post/"),
    }
}

fn three_posts(subreddit: &str) -> Vec<RawPost> {
    (1..=3)
        .map(|n| {
            post(
                subreddit,
                n,
                run_start() - Duration::hours(n as i64 * 5),
                &format!("{subreddit}{n}"),
            )
        })
        .collect()
}

fn catalog() -> Vec<String> {
    vec!["A".to_string(), "B".to_string()]
}

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("digest_pipeline_{}.json", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn month_lists_forums_in_catalog_then_fetch_order() {
    let source = CannedSource::new(HashMap::from([
        ("A".to_string(), three_posts("A")),
        ("B".to_string(), three_posts("B")),
    ]));

    let doc = collect(&source, &catalog(), run_start()).await.unwrap();

    let headings: Vec<&str> = doc.month.iter().map(|r| r.heading.as_str()).collect();
    assert_eq!(headings, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
    assert!(doc.month[..3].iter().all(|r| r.subreddit == "A"));
    assert!(doc.month[3..].iter().all(|r| r.subreddit == "B"));
    assert_eq!(doc.last_updated.as_deref(), Some("2024-06-15 09:00"));
}

#[tokio::test]
async fn queries_follow_the_plan_table() {
    let source = CannedSource::new(HashMap::new());
    collect(&source, &catalog(), run_start()).await.unwrap();

    let calls = source.calls.borrow();
    assert_eq!(calls.len(), 8);

    let expected = [
        (SortMode::Hot, None),
        (SortMode::Top, Some(TopPeriod::Week)),
        (SortMode::Top, Some(TopPeriod::Month)),
        (SortMode::Top, Some(TopPeriod::Month)),
    ];
    for (i, (subreddit, query)) in calls.iter().enumerate() {
        let expected_subreddit = if i < 4 { "A" } else { "B" };
        assert_eq!(subreddit, expected_subreddit);
        assert_eq!((query.sort, query.period), expected[i % 4]);
        assert_eq!(query.limit, 30);
    }
}

#[tokio::test]
async fn only_fourteen_days_is_cut_off() {
    // run_start() carries 30 seconds; the cutoff lands on 2024-06-01 09:00.
    let minute_cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let recent = post("A", 1, run_start() - Duration::days(2), "recent");
    let boundary = post("A", 2, run_start() - Duration::days(14), "boundary");
    let same_minute = post("A", 3, minute_cutoff + Duration::seconds(10), "same_minute");
    let just_before = post("A", 4, minute_cutoff - Duration::seconds(10), "just_before");
    let old = post("A", 5, run_start() - Duration::days(20), "old");
    let source = CannedSource::new(HashMap::from([(
        "A".to_string(),
        vec![recent, old, boundary, same_minute, just_before],
    )]));

    let doc = collect(&source, &["A".to_string()], run_start())
        .await
        .unwrap();

    for timeframe in [Timeframe::Day, Timeframe::Week, Timeframe::Month] {
        assert_eq!(doc.records(timeframe).len(), 5, "{timeframe} is not filtered");
    }

    let headings: Vec<&str> = doc
        .fourteen_days
        .iter()
        .map(|r| r.heading.as_str())
        .collect();
    assert_eq!(headings, vec!["recent", "boundary", "same_minute"]);

    let recorded_start = timefmt::parse_minute(doc.last_updated.as_deref().unwrap()).unwrap();
    let cutoff = recorded_start - Duration::days(14);
    assert_eq!(cutoff, minute_cutoff);
    for record in &doc.fourteen_days {
        let posted = timefmt::parse_minute(&record.time_posted).unwrap();
        assert!(posted >= cutoff, "{} posted before {cutoff}", record.time_posted);
    }
}

#[tokio::test]
async fn item_cap_bounds_each_listing() {
    let many: Vec<RawPost> = (0..45)
        .map(|n| post("A", n, run_start() - Duration::minutes(n as i64), &format!("p{n}")))
        .collect();
    let source = CannedSource::new(HashMap::from([("A".to_string(), many)]));

    let doc = collect(&source, &["A".to_string()], run_start())
        .await
        .unwrap();

    assert_eq!(doc.day.len(), 30);
    assert_eq!(doc.day.last().unwrap().heading, "p29");
}

#[tokio::test]
async fn comments_split_back_into_flattened_bodies() {
    let source = CannedSource::new(HashMap::from([("A".to_string(), three_posts("A"))]));
    let doc = collect(&source, &["A".to_string()], run_start())
        .await
        .unwrap();

    let record = &doc.week[0];
    let raw = &three_posts("A")[0];
    assert_eq!(split_comments(&record.comments), flatten_replies(&raw.replies));
    assert_eq!(split_comments(&record.comments), vec!["reply to A1", "धन्यवाद friend"]);
    // Upstream total is kept even though the stub's replies are missing.
    assert_eq!(record.comment_counts, 2);
}

#[tokio::test]
async fn written_document_reads_back_identically() {
    let source = CannedSource::new(HashMap::from([
        ("A".to_string(), three_posts("A")),
        ("B".to_string(), three_posts("B")),
    ]));
    let path = temp_path();

    let written = run(&source, &catalog(), &path, run_start()).await.unwrap();
    let back = read_document(&path).await.unwrap();

    assert_eq!(back, written);
    assert_eq!(back.month.len(), 6);
    assert_eq!(back.month[0].body, "body of A1 नेपाली पाठ");

    let text = tokio::fs::read_to_string(&path).await.unwrap();
    assert!(text.contains("नेपाली पाठ"));
    assert!(text.contains("\"14_days\""));

    tokio::fs::remove_file(&path).await.ok();
}

#[tokio::test]
async fn upstream_failure_leaves_previous_document_untouched() {
    // A succeeds for every timeframe (including week), then B's day query fails.
    let source = CannedSource::new(HashMap::from([
        ("A".to_string(), three_posts("A")),
        ("B".to_string(), three_posts("B")),
    ]))
    .failing_on("B", SortMode::Hot);

    let path = temp_path();
    let previous = "{\"day\": [], \"week\": [], \"14_days\": [], \"month\": []}";
    tokio::fs::write(&path, previous).await.unwrap();

    let err = run(&source, &catalog(), &path, run_start()).await.unwrap_err();
    match err {
        CoreError::UpstreamUnavailable { subreddit, reason } => {
            assert_eq!(subreddit, "B");
            assert!(reason.contains("503"));
        }
        other => panic!("Expected UpstreamUnavailable, got {other:?}"),
    }

    // Nothing after the failing call was attempted.
    assert_eq!(source.calls.borrow().len(), 5);
    assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), previous);

    tokio::fs::remove_file(&path).await.ok();
}

#[tokio::test]
async fn failure_without_previous_document_writes_nothing() {
    let source = CannedSource::new(HashMap::new()).failing_on("A", SortMode::Top);
    let path = temp_path();

    assert!(run(&source, &catalog(), &path, run_start()).await.is_err());
    assert!(!path.exists());
}
