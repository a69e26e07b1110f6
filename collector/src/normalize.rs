use crate::flatten::{collapse_newlines, flatten_replies, join_comments, split_comments};
use digest_core::{timefmt, CoreError, PostRecord, RawPost, ReplyNode, REDDIT_ORIGIN};

/// Builds the persisted record. `comment_counts` is the upstream total and
/// is never reconciled with `comments`.
pub fn normalize_post(subreddit: &str, post: &RawPost, comments: &[String]) -> PostRecord {
    PostRecord {
        subreddit: subreddit.to_string(),
        heading: post.title.clone(),
        body: collapse_newlines(&post.selftext),
        upvotes: post.score,
        time_posted: timefmt::format_minute(post.created_utc),
        comment_counts: post.num_comments,
        comments: join_comments(comments),
        url: canonical_url(&post.permalink),
    }
}

/// Flattens the post's own reply tree and normalizes in one step.
pub fn build_record(subreddit: &str, post: &RawPost) -> PostRecord {
    normalize_post(subreddit, post, &flatten_replies(&post.replies))
}

pub fn canonical_url(permalink: &str) -> String {
    if permalink.starts_with('/') {
        format!("{REDDIT_ORIGIN}{permalink}")
    } else {
        format!("{REDDIT_ORIGIN}/{permalink}")
    }
}

/// Reads a stored record back as raw input. Comments come back as
/// childless replies, one per delimiter-separated piece.
pub fn record_to_raw(record: &PostRecord) -> Result<RawPost, CoreError> {
    let permalink = record
        .url
        .strip_prefix(REDDIT_ORIGIN)
        .filter(|path| path.starts_with('/'))
        .ok_or_else(|| {
            CoreError::malformed("url", format!("{:?} is not a Reddit link", record.url))
        })?;

    Ok(RawPost {
        title: record.heading.clone(),
        selftext: record.body.clone(),
        score: record.upvotes,
        created_utc: timefmt::parse_minute(&record.time_posted)?,
        num_comments: record.comment_counts,
        replies: split_comments(&record.comments)
            .into_iter()
            .map(ReplyNode::reply)
            .collect(),
        permalink: permalink.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw_post() -> RawPost {
        RawPost {
            title: "Load shedding schedule?".to_string(),
            selftext: "  Anyone know\nthe new times?\n".to_string(),
            score: -3,
            created_utc: Utc.with_ymd_and_hms(2024, 5, 20, 14, 7, 42).unwrap(),
            num_comments: 12,
            replies: vec![
                ReplyNode::reply_with_children(
                    "Check the NEA site",
                    vec![ReplyNode::Continuation { count: 8 }],
                ),
                ReplyNode::reply("same\nquestion"),
            ],
            permalink: "/r/Nepal/comments/1abc/load_shedding_schedule/".to_string(),
        }
    }

    #[test]
    fn test_record_fields() {
        let record = build_record("Nepal", &raw_post());
        assert_eq!(record.subreddit, "Nepal");
        assert_eq!(record.heading, "Load shedding schedule?");
        assert_eq!(record.body, "Anyone know the new times?");
        assert_eq!(record.upvotes, -3);
        assert_eq!(record.time_posted, "2024-05-20 14:07");
        assert_eq!(record.comments, "Check the NEA site|||same question");
        assert_eq!(
            record.url,
            "https://www.reddit.com/r/Nepal/comments/1abc/load_shedding_schedule/"
        );
    }

    #[test]
    fn test_comment_count_is_not_recomputed() {
        let record = build_record("Nepal", &raw_post());
        assert_eq!(record.comment_counts, 12);
        assert_eq!(split_comments(&record.comments).len(), 2);
    }

    #[test]
    fn test_empty_post() {
        let mut post = raw_post();
        post.selftext = String::new();
        post.replies = Vec::new();
        let record = build_record("Nepal", &post);
        assert_eq!(record.body, "");
        assert_eq!(record.comments, "");
    }

    #[test]
    fn test_url_without_leading_slash() {
        assert_eq!(
            canonical_url("r/a/comments/b/"),
            "https://www.reddit.com/r/a/comments/b/"
        );
    }

    #[test]
    fn test_renormalization_is_noop() {
        let record = build_record("Nepal", &raw_post());
        let again = record_to_raw(&record).unwrap();
        assert_eq!(build_record(&record.subreddit, &again), record);
    }

    #[test]
    fn test_renormalization_without_comments() {
        let mut post = raw_post();
        post.replies = vec![ReplyNode::Continuation { count: 2 }];
        let record = build_record("technepal", &post);
        let again = record_to_raw(&record).unwrap();
        assert!(again.replies.is_empty());
        assert_eq!(build_record("technepal", &again), record);
    }

    #[test]
    fn test_foreign_url_is_malformed() {
        let mut record = build_record("Nepal", &raw_post());
        record.url = "https://example.com/x".to_string();
        assert!(matches!(
            record_to_raw(&record),
            Err(CoreError::MalformedRecord { ref field, .. }) if field == "url"
        ));
    }
}
