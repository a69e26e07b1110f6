use chrono::{DateTime, Utc};
use digest_core::RawPost;

/// Keeps a post iff it was created at or after `cutoff`.
pub fn passes_cutoff(post: &RawPost, cutoff: DateTime<Utc>) -> bool {
    post.created_utc >= cutoff
}

/// Drops posts older than `cutoff` without error; a `None` cutoff keeps
/// everything.
pub fn apply_cutoff<I>(posts: I, cutoff: Option<DateTime<Utc>>) -> impl Iterator<Item = RawPost>
where
    I: Iterator<Item = RawPost>,
{
    posts.filter(move |post| cutoff.map_or(true, |cutoff| passes_cutoff(post, cutoff)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn post_at(created_utc: DateTime<Utc>) -> RawPost {
        RawPost {
            title: "t".to_string(),
            selftext: String::new(),
            score: 1,
            created_utc,
            num_comments: 0,
            replies: Vec::new(),
            permalink: "/r/a/comments/x/".to_string(),
        }
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert!(passes_cutoff(&post_at(cutoff), cutoff));
        assert!(!passes_cutoff(&post_at(cutoff - Duration::seconds(1)), cutoff));
        assert!(passes_cutoff(&post_at(cutoff + Duration::days(3)), cutoff));
    }

    #[test]
    fn test_apply_keeps_order_and_drops_old() {
        let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let posts = vec![
            post_at(cutoff + Duration::days(2)),
            post_at(cutoff - Duration::days(5)),
            post_at(cutoff + Duration::hours(1)),
        ];

        let kept: Vec<RawPost> = apply_cutoff(posts.clone().into_iter(), Some(cutoff)).collect();
        assert_eq!(kept, vec![posts[0].clone(), posts[2].clone()]);

        let all: Vec<RawPost> = apply_cutoff(posts.clone().into_iter(), None).collect();
        assert_eq!(all, posts);
    }
}
