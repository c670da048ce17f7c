//! Dedup gate: decides which post, if any, gets the one reply of a scan.

use crate::matcher::PostMatcher;
use crate::types::RedditPost;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Record name the seen-set is persisted under.
pub const SEEN_POSTS_KEY: &str = "Post_IDs";

/// IDs of posts already replied to, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenPostIds {
    ids: Vec<String>,
}

impl SeenPostIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.ids.iter().any(|id| id == post_id)
    }

    /// Appends `post_id` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, post_id: impl Into<String>) -> bool {
        let post_id = post_id.into();
        if self.contains(&post_id) {
            return false;
        }
        self.ids.push(post_id);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }
}

impl<S: Into<String>> FromIterator<S> for SeenPostIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = Self::new();
        for id in iter {
            seen.insert(id);
        }
        seen
    }
}

pub fn should_reply(post_id: &str, score: i64, threshold: i64, seen: &SeenPostIds) -> bool {
    !seen.contains(post_id) && score >= threshold
}

/// A post selected for a reply, with the score that qualified it.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub post: &'a RedditPost,
    pub score: i64,
}

/// Returns the first post in feed order that is not yet seen and scores at
/// least the matcher's threshold. Seen posts are skipped without scoring and
/// nothing after the first hit is examined.
pub fn find_first_match<'a, M>(
    posts: &'a [RedditPost],
    matcher: &M,
    seen: &SeenPostIds,
) -> Option<Match<'a>>
where
    M: PostMatcher + ?Sized,
{
    let threshold = matcher.threshold();
    for post in posts {
        if seen.contains(&post.id) {
            debug!("Skipping already handled post {}", post.id);
            continue;
        }
        let score = matcher.score(&post.combined_text());
        if should_reply(&post.id, score, threshold, seen) {
            debug!("{} has a score of {}", post.title, score);
            return Some(Match { post, score });
        }
    }
    None
}
