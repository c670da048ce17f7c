use crate::error::CoreError;
use crate::gate::SeenPostIds;
use crate::types::{FeedMode, RedditPost};

/// Supplies an ordered, size-limited batch of posts from a subreddit.
pub trait FeedSource {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        mode: FeedMode,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError>;
}

/// Posts a reply comment on a post.
pub trait ReplyDispatcher {
    async fn reply(&self, post: &RedditPost, text: &str) -> Result<(), CoreError>;
}

/// Durable home of the seen-set. A store that has never been written loads as empty.
pub trait SeenPostStore {
    async fn load(&self) -> Result<SeenPostIds, CoreError>;

    async fn save(&self, seen: &SeenPostIds) -> Result<(), CoreError>;
}
