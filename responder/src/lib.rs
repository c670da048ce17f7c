//! Scan runner.
//!
//! One scan fetches a batch of posts, replies to at most one of them and
//! persists the seen-set whatever the outcome. Reply failures are recorded,
//! not propagated; feed and store failures are returned to the caller.

pub mod run_log;


use helperbot_core::{
    find_first_match, BotConfig, CoreError, ErrorExt, FeedMode, FeedSource, KeywordMatcher,
    PatternMatcher, PostMatcher, RedditPost, ReplyDispatcher, SeenPostIds, SeenPostStore,
};
use run_log::{RunLog, RunLogEntry};
use tracing::{error, info, warn};

/// Result of one scan.
#[derive(Debug)]
pub enum ScanOutcome {
    Replied {
        post_id: String,
        title: String,
        score: i64,
    },
    Failed {
        post_id: String,
        error: CoreError,
    },
    NoMatch,
}

impl ScanOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScanOutcome::Failed { .. })
    }
}

/// Fills `{author}` and `{title}` in a reply template.
pub fn render_reply(template: &str, post: &RedditPost) -> String {
    template
        .replace("{author}", &post.author)
        .replace("{title}", &post.title)
}

/// Fetches posts for display only. Needs no seen-set store and writes no
/// run log.
pub async fn read_feed<F: FeedSource>(
    feed: &F,
    subreddit: &str,
    mode: FeedMode,
    limit: u32,
) -> Result<Vec<RedditPost>, CoreError> {
    let posts = feed.fetch_posts(subreddit, mode, limit).await?;
    info!("Read {} {} posts from r/{}", posts.len(), mode, subreddit);
    Ok(posts)
}

/// Runs scans with one client, used both as the feed source and the reply
/// dispatcher, and one seen-set store.
pub struct Responder<C, S> {
    client: C,
    store: S,
    config: BotConfig,
    run_log: RunLog,
    seen: SeenPostIds,
}

impl<C, S> Responder<C, S>
where
    C: FeedSource + ReplyDispatcher,
    S: SeenPostStore,
{
    /// Reads the seen-set once; it is written back after every scan.
    pub async fn load(client: C, store: S, config: BotConfig) -> Result<Self, CoreError> {
        let seen = store.load().await?;
        let run_log = RunLog::new(config.log_path.clone());
        info!(
            "Responder ready for r/{} with {} keywords and {} seen posts",
            config.subreddit,
            config.keyword_weights.len(),
            seen.len()
        );
        Ok(Self {
            client,
            store,
            config,
            run_log,
            seen,
        })
    }

    pub fn seen(&self) -> &SeenPostIds {
        &self.seen
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn keyword_matcher(&self) -> KeywordMatcher {
        KeywordMatcher::new(
            self.config.keyword_weights.clone(),
            self.config.threshold,
            self.config.score_policy,
        )
    }

    /// Weighted keyword scan of the configured subreddit.
    pub async fn keyword_scan(
        &mut self,
        mode: FeedMode,
        limit: u32,
    ) -> Result<ScanOutcome, CoreError> {
        let matcher = self.keyword_matcher();
        let subreddit = self.config.subreddit.clone();
        let template = self.config.reply_template.clone();
        self.scan(&subreddit, mode, limit, &matcher, |post| {
            render_reply(&template, post)
        })
        .await
    }

    /// Replies `reply_text` to the first unseen post whose title and body
    /// match `pattern`, ignoring case.
    pub async fn pattern_scan(
        &mut self,
        subreddit: &str,
        pattern: &str,
        reply_text: &str,
        mode: FeedMode,
        limit: u32,
    ) -> Result<ScanOutcome, CoreError> {
        let matcher = PatternMatcher::new(pattern)?;
        self.scan(subreddit, mode, limit, &matcher, |post| {
            render_reply(reply_text, post)
        })
        .await
    }

    pub async fn scan<M, R>(
        &mut self,
        subreddit: &str,
        mode: FeedMode,
        limit: u32,
        matcher: &M,
        reply_for: R,
    ) -> Result<ScanOutcome, CoreError>
    where
        M: PostMatcher + ?Sized,
        R: Fn(&RedditPost) -> String,
    {
        let posts = self.client.fetch_posts(subreddit, mode, limit).await?;
        info!(
            "Scanning {} {} posts from r/{}",
            posts.len(),
            mode,
            subreddit
        );

        let Some(found) = find_first_match(&posts, matcher, &self.seen) else {
            info!("No results found.");
            self.append_log(RunLogEntry::NoMatch {
                detail: matcher.miss_description(),
            })
            .await;
            self.store.save(&self.seen).await?;
            return Ok(ScanOutcome::NoMatch);
        };

        let post = found.post;
        info!("{} has a score of {}", post.title, found.score);
        let text = reply_for(post);

        let outcome = match self.client.reply(post, &text).await {
            Ok(()) => {
                info!("Bot replying to: {}", post.title);
                self.seen.insert(post.id.clone());
                self.append_log(RunLogEntry::Success {
                    title: post.title.clone(),
                })
                .await;
                ScanOutcome::Replied {
                    post_id: post.id.clone(),
                    title: post.title.clone(),
                    score: found.score,
                }
            }
            Err(e) => {
                error!("Bot Failed! Reply to {} failed: {}", post.id, e);
                self.append_log(RunLogEntry::Failure {
                    error: e.to_string(),
                })
                .await;
                ScanOutcome::Failed {
                    post_id: post.id.clone(),
                    error: e,
                }
            }
        };

        self.store.save(&self.seen).await?;
        Ok(outcome)
    }

    async fn append_log(&self, entry: RunLogEntry) {
        match self.run_log.record(&entry).await {
            Ok(()) => info!("See {} for details.", self.run_log.path().display()),
            Err(e) => {
                e.log_warn();
                warn!(
                    "Could not write '{}' to {}",
                    entry.headline(),
                    self.run_log.path().display()
                );
            }
        }
    }
}
