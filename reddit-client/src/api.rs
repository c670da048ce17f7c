use helperbot_core::{CoreError, FeedMode, RedditApiError, RedditPost};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub id: String,
    pub name: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub url: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i32,
    pub num_comments: u32,
    pub over_18: bool,
    pub stickied: bool,
    pub locked: bool,
    pub is_self: bool,
}

/// Body of a `POST /api/comment` response with `api_type=json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentResponse {
    pub json: CommentResponseBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentResponseBody {
    #[serde(default)]
    pub errors: Vec<Vec<serde_json::Value>>,
    pub data: Option<CommentResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentResponseData {
    #[serde(default)]
    pub things: Vec<RedditListingChild<CommentThing>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThing {
    pub id: String,
    pub name: String,
}

impl CommentResponse {
    /// The first entry of `json.errors`, as `[code, message, field]`.
    pub fn rejection(&self) -> Option<RedditApiError> {
        let first = self.json.errors.first()?;
        let text_at = |i: usize| {
            first
                .get(i)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Some(RedditApiError::CommentRejected {
            code: text_at(0),
            message: text_at(1),
        })
    }

    pub fn comment_name(&self) -> Option<&str> {
        self.json
            .data
            .as_ref()
            .and_then(|data| data.things.first())
            .map(|thing| thing.data.name.as_str())
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
        form_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);
        let start_time = Instant::now();

        // Build request
        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(params) = form_params {
            request_builder = request_builder.form(params);
        }

        // Execute request
        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        debug!(
            "Reddit responded {} for {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );
        if status.is_success() {
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok());
        let api_error = api_error_for_status(status, retry_after, endpoint);
        if let RedditApiError::RateLimitExceeded { retry_after } = &api_error {
            warn!("Rate limited, retry after {} seconds", retry_after);
        }
        Err(CoreError::RedditApi(api_error))
    }

    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        mode: FeedMode,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/{}", subreddit, mode.as_str());
        let limit = limit.to_string();
        let params = [("raw_json", "1"), ("limit", limit.as_str())];

        let response = self
            .make_request(Method::GET, &endpoint, access_token, Some(&params[..]), None)
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} {} posts from r/{}",
            listing.data.children.len(),
            mode,
            subreddit
        );
        Ok(listing)
    }

    /// Replies to `thing_id` (a fullname such as `t3_abc123`). Returns the
    /// fullname of the new comment when Reddit reports it.
    pub async fn submit_comment(
        &self,
        access_token: &str,
        thing_id: &str,
        text: &str,
    ) -> Result<Option<String>, CoreError> {
        let form = [("api_type", "json"), ("thing_id", thing_id), ("text", text)];
        let response = self
            .make_request(
                Method::POST,
                "/api/comment",
                access_token,
                None,
                Some(&form[..]),
            )
            .await?;

        let body: CommentResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comment response for {}", thing_id),
            })
        })?;

        if let Some(rejection) = body.rejection() {
            warn!("Reddit rejected comment on {}: {}", thing_id, rejection);
            return Err(CoreError::RedditApi(rejection));
        }

        let name = body.comment_name().map(str::to_string);
        info!(
            "Posted comment {} on {}",
            name.as_deref().unwrap_or("<unknown>"),
            thing_id
        );
        Ok(name)
    }
}

/// Maps a non-success status to an API error. `retry_after` is the raw
/// `Retry-After` header; Reddit may send fractional seconds, and a missing or
/// unreadable value means 60.
pub fn api_error_for_status(
    status: StatusCode,
    retry_after: Option<&str>,
    endpoint: &str,
) -> RedditApiError {
    match status.as_u16() {
        429 => {
            let retry_after = retry_after
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
                .map(|seconds| seconds.ceil() as u64)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => match subreddit_of(endpoint) {
            Some(subreddit) => RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            },
            None => RedditApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            },
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}

fn subreddit_of(endpoint: &str) -> Option<&str> {
    endpoint
        .strip_prefix("/r/")
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty())
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            selftext: post_data.selftext,
            author: post_data.author,
            subreddit: post_data.subreddit,
            url: post_data.url,
            score: post_data.score,
            created_utc: post_data.created_utc as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_client_creation() {
        let client = RedditApiClient::new("test-user-agent/1.0".to_string()).unwrap();
        assert_eq!(client.user_agent(), "test-user-agent/1.0");
    }

    #[test]
    fn test_subreddit_of_endpoint() {
        assert_eq!(subreddit_of("/r/Kalilinux/new"), Some("Kalilinux"));
        assert_eq!(subreddit_of("/api/comment"), None);
    }

    #[test]
    fn test_reddit_post_conversion() {
        let post_data = RedditPostData {
            id: "test123".to_string(),
            name: "t3_test123".to_string(),
            title: "Test Post".to_string(),
            selftext: "This is test content".to_string(),
            author: "test_user".to_string(),
            subreddit: "test".to_string(),
            url: "https://reddit.com/r/test/comments/test123".to_string(),
            permalink: "/r/test/comments/test123".to_string(),
            created_utc: 1640995200.0,
            score: 42,
            num_comments: 5,
            is_self: true,
            ..Default::default()
        };

        let reddit_post: RedditPost = post_data.into();
        assert_eq!(reddit_post.id, "test123");
        assert_eq!(reddit_post.title, "Test Post");
        assert_eq!(reddit_post.selftext, "This is test content");
        assert_eq!(reddit_post.author, "test_user");
        assert_eq!(reddit_post.created_utc, 1640995200);
    }
}
