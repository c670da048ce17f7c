pub mod api;


use api::RedditApiClient;
use helperbot_core::{
    ConfigError, CoreError, FeedMode, FeedSource, RedditApiError, RedditPost, ReplyDispatcher,
};
use oauth2::basic::BasicClient;
use oauth2::http::header::{HeaderValue, USER_AGENT};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, ResourceOwnerPassword, ResourceOwnerUsername,
    Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Reddit issues script-app tokens for one hour.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Credentials of a Reddit "script" app acting as a single bot account.
#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        user_agent: String,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            username,
            password,
            user_agent,
        }
    }

    /// Reads `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`,
    /// `REDDIT_PASSWORD` and the optional `REDDIT_USER_AGENT`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                    var_name: name.to_string(),
                })
        };

        let client_id = require("REDDIT_CLIENT_ID")?;
        let client_secret = require("REDDIT_CLIENT_SECRET")?;
        let username = require("REDDIT_USERNAME")?;
        let password = require("REDDIT_PASSWORD")?;
        let user_agent = lookup("REDDIT_USER_AGENT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "helperbot/{} by u/{}",
                    env!("CARGO_PKG_VERSION"),
                    username
                )
            });

        Ok(Self::new(
            client_id,
            client_secret,
            username,
            password,
            user_agent,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated { token: RedditToken },
    TokenExpired { token: RedditToken },
}

pub struct RedditClient {
    config: RedditOAuth2Config,
    oauth_client: BasicClient,
    api_client: RedditApiClient,
    auth_state: AuthState,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "auth_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "token_url".to_string(),
                value: e.to_string(),
            }
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        );
        let api_client = RedditApiClient::new(config.user_agent.clone())?;

        Ok(Self {
            config,
            oauth_client,
            api_client,
            auth_state: AuthState::NotAuthenticated,
        })
    }

    pub fn get_required_scopes() -> Vec<&'static str> {
        vec!["identity", "read", "submit"]
    }

    pub fn get_auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&self.auth_state, AuthState::Authenticated { token } if !token.is_expired())
    }

    pub fn needs_refresh(&self) -> bool {
        match &self.auth_state {
            AuthState::TokenExpired { .. } => true,
            AuthState::Authenticated { token } => token.is_expired(),
            AuthState::NotAuthenticated => false,
        }
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.auth_state = if token.is_expired() {
            AuthState::TokenExpired { token }
        } else {
            AuthState::Authenticated { token }
        };
    }

    pub fn api(&self) -> &RedditApiClient {
        &self.api_client
    }

    /// Password grant for the bot account.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        info!("Authenticating with Reddit as u/{}", self.config.username);

        let username = ResourceOwnerUsername::new(self.config.username.clone());
        let password = ResourceOwnerPassword::new(self.config.password.clone());
        let user_agent = self.api().user_agent().to_string();
        let scopes = Self::get_required_scopes()
            .into_iter()
            .map(|scope| Scope::new(scope.to_string()));

        let token_response = self
            .oauth_client
            .exchange_password(&username, &password)
            .add_scopes(scopes)
            .request_async(move |mut request: HttpRequest| async move {
                // Reddit throttles requests without a descriptive user agent
                if let Ok(value) = HeaderValue::from_str(&user_agent) {
                    request.headers.insert(USER_AGENT, value);
                }
                async_http_client(request).await
            })
            .await
            .map_err(|e| {
                error!("Token exchange failed: {}", e);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        let lifetime = token_response
            .expires_in()
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let scope = token_response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        self.set_token(RedditToken {
            access_token: token_response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
            scope,
        });
        debug!("Reddit token valid for {:?}", lifetime);
        Ok(())
    }

    /// Authenticates when there is no usable token.
    pub async fn ensure_authenticated(&mut self) -> Result<(), CoreError> {
        if self.is_authenticated() {
            return Ok(());
        }
        if self.needs_refresh() {
            info!("Reddit token expired, requesting a new one");
        }
        self.authenticate().await
    }

    fn access_token(&self) -> Result<&str, CoreError> {
        match &self.auth_state {
            AuthState::Authenticated { token } if !token.is_expired() => {
                Ok(token.access_token.as_str())
            }
            AuthState::Authenticated { .. } | AuthState::TokenExpired { .. } => {
                Err(CoreError::RedditApi(RedditApiError::InvalidToken))
            }
            AuthState::NotAuthenticated => {
                Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: "Not authenticated with Reddit".to_string(),
                }))
            }
        }
    }
}

impl FeedSource for RedditClient {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        mode: FeedMode,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        let access_token = self.access_token()?;
        let listing = self
            .api_client
            .get_subreddit_posts(access_token, subreddit, mode, limit)
            .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect())
    }
}

impl ReplyDispatcher for RedditClient {
    async fn reply(&self, post: &RedditPost, text: &str) -> Result<(), CoreError> {
        let access_token = self.access_token()?;
        self.api_client
            .submit_comment(access_token, &post.fullname(), text)
            .await?;
        Ok(())
    }
}
