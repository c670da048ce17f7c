use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use database::SeenStore;
use helperbot_core::{BotConfig, CoreError, ErrorExt, ErrorReporter, FeedMode};
use reddit_client::{RedditClient, RedditOAuth2Config};
use responder::{read_feed, Responder, ScanOutcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "helperbot=info,responder=info,reddit_client=info,database=info";

/// Helperbot: answers newcomer questions on Reddit.
///
/// Scans a subreddit feed, replies once to the first unseen post that looks
/// like a request for help and remembers it so it is never answered twice.
#[derive(Parser)]
#[command(name = "helperbot", version, about)]
struct Cli {
    /// Settings file; a missing file means built-in defaults
    #[arg(long, global = true, default_value = "helperbot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Keyword scan of the configured subreddit (the default)
    Scan {
        /// Feed ordering, `hot` or `new` (default: from settings)
        #[arg(long)]
        mode: Option<FeedMode>,

        /// Number of posts to inspect (default: from settings)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: Option<u32>,
    },

    /// Reply a fixed text to the first unseen post matching a pattern
    Search {
        #[arg(long)]
        subreddit: String,

        /// Case-insensitive regular expression tried against title and body
        #[arg(long)]
        pattern: String,

        /// Reply body; `{author}` and `{title}` are substituted
        #[arg(long)]
        reply: String,

        #[arg(long, default_value = "hot")]
        mode: FeedMode,

        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
    },

    /// Print the title, text and score of posts in a subreddit
    Read {
        #[arg(long)]
        subreddit: String,

        #[arg(long, default_value = "hot")]
        mode: FeedMode,

        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
        limit: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<CoreError>() {
                Some(core) => {
                    ErrorReporter::new().report_error(core);
                    eprintln!("{}", core.user_friendly_message());
                }
                None => error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when a reply was attempted and failed.
async fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        None => scan(&cli.config, None, None).await,
        Some(Commands::Scan { mode, limit }) => scan(&cli.config, mode, limit).await,
        Some(Commands::Search {
            subreddit,
            pattern,
            reply,
            mode,
            limit,
        }) => {
            let config = BotConfig::load_settings(&cli.config)?;
            let mut responder = connect(config).await?;
            let outcome = responder
                .pattern_scan(&subreddit, &pattern, &reply, mode, limit)
                .await?;
            Ok(report(&outcome))
        }
        Some(Commands::Read {
            subreddit,
            mode,
            limit,
        }) => {
            let client = login().await?;
            let posts = read_feed(&client, &subreddit, mode, limit).await?;
            for post in &posts {
                println!("Title: {}", post.title);
                println!("Text: {}", post.selftext);
                println!("Score: {}", post.score);
                println!("---------------------------------");
            }
            Ok(true)
        }
    }
}

async fn scan(config_path: &Path, mode: Option<FeedMode>, limit: Option<u32>) -> Result<bool> {
    let config = BotConfig::load(config_path)?;
    let mode = mode.unwrap_or(config.mode);
    let limit = limit.unwrap_or(config.batch_size);

    let mut responder = connect(config).await?;
    let outcome = responder.keyword_scan(mode, limit).await?;
    Ok(report(&outcome))
}

async fn login() -> Result<RedditClient> {
    let oauth = RedditOAuth2Config::from_env()?;
    let mut client = RedditClient::new(oauth)?;
    client
        .ensure_authenticated()
        .await
        .context("Reddit login failed")?;
    Ok(client)
}

async fn connect(config: BotConfig) -> Result<Responder<RedditClient, SeenStore>> {
    let client = login().await?;
    let store = SeenStore::open(&config.store).await?;
    Ok(Responder::load(client, store, config).await?)
}

fn report(outcome: &ScanOutcome) -> bool {
    match outcome {
        ScanOutcome::Replied { title, score, .. } => {
            info!("Replied to \"{}\" (score {})", title, score);
        }
        ScanOutcome::NoMatch => info!("Nothing to reply to this run"),
        ScanOutcome::Failed { post_id, error } => {
            error.log_error();
            error!("Reply to {} was not posted", post_id);
        }
    }
    !outcome.is_failure()
}
