use helperbot_core::{
    find_first_match, BotConfig, ConfigError, CoreError, FeedMode, KeywordMatcher,
    KeywordWeights, PatternMatcher, RedditPost, ScorePolicy, SeenPostIds, StoreSettings,
};
use std::path::PathBuf;

fn post(id: &str, title: &str, selftext: &str) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        title: title.to_string(),
        selftext: selftext.to_string(),
        author: "tester".to_string(),
        subreddit: "Kalilinux".to_string(),
        url: format!("https://reddit.com/r/Kalilinux/comments/{}", id),
        score: 1,
        created_utc: 1640995200,
    }
}

fn kali_matcher() -> KeywordMatcher {
    KeywordMatcher::new(
        KeywordWeights::new([("boot", 4), ("kali", 6)]),
        10,
        ScorePolicy::EarlyExit,
    )
}

#[test]
fn test_dual_boot_question_qualifies() {
    let posts = vec![post("a1", "How do I dual-boot Kali and Windows?", "")];
    let found = find_first_match(&posts, &kali_matcher(), &SeenPostIds::new()).unwrap();
    assert_eq!(found.post.id, "a1");
    assert_eq!(found.score, 10);
}

#[test]
fn test_unrelated_question_does_not_qualify() {
    let posts = vec![post("a1", "What's your favorite distro?", "")];
    assert!(find_first_match(&posts, &kali_matcher(), &SeenPostIds::new()).is_none());
}

#[test]
fn test_seen_post_is_never_selected_again() {
    let posts = vec![post("a1", "Kali won't boot", "")];
    let seen: SeenPostIds = ["a1"].into_iter().collect();
    assert!(find_first_match(&posts, &kali_matcher(), &seen).is_none());
}

#[test]
fn test_first_qualifying_post_in_feed_order_wins() {
    let posts = vec![
        post("p1", "Nice wallpaper", ""),
        post("p2", "Kali boot loop", ""),
        post("p3", "Hello", ""),
        post("p4", "Nmap question", ""),
        post("p5", "Kali will not boot from USB", ""),
    ];
    let found = find_first_match(&posts, &kali_matcher(), &SeenPostIds::new()).unwrap();
    assert_eq!(found.post.id, "p2");
}

#[test]
fn test_seen_post_is_skipped_in_favour_of_later_match() {
    let posts = vec![
        post("p1", "Kali boot loop", ""),
        post("p2", "Kali boot fails", ""),
    ];
    let seen: SeenPostIds = ["p1"].into_iter().collect();
    let found = find_first_match(&posts, &kali_matcher(), &seen).unwrap();
    assert_eq!(found.post.id, "p2");
}

#[test]
fn test_title_and_body_are_concatenated_without_separator() {
    // "ka" + "li" only forms the keyword when joined directly
    let posts = vec![post("x", "Help with ka", "li boot")];
    let found = find_first_match(&posts, &kali_matcher(), &SeenPostIds::new());
    assert!(found.is_some());
}

#[test]
fn test_pattern_matcher_shares_dedup_semantics() {
    let posts = vec![
        post("q1", "Wifi adapter not detected", ""),
        post("q2", "WIFI adapter again", ""),
    ];
    let matcher = PatternMatcher::new("wifi adapter").unwrap();
    let seen: SeenPostIds = ["q1"].into_iter().collect();
    let found = find_first_match(&posts, &matcher, &seen).unwrap();
    assert_eq!(found.post.id, "q2");
    assert_eq!(found.score, 1);
}

#[test]
fn test_config_from_toml_overrides_defaults() {
    let toml = r#"
        [reddit]
        subreddit = "linux4noobs"

        [scan]
        mode = "hot"
        batch_size = 25
        threshold = 12
        score_policy = "full_sum"
        reply_template = "Hi {author}"

        [storage]
        backend = "sqlite"
        url = "sqlite://seen.db"
    "#;
    let config = BotConfig::from_toml_str(toml, KeywordWeights::new([("grub", 3)])).unwrap();
    assert_eq!(config.subreddit, "linux4noobs");
    assert_eq!(config.mode, FeedMode::Hot);
    assert_eq!(config.batch_size, 25);
    assert_eq!(config.threshold, 12);
    assert_eq!(config.score_policy, ScorePolicy::FullSum);
    assert_eq!(config.reply_template, "Hi {author}");
    assert_eq!(
        config.store,
        StoreSettings::Sqlite {
            url: "sqlite://seen.db".to_string()
        }
    );
    assert_eq!(config.log_path, PathBuf::from("log.txt"));
}

#[test]
fn test_empty_config_uses_stock_settings() {
    let config = BotConfig::from_toml_str("", KeywordWeights::default()).unwrap();
    assert_eq!(config.subreddit, "Kalilinux");
    assert_eq!(config.mode, FeedMode::New);
    assert_eq!(config.batch_size, 10);
    assert_eq!(config.threshold, 10);
    assert_eq!(config.score_policy, ScorePolicy::EarlyExit);
    assert_eq!(
        config.store,
        StoreSettings::Json {
            path: PathBuf::from("config.json")
        }
    );
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let result = BotConfig::from_toml_str("[scan]\nbatch_size = 0\n", KeywordWeights::default());
    assert!(matches!(
        result,
        Err(CoreError::Config(ConfigError::InvalidValue { .. }))
    ));
}

#[test]
fn test_config_mode_is_case_insensitive() {
    let config =
        BotConfig::from_toml_str("[scan]\nmode = \"New\"\n", KeywordWeights::default()).unwrap();
    assert_eq!(config.mode, FeedMode::New);

    let config =
        BotConfig::from_toml_str("[scan]\nmode = \"HOT\"\n", KeywordWeights::default()).unwrap();
    assert_eq!(config.mode, FeedMode::Hot);

    let result =
        BotConfig::from_toml_str("[scan]\nmode = \"top\"\n", KeywordWeights::default());
    assert!(matches!(
        result,
        Err(CoreError::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn test_non_positive_threshold_is_rejected() {
    for threshold in ["0", "-3"] {
        let toml = format!("[scan]\nthreshold = {}\n", threshold);
        let result = BotConfig::from_toml_str(&toml, KeywordWeights::default());
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::InvalidValue { ref field, .. }))
                if field == "scan.threshold"
        ));
    }
}

#[test]
fn test_feed_mode_parsing() {
    assert_eq!("New".parse::<FeedMode>().unwrap(), FeedMode::New);
    assert_eq!("hot".parse::<FeedMode>().unwrap(), FeedMode::Hot);
    assert!("top".parse::<FeedMode>().is_err());
}

fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "test_helperbot_{}.{}",
        uuid::Uuid::new_v4(),
        extension
    ))
}

#[test]
fn test_load_reads_settings_and_keyword_table() {
    let keywords = temp_path("json");
    std::fs::write(&keywords, r#"{"text_values": {"wifi": 5, "adapter": 5}}"#).unwrap();
    let settings = temp_path("toml");
    std::fs::write(
        &settings,
        format!(
            "[reddit]\nsubreddit = \"HowToHack\"\n\n[scan]\nkeywords_path = {:?}\n",
            keywords.display().to_string()
        ),
    )
    .unwrap();

    let config = BotConfig::load(&settings).unwrap();
    assert_eq!(config.subreddit, "HowToHack");
    assert_eq!(config.keyword_weights.len(), 2);
    assert_eq!(config.keyword_weights.score("WiFi adapter help"), 10);
}

#[test]
fn test_load_settings_skips_keyword_table() {
    let missing = temp_path("toml");
    let config = BotConfig::load_settings(&missing).unwrap();
    assert!(config.keyword_weights.is_empty());
    assert_eq!(config.batch_size, 10);
}

#[test]
fn test_missing_keyword_table_is_reported() {
    let settings = temp_path("toml");
    std::fs::write(
        &settings,
        format!(
            "[scan]\nkeywords_path = {:?}\n",
            temp_path("json").display().to_string()
        ),
    )
    .unwrap();

    assert!(matches!(
        BotConfig::load(&settings),
        Err(CoreError::Config(ConfigError::FileNotFound { .. }))
    ));
}
