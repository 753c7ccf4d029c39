//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Site identity and content layout
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Per-run batching and pacing
    #[serde(default)]
    pub run: RunConfig,

    /// Post composition settings
    #[serde(default)]
    pub compose: ComposeConfig,

    /// Idempotence ledger endpoint
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Optional generative text enhancement
    #[serde(default)]
    pub enhancer: EnhancerConfig,

    /// Publisher endpoints and media limits
    #[serde(default)]
    pub publisher: PublisherConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if url::Url::parse(&self.site.origin).is_err() {
            return Err(AppError::validation("site.origin is not a valid URL"));
        }
        if self.site.content_dir.trim().is_empty() {
            return Err(AppError::validation("site.content_dir is empty"));
        }
        if !self.site.article_ext.starts_with('.') {
            return Err(AppError::validation(
                "site.article_ext must start with a dot",
            ));
        }
        if self.run.max_articles_per_run == 0 {
            return Err(AppError::validation("run.max_articles_per_run must be > 0"));
        }
        if self.compose.max_post_length == 0 {
            return Err(AppError::validation("compose.max_post_length must be > 0"));
        }
        if !self.compose.brand_hashtag.starts_with('#') {
            return Err(AppError::validation(
                "compose.brand_hashtag must start with '#'",
            ));
        }
        Ok(())
    }
}

/// Site identity and content store layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public origin the canonical article URLs are built from
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// Repository-relative directory holding article documents
    #[serde(default = "defaults::content_dir")]
    pub content_dir: String,

    /// Document extension articles must carry
    #[serde(default = "defaults::article_ext")]
    pub article_ext: String,

    /// Local root the article paths are resolved against
    #[serde(default = "defaults::content_root")]
    pub content_root: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: defaults::origin(),
            content_dir: defaults::content_dir(),
            article_ext: defaults::article_ext(),
            content_root: defaults::content_root(),
        }
    }
}

/// HTTP client settings shared by all outbound calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Per-run batching and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum candidates processed per run
    #[serde(default = "defaults::max_articles_per_run")]
    pub max_articles_per_run: usize,

    /// Pause between consecutive posts in seconds
    #[serde(default = "defaults::pause_between_posts")]
    pub pause_between_posts_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_articles_per_run: defaults::max_articles_per_run(),
            pause_between_posts_secs: defaults::pause_between_posts(),
        }
    }
}

/// Post composition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Hard upper bound on composed post length
    #[serde(default = "defaults::max_post_length")]
    pub max_post_length: usize,

    /// Brand hashtag, always placed first
    #[serde(default = "defaults::brand_hashtag")]
    pub brand_hashtag: String,

    /// Append fixed UTM tracking parameters to canonical URLs
    #[serde(default)]
    pub utm_enabled: bool,

    /// Minimum length for a title word to yield a hashtag
    #[serde(default = "defaults::min_hashtag_word_len")]
    pub min_hashtag_word_len: usize,

    /// Title words that never become hashtags
    #[serde(default = "defaults::stopwords")]
    pub stopwords: Vec<String>,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_post_length: defaults::max_post_length(),
            brand_hashtag: defaults::brand_hashtag(),
            utm_enabled: false,
            min_hashtag_word_len: defaults::min_hashtag_word_len(),
            stopwords: defaults::stopwords(),
        }
    }
}

/// Idempotence ledger endpoint settings.
///
/// The ledger is optional: a missing base URL or token disables duplicate
/// suppression entirely and every candidate is treated as unseen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the key-value store, e.g. `https://blobs.example.net/seen`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Environment variable the access token is read from
    #[serde(default = "defaults::ledger_token_env")]
    pub token_env: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_env: defaults::ledger_token_env(),
        }
    }
}

/// Optional generative text enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancerConfig {
    /// Model identifier
    #[serde(default = "defaults::enhancer_model")]
    pub model: String,

    /// Generation API base endpoint
    #[serde(default = "defaults::enhancer_endpoint")]
    pub endpoint: String,

    /// Environment variable the API key is read from
    #[serde(default = "defaults::enhancer_key_env")]
    pub api_key_env: String,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            model: defaults::enhancer_model(),
            endpoint: defaults::enhancer_endpoint(),
            api_key_env: defaults::enhancer_key_env(),
        }
    }
}

/// Publisher endpoints and media limits.
///
/// Credentials are never part of the TOML file; they are resolved from the
/// environment when the publisher client is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Tweet creation API base (v2)
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Media upload API base (v1.1)
    #[serde(default = "defaults::upload_base")]
    pub upload_base: String,

    /// Largest media payload attached to a post, in bytes
    #[serde(default = "defaults::max_media_bytes")]
    pub max_media_bytes: usize,

    /// Alt text used when the document provides none
    #[serde(default = "defaults::default_alt_text")]
    pub default_alt_text: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            upload_base: defaults::upload_base(),
            max_media_bytes: defaults::max_media_bytes(),
            default_alt_text: defaults::default_alt_text(),
        }
    }
}

mod defaults {
    // Site defaults
    pub fn origin() -> String {
        "https://horizon-libre.net".into()
    }
    pub fn content_dir() -> String {
        "article".into()
    }
    pub fn article_ext() -> String {
        ".html".into()
    }
    pub fn content_root() -> String {
        ".".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "horizon-libre-autopost/1.0".into()
    }
    pub fn timeout() -> u64 {
        15
    }

    // Run defaults
    pub fn max_articles_per_run() -> usize {
        5
    }
    pub fn pause_between_posts() -> u64 {
        10
    }

    // Compose defaults
    pub fn max_post_length() -> usize {
        280
    }
    pub fn brand_hashtag() -> String {
        "#HorizonLibre".into()
    }
    pub fn min_hashtag_word_len() -> usize {
        4
    }
    pub fn stopwords() -> Vec<String> {
        [
            "dans", "pour", "avec", "sans", "vers", "chez", "sur", "les", "des", "une", "nos",
            "vos", "ses", "leur", "leurs", "this", "that", "with", "from", "the", "and",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    // Ledger defaults
    pub fn ledger_token_env() -> String {
        "LEDGER_TOKEN".into()
    }

    // Enhancer defaults
    pub fn enhancer_model() -> String {
        "gemini-1.5-flash".into()
    }
    pub fn enhancer_endpoint() -> String {
        "https://generativelanguage.googleapis.com/v1beta/models".into()
    }
    pub fn enhancer_key_env() -> String {
        "GENAI_API_KEY".into()
    }

    // Publisher defaults
    pub fn api_base() -> String {
        "https://api.twitter.com/2".into()
    }
    pub fn upload_base() -> String {
        "https://upload.twitter.com/1.1".into()
    }
    pub fn max_media_bytes() -> usize {
        5 * 1024 * 1024
    }
    pub fn default_alt_text() -> String {
        "Image from article".into()
    }
}
