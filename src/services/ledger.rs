// src/services/ledger.rs

//! Idempotent publication ledger.
//!
//! A remote key-value store remembers which articles were already posted.
//! The ledger is deliberately fail-open: when it is unconfigured or
//! unreachable, every candidate reads as unseen — a possible duplicate post
//! is preferred over silently dropping a real new article. Writes are
//! best-effort and never fail the run.

use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::models::LedgerConfig;

/// Header carrying the ledger access token.
const TOKEN_HEADER: &str = "X-Ledger-Token";

/// Compute the publication key for an article path.
///
/// Case- and whitespace-normalized so the same article always maps to the
/// same key regardless of how the path was spelled upstream.
pub fn publication_key(path: &str) -> String {
    let normalized = path.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Duplicate-suppression store keyed by publication key.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// True only when the store explicitly confirms the key exists.
    async fn has(&self, key: &str) -> bool;

    /// Best-effort marker write; never fails the caller.
    async fn mark(&self, key: &str);
}

/// HTTP-backed ledger implementation.
///
/// `GET {base}/{key}` → 200 means seen; `PUT {base}/{key}` marks. Missing
/// configuration disables the ledger entirely.
pub struct HttpLedger {
    client: Client,
    base_url: Option<String>,
    token: Option<String>,
}

impl HttpLedger {
    pub fn new(client: Client, base_url: Option<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Build from configuration; the token comes from the environment.
    pub fn from_config(config: &LedgerConfig, client: Client) -> Self {
        let token = std::env::var(&config.token_env).ok();
        if config.base_url.is_some() && token.is_none() {
            log::warn!(
                "Ledger base URL configured but {} is not set; duplicate suppression disabled",
                config.token_env
            );
        }
        Self::new(client, config.base_url.clone(), token)
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some() && self.token.is_some()
    }

    /// Endpoint for a key, None while the ledger is disabled.
    fn endpoint(&self, key: &str) -> Option<(String, &str)> {
        let base = self.base_url.as_deref()?;
        let token = self.token.as_deref()?;
        Some((format!("{}/{}", base.trim_end_matches('/'), key), token))
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn has(&self, key: &str) -> bool {
        let Some((url, token)) = self.endpoint(key) else {
            return false;
        };

        match self.client.get(&url).header(TOKEN_HEADER, token).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                log::warn!("Ledger check failed for {key}: {e}");
                false
            }
        }
    }

    async fn mark(&self, key: &str) {
        let Some((url, token)) = self.endpoint(key) else {
            return;
        };

        match self
            .client
            .put(&url)
            .header(TOKEN_HEADER, token)
            .body("1")
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                log::warn!("Ledger mark for {key} returned {}", response.status());
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Ledger mark failed for {key}: {e}");
            }
        }
    }
}
