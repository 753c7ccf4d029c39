// src/services/enhance.rs

//! Optional generative text enhancement.
//!
//! The composer asks an enhancer, when one is configured, for a nicer
//! rendition of the baseline post. Enhancement is strictly best-effort:
//! any error, or the absence of an enhancer altogether, leaves the
//! deterministic baseline in charge.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::EnhancerConfig;

/// Capability interface for post text enhancement.
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    /// Produce a rewritten post for the given prompt.
    async fn rewrite(&self, prompt: &str) -> Result<String>;
}

/// Enhancer backed by a hosted generation API.
pub struct GenAiEnhancer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GenAiEnhancer {
    /// Build from configuration; returns None when no API key is present,
    /// which disables the enhancement path entirely.
    pub fn from_config(config: &EnhancerConfig, client: Client) -> Option<Self> {
        let api_key = std::env::var(&config.api_key_env).ok()?;
        Some(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextEnhancer for GenAiEnhancer {
    async fn rewrite(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::generation(format!(
                "generation endpoint returned {status}"
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AppError::generation("empty generation response"));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_not_a_panic() {
        let enhancer = GenAiEnhancer {
            client: Client::new(),
            endpoint: "http://127.0.0.1:9".into(),
            model: "test-model".into(),
            api_key: "key".into(),
        };
        assert!(enhancer.rewrite("prompt").await.is_err());
    }
}
