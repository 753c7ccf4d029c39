// src/services/publish.rs

//! Publisher for the X posting API.
//!
//! Media upload goes through the v1.1 endpoint, alt text through the
//! media metadata endpoint (best-effort), and the post itself through the
//! v2 tweet creation endpoint. Every request is signed with OAuth 1.0a.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{PostContent, PostId, PreparedMedia, PublisherConfig};
use crate::utils::oauth::{OauthKeys, authorization_header};

/// Publication capability consumed by the orchestrator.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one post, returning the platform's opaque identifier.
    async fn post(&self, content: &PostContent) -> Result<PostId>;
}

/// Publisher client for the X API.
pub struct XPublisher {
    client: Client,
    keys: OauthKeys,
    config: PublisherConfig,
}

impl XPublisher {
    pub fn new(client: Client, keys: OauthKeys, config: PublisherConfig) -> Self {
        Self {
            client,
            keys,
            config,
        }
    }

    /// Build from environment credentials.
    ///
    /// A missing credential is a fatal configuration error; the orchestrator
    /// raises it before any item is processed.
    pub fn from_env(config: &PublisherConfig, client: Client) -> Result<Self> {
        let keys = OauthKeys {
            consumer_key: require_env("X_API_KEY")?,
            consumer_secret: require_env("X_API_SECRET")?,
            access_token: require_env("X_ACCESS_TOKEN")?,
            access_token_secret: require_env("X_ACCESS_TOKEN_SECRET")?,
        };
        Ok(Self::new(client, keys, config.clone()))
    }

    /// Upload media bytes, returning the platform media id.
    async fn upload_media(&self, media: &PreparedMedia) -> Result<String> {
        let url = format!("{}/media/upload.json", self.config.upload_base);
        let auth = authorization_header(&self.keys, "POST", &url, &[]);

        let part = reqwest::multipart::Part::bytes(media.bytes.clone())
            .file_name("media")
            .mime_str(&media.mime)?;
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::publish(
                "media_upload",
                format!("status {status}: {body}"),
            ));
        }

        #[derive(Deserialize)]
        struct MediaUploadResponse {
            media_id_string: String,
        }

        let payload: MediaUploadResponse = response.json().await?;
        Ok(payload.media_id_string)
    }

    /// Attach alt text to uploaded media. Best-effort by contract.
    async fn set_alt_text(&self, media_id: &str, alt: &str) -> Result<()> {
        let url = format!("{}/media/metadata/create.json", self.config.upload_base);
        let auth = authorization_header(&self.keys, "POST", &url, &[]);
        let body = serde_json::json!({
            "media_id": media_id,
            "alt_text": {"text": alt}
        });

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::publish(
                "media_metadata",
                format!("status {status}"),
            ));
        }
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| AppError::config(format!("{name} is not set")))
}

#[async_trait]
impl Publisher for XPublisher {
    async fn post(&self, content: &PostContent) -> Result<PostId> {
        // Media first; an upload failure degrades to a text-only post
        // rather than failing the item.
        let media_id = match &content.media {
            Some(media) => match self.upload_media(media).await {
                Ok(id) => {
                    if let Some(alt) = &media.alt {
                        if let Err(e) = self.set_alt_text(&id, alt).await {
                            log::warn!("Alt text attach failed: {e}");
                        }
                    }
                    Some(id)
                }
                Err(e) => {
                    log::warn!("Media upload failed, posting text-only: {e}");
                    None
                }
            },
            None => None,
        };

        let url = format!("{}/tweets", self.config.api_base);
        let auth = authorization_header(&self.keys, "POST", &url, &[]);

        let mut body = serde_json::json!({"text": content.text});
        if let Some(id) = media_id {
            body["media"] = serde_json::json!({"media_ids": [id]});
        }

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::publish(
                "create_post",
                format!("status {status}: {body}"),
            ));
        }

        #[derive(Deserialize)]
        struct PostData {
            id: String,
        }
        #[derive(Deserialize)]
        struct PostResponse {
            data: PostData,
        }

        let payload: PostResponse = response.json().await?;
        Ok(PostId(payload.data.id))
    }
}
