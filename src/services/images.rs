// src/services/images.rs

//! Representative image preparation.
//!
//! Resolves an extracted image reference to raw bytes ready for upload.
//! Resizing and recompression are out of scope; payloads over the platform
//! media limit are dropped instead. Every failure here degrades the item
//! to a text-only post, never more.

use std::path::{Path, PathBuf};

use reqwest::Client;

use crate::models::{ArticleRef, ImageRef, PreparedMedia, PublisherConfig};

/// Service loading image bytes for upload.
pub struct ImagePreparer {
    client: Client,
    root: PathBuf,
    max_bytes: usize,
    default_alt: String,
}

impl ImagePreparer {
    pub fn new(client: Client, root: impl Into<PathBuf>, config: &PublisherConfig) -> Self {
        Self {
            client,
            root: root.into(),
            max_bytes: config.max_media_bytes,
            default_alt: config.default_alt_text.clone(),
        }
    }

    /// Load the referenced image, or None when anything goes wrong.
    pub async fn prepare(&self, article: &ArticleRef, image: &ImageRef) -> Option<PreparedMedia> {
        let bytes = if image.src.starts_with("http://") || image.src.starts_with("https://") {
            self.fetch_remote(&image.src).await?
        } else {
            self.read_local(&article.path, &image.src).await?
        };

        if bytes.len() > self.max_bytes {
            log::warn!(
                "Image {} is {} bytes, over the {} byte media limit; posting text-only",
                image.src,
                bytes.len(),
                self.max_bytes
            );
            return None;
        }

        Some(PreparedMedia {
            mime: guess_mime(&image.src).to_string(),
            bytes,
            alt: image
                .alt
                .clone()
                .or_else(|| Some(self.default_alt.clone())),
        })
    }

    async fn fetch_remote(&self, src: &str) -> Option<Vec<u8>> {
        let response = self
            .client
            .get(src)
            .send()
            .await
            .map_err(|e| log::warn!("Image fetch failed for {src}: {e}"))
            .ok()?;

        if !response.status().is_success() {
            log::warn!("Image fetch for {src} returned {}", response.status());
            return None;
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| log::warn!("Image read failed for {src}: {e}"))
            .ok()
    }

    /// Resolve a document-relative or site-absolute image path and read it.
    async fn read_local(&self, article_path: &str, src: &str) -> Option<Vec<u8>> {
        let local = if let Some(rooted) = src.strip_prefix('/') {
            self.root.join(rooted)
        } else {
            let dir = Path::new(article_path).parent().unwrap_or(Path::new(""));
            self.root.join(dir).join(src)
        };

        tokio::fs::read(&local)
            .await
            .map_err(|e| log::warn!("Local image not readable at {local:?}: {e}"))
            .ok()
    }
}

/// Guess a MIME type from the file extension; JPEG when in doubt.
fn guess_mime(src: &str) -> &'static str {
    let ext = src
        .rsplit('.')
        .next()
        .map(|e| e.split(['?', '#']).next().unwrap_or(e).to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublisherConfig;

    fn preparer(root: &Path, max_bytes: usize) -> ImagePreparer {
        let config = PublisherConfig {
            max_media_bytes: max_bytes,
            ..PublisherConfig::default()
        };
        ImagePreparer::new(Client::new(), root, &config)
    }

    #[test]
    fn mime_guess_covers_common_extensions() {
        assert_eq!(guess_mime("photo.png"), "image/png");
        assert_eq!(guess_mime("photo.GIF"), "image/gif");
        assert_eq!(guess_mime("photo.webp"), "image/webp");
        assert_eq!(guess_mime("photo.jpg"), "image/jpeg");
        assert_eq!(guess_mime("https://cdn/img.png?w=200"), "image/png");
        assert_eq!(guess_mime("no-extension"), "image/jpeg");
    }

    #[tokio::test]
    async fn reads_article_relative_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("article")).unwrap();
        std::fs::write(tmp.path().join("article/photo.jpg"), b"jpegdata").unwrap();

        let media = preparer(tmp.path(), 1024)
            .prepare(
                &ArticleRef::new("article/a.html"),
                &ImageRef {
                    src: "photo.jpg".into(),
                    alt: Some("A photo".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(media.bytes, b"jpegdata");
        assert_eq!(media.mime, "image/jpeg");
        assert_eq!(media.alt.as_deref(), Some("A photo"));
    }

    #[tokio::test]
    async fn reads_site_absolute_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("img")).unwrap();
        std::fs::write(tmp.path().join("img/banner.png"), b"pngdata").unwrap();

        let media = preparer(tmp.path(), 1024)
            .prepare(
                &ArticleRef::new("article/a.html"),
                &ImageRef {
                    src: "/img/banner.png".into(),
                    alt: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(media.mime, "image/png");
        // Missing alt text falls back to the configured default.
        assert_eq!(media.alt.as_deref(), Some("Image from article"));
    }

    #[tokio::test]
    async fn missing_file_degrades_to_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let media = preparer(tmp.path(), 1024)
            .prepare(
                &ArticleRef::new("article/a.html"),
                &ImageRef {
                    src: "gone.jpg".into(),
                    alt: None,
                },
            )
            .await;
        assert!(media.is_none());
    }

    #[tokio::test]
    async fn oversized_payload_is_dropped() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("article")).unwrap();
        std::fs::write(tmp.path().join("article/big.jpg"), vec![0u8; 64]).unwrap();

        let media = preparer(tmp.path(), 16)
            .prepare(
                &ArticleRef::new("article/a.html"),
                &ImageRef {
                    src: "big.jpg".into(),
                    alt: None,
                },
            )
            .await;
        assert!(media.is_none());
    }
}
