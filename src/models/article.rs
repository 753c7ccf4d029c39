//! Article identity and extracted metadata.

use serde::{Deserialize, Serialize};

use super::SiteConfig;

/// One content item considered for publication in the current run.
///
/// The path is repository-relative and doubles as the stable identity the
/// publication key is derived from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRef {
    pub path: String,
}

impl ArticleRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Whether the path lies under the content directory with the expected
    /// extension. Anything else never reaches downstream components.
    pub fn matches(&self, site: &SiteConfig) -> bool {
        let prefix = format!("{}/", site.content_dir.trim_end_matches('/'));
        self.path.starts_with(&prefix)
            && self.path.ends_with(&site.article_ext)
            && self.path.len() > prefix.len() + site.article_ext.len()
    }
}

/// A representative image reference found in a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRef {
    /// Local path or absolute URL
    pub src: String,

    /// Alt text from the `alt` attribute or an enclosing figcaption
    pub alt: Option<String>,
}

/// Metadata extracted from one article document, recomputed every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleMetadata {
    /// Display title, never empty (falls back to a filename label)
    pub title: String,

    /// Optional classification, absent is a valid value
    pub category: Option<String>,

    /// Optional representative image
    pub image: Option<ImageRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_accepts_content_paths() {
        let site = SiteConfig::default();
        assert!(ArticleRef::new("article/2024-05-01-elections.html").matches(&site));
    }

    #[test]
    fn matches_rejects_other_directories() {
        let site = SiteConfig::default();
        assert!(!ArticleRef::new("templates/base.html").matches(&site));
        assert!(!ArticleRef::new("img/banner.png").matches(&site));
    }

    #[test]
    fn matches_rejects_wrong_extension() {
        let site = SiteConfig::default();
        assert!(!ArticleRef::new("article/notes.txt").matches(&site));
        assert!(!ArticleRef::new("article/draft.md").matches(&site));
    }

    #[test]
    fn matches_rejects_bare_directory() {
        let site = SiteConfig::default();
        assert!(!ArticleRef::new("article/.html").matches(&site));
        assert!(!ArticleRef::new("article/").matches(&site));
    }
}
