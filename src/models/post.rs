//! Composed post content and publish results.

/// Media payload prepared for upload alongside a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMedia {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub alt: Option<String>,
}

/// A fully composed post, produced and consumed within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    /// Composed text, at or under the platform length limit
    pub text: String,

    /// Optional prepared media payload
    pub media: Option<PreparedMedia>,
}

impl PostContent {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: None,
        }
    }
}

/// Opaque identifier returned by the platform for a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostId(pub String);

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
