//! Change event payload structures.
//!
//! The CI workflow hands the run trigger over as a JSON payload file; only
//! the fields the detection strategies consume are modeled here.

use serde::Deserialize;

/// Deserialized change event payload.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChangeEvent {
    /// Dispatch action name (repository_dispatch events)
    #[serde(default)]
    pub action: Option<String>,

    /// Dispatch payload (repository_dispatch events)
    #[serde(default)]
    pub client_payload: Option<ClientPayload>,

    /// Revision before the push (push events)
    #[serde(default)]
    pub before: Option<String>,

    /// Revision after the push (push events)
    #[serde(default)]
    pub after: Option<String>,

    /// Commits carried by a push event, used when no revision pair is usable
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

/// One commit inside a push event; only the added paths matter here.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PushCommit {
    #[serde(default)]
    pub added: Vec<String>,
}

/// Payload carried by an upstream publish dispatch.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientPayload {
    #[serde(default)]
    pub articles: Vec<ArticleEntry>,
}

/// One article entry in a dispatch payload.
///
/// Upstream emits either bare path strings or `{path}` objects; both forms
/// are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArticleEntry {
    Path(String),
    Object { path: String },
}

impl ArticleEntry {
    pub fn path(&self) -> &str {
        match self {
            ArticleEntry::Path(p) => p,
            ArticleEntry::Object { path } => path,
        }
    }
}
