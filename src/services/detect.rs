// src/services/detect.rs

//! Change event source.
//!
//! Turns the CI trigger into the ordered list of article candidates for
//! this run. Two strategies are supported: an explicit list pushed by an
//! upstream publish dispatch, and a version-control diff between the push
//! event's revision pair. Either way the result is filtered to the content
//! directory and extension, deduplicated in source order, and capped at the
//! per-run batch maximum.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::process::Command;

use crate::models::{ArticleRef, ChangeEvent, Config};

/// Dispatch action that names newly published articles explicitly.
const PUBLISH_ACTION: &str = "new-article-published";

/// Diff target when the repository has no parent commit to diff against.
const EMPTY_TREE_SHA: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Service resolving the current run's candidate articles.
pub struct ChangeEventSource {
    config: Arc<Config>,
}

impl ChangeEventSource {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Detect candidates from the process environment.
    ///
    /// Detection never fails the run: a missing, unreadable, or unexpected
    /// event simply yields zero candidates.
    pub async fn candidates(&self) -> Vec<ArticleRef> {
        let event_name = std::env::var("GITHUB_EVENT_NAME").ok();
        let event = std::env::var("GITHUB_EVENT_PATH")
            .ok()
            .and_then(|path| Self::read_event_file(Path::new(&path)));

        self.detect(event_name.as_deref(), event).await
    }

    /// Resolve candidates for a given trigger name and payload.
    pub async fn detect(
        &self,
        event_name: Option<&str>,
        event: Option<ChangeEvent>,
    ) -> Vec<ArticleRef> {
        let raw = match (event_name, event) {
            (Some("repository_dispatch"), Some(event))
                if event.action.as_deref() == Some(PUBLISH_ACTION) =>
            {
                event
                    .client_payload
                    .map(|payload| {
                        payload
                            .articles
                            .iter()
                            .map(|entry| entry.path().to_string())
                            .collect()
                    })
                    .unwrap_or_default()
            }
            (Some("push"), Some(event)) => self.detect_from_push(&event).await,
            _ => Vec::new(),
        };

        self.filter(raw)
    }

    /// Diff strategy for push events.
    ///
    /// Prefers `git diff` over the event's revision pair; falls back to the
    /// additions recorded in the event's own commit list when no usable
    /// pair exists or git itself fails.
    async fn detect_from_push(&self, event: &ChangeEvent) -> Vec<String> {
        let before = event.before.as_deref().filter(|sha| usable_revision(sha));
        let after = event.after.as_deref().filter(|sha| usable_revision(sha));

        if let (Some(before), Some(after)) = (before, after) {
            match self.added_paths_between(before, after).await {
                Ok(paths) => return paths,
                Err(message) => {
                    log::warn!("Git diff {before}..{after} failed: {message}");
                }
            }
        } else {
            log::debug!("Push event without a usable revision pair");
        }

        event
            .commits
            .iter()
            .flat_map(|commit| commit.added.iter().cloned())
            .collect()
    }

    /// List paths added between two revisions.
    async fn added_paths_between(
        &self,
        before: &str,
        after: &str,
    ) -> std::result::Result<Vec<String>, String> {
        // A shallow "before" may be absent locally; diff against the empty
        // tree in that case so a first-ever push still enumerates additions.
        let base = if self.revision_exists(before).await {
            before.to_string()
        } else {
            EMPTY_TREE_SHA.to_string()
        };

        let output = Command::new("git")
            .args(["diff", "--diff-filter=A", "--name-only", base.as_str(), after])
            .current_dir(&self.config.site.content_root)
            .output()
            .await
            .map_err(|e| e.to_string())?;

        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn revision_exists(&self, revision: &str) -> bool {
        let probe = format!("{revision}^{{commit}}");
        Command::new("git")
            .args(["cat-file", "-e", probe.as_str()])
            .current_dir(&self.config.site.content_root)
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Filter to the content directory/extension, dedup, cap.
    fn filter(&self, raw: Vec<String>) -> Vec<ArticleRef> {
        let site = &self.config.site;
        let mut seen = HashSet::new();
        raw.into_iter()
            .map(ArticleRef::new)
            .filter(|article| article.matches(site))
            .filter(|article| seen.insert(article.path.clone()))
            .take(self.config.run.max_articles_per_run)
            .collect()
    }

    fn read_event_file(path: &Path) -> Option<ChangeEvent> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| log::warn!("Failed to read event file {path:?}: {e}"))
            .ok()?;
        serde_json::from_str(&content)
            .map_err(|e| log::warn!("Failed to decode event file {path:?}: {e}"))
            .ok()
    }
}

/// A revision is usable when it is a real object name, not the all-zero
/// placeholder a branch creation/deletion push carries.
fn usable_revision(sha: &str) -> bool {
    !sha.is_empty() && !sha.chars().all(|c| c == '0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Config;

    fn source() -> ChangeEventSource {
        ChangeEventSource::new(Arc::new(Config::default()))
    }

    fn dispatch_event(json: &str) -> Option<ChangeEvent> {
        Some(serde_json::from_str(json).unwrap())
    }

    #[tokio::test]
    async fn dispatch_event_yields_filtered_candidates() {
        let event = dispatch_event(
            r#"{
                "action": "new-article-published",
                "client_payload": {"articles": [
                    "article/a.html",
                    {"path": "article/b.html"},
                    "templates/base.html",
                    "article/readme.md"
                ]}
            }"#,
        );

        let candidates = source().detect(Some("repository_dispatch"), event).await;
        let paths: Vec<&str> = candidates.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["article/a.html", "article/b.html"]);
    }

    #[tokio::test]
    async fn dispatch_with_other_action_yields_nothing() {
        let event = dispatch_event(
            r#"{"action": "site-rebuilt", "client_payload": {"articles": ["article/a.html"]}}"#,
        );
        assert!(
            source()
                .detect(Some("repository_dispatch"), event)
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn candidates_are_deduplicated_in_source_order() {
        let event = dispatch_event(
            r#"{
                "action": "new-article-published",
                "client_payload": {"articles": [
                    "article/b.html", "article/a.html", "article/b.html"
                ]}
            }"#,
        );

        let candidates = source().detect(Some("repository_dispatch"), event).await;
        let paths: Vec<&str> = candidates.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["article/b.html", "article/a.html"]);
    }

    #[tokio::test]
    async fn batch_is_capped() {
        let mut config = Config::default();
        config.run.max_articles_per_run = 2;
        let source = ChangeEventSource::new(Arc::new(config));

        let event = dispatch_event(
            r#"{
                "action": "new-article-published",
                "client_payload": {"articles": [
                    "article/a.html", "article/b.html", "article/c.html"
                ]}
            }"#,
        );

        let candidates = source.detect(Some("repository_dispatch"), event).await;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].path, "article/a.html");
    }

    #[tokio::test]
    async fn push_without_revisions_uses_commit_change_list() {
        let event = dispatch_event(
            r#"{"commits": [
                {"added": ["article/new.html", "img/photo.jpg"]},
                {"added": ["article/other.html"]}
            ]}"#,
        );

        let candidates = source().detect(Some("push"), event).await;
        let paths: Vec<&str> = candidates.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["article/new.html", "article/other.html"]);
    }

    #[tokio::test]
    async fn push_with_zero_sha_uses_commit_change_list() {
        let event = dispatch_event(&format!(
            r#"{{
                "before": "{}",
                "after": "{}",
                "commits": [{{"added": ["article/new.html"]}}]
            }}"#,
            "0".repeat(40),
            "0".repeat(40),
        ));

        let candidates = source().detect(Some("push"), event).await;
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_yields_nothing() {
        assert!(source().detect(Some("schedule"), None).await.is_empty());
        assert!(source().detect(None, None).await.is_empty());
    }

    #[test]
    fn usable_revision_rejects_placeholders() {
        assert!(!usable_revision(""));
        assert!(!usable_revision(&"0".repeat(40)));
        assert!(usable_revision("4b825dc642cb6eb9a060e54bf8d69288fbee4904"));
    }
}
