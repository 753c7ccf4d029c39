// src/pipeline/run.rs

//! Run orchestration.
//!
//! Sequences the publication workflow over one bounded batch of candidates:
//! ledger check, metadata extraction, composition, publish, ledger commit.
//! Per-item failures are logged and never escape the item boundary; the
//! only fatal condition is missing publisher credentials, raised before any
//! item is touched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ArticleRef, Config, PostContent, PostId};
use crate::services::{
    ArticleExtractor, ChangeEventSource, GenAiEnhancer, HttpLedger, ImagePreparer, Ledger,
    PostComposer, Publisher, TextEnhancer, XPublisher, publication_key,
};
use crate::utils::http;
use crate::utils::url::canonical_url;

/// Terminal state of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Ledger already knows this article; no post attempt was made
    SkippedDuplicate,
    /// The document could not be read; reconsidered next run
    SkippedUnreadable,
    /// Dry run stopped short of publishing
    Previewed,
    /// Published and marked in the ledger
    Posted(PostId),
    /// Publish failed; deliberately left unmarked so the next run retries
    PostFailed,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub attempted: usize,
    pub posted: usize,
    pub previewed: usize,
    pub skipped_duplicates: usize,
    pub skipped_unreadable: usize,
    pub failed: usize,
}

/// Orchestrator wiring the workflow services together.
pub struct Autoposter {
    config: Arc<Config>,
    extractor: ArticleExtractor,
    composer: PostComposer,
    images: ImagePreparer,
    ledger: Arc<dyn Ledger>,
    publisher: Arc<dyn Publisher>,
    enhancer: Option<Arc<dyn TextEnhancer>>,
    dry_run: bool,
}

impl Autoposter {
    pub fn new(
        config: Arc<Config>,
        client: reqwest::Client,
        ledger: Arc<dyn Ledger>,
        publisher: Arc<dyn Publisher>,
        enhancer: Option<Arc<dyn TextEnhancer>>,
        dry_run: bool,
    ) -> Self {
        Self {
            extractor: ArticleExtractor::new(&config.site.content_root),
            composer: PostComposer::new(config.compose.clone()),
            images: ImagePreparer::new(client, &config.site.content_root, &config.publisher),
            config,
            ledger,
            publisher,
            enhancer,
            dry_run,
        }
    }

    /// Process a batch of candidates in source order.
    pub async fn run(&self, candidates: &[ArticleRef]) -> RunSummary {
        let mut summary = RunSummary {
            candidates: candidates.len(),
            ..RunSummary::default()
        };
        if candidates.is_empty() {
            log::info!("No new articles found; nothing to do");
            return summary;
        }

        log::info!("Processing {} candidate article(s)", candidates.len());
        let pause = Duration::from_secs(self.config.run.pause_between_posts_secs);

        for (idx, article) in candidates.iter().enumerate() {
            match self.process(article).await {
                ItemOutcome::SkippedDuplicate => summary.skipped_duplicates += 1,
                ItemOutcome::SkippedUnreadable => summary.skipped_unreadable += 1,
                ItemOutcome::Previewed => {
                    summary.attempted += 1;
                    summary.previewed += 1;
                }
                ItemOutcome::Posted(_) => {
                    summary.attempted += 1;
                    summary.posted += 1;
                }
                ItemOutcome::PostFailed => {
                    summary.attempted += 1;
                    summary.failed += 1;
                }
            }

            // Rate-limit courtesy pause, skipped after the last item.
            if idx + 1 < candidates.len() && !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        log::info!(
            "Run complete: {} posted / {} attempted ({} duplicate, {} unreadable, {} failed)",
            summary.posted,
            summary.attempted,
            summary.skipped_duplicates,
            summary.skipped_unreadable,
            summary.failed
        );
        summary
    }

    /// Walk one candidate through the per-item state machine.
    async fn process(&self, article: &ArticleRef) -> ItemOutcome {
        let key = publication_key(&article.path);
        if self.ledger.has(&key).await {
            log::info!("Skipping already-published article {}", article.path);
            return ItemOutcome::SkippedDuplicate;
        }

        let meta = match self.extractor.extract(article).await {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("Skipping unreadable article {}: {e}", article.path);
                return ItemOutcome::SkippedUnreadable;
            }
        };

        let url = canonical_url(&self.config.site.origin, &article.path);
        let text = self
            .composer
            .compose(&meta, &url, self.enhancer.as_deref())
            .await;

        if self.dry_run {
            log::info!("[dry-run] {} -> {text}", article.path);
            return ItemOutcome::Previewed;
        }

        let media = match &meta.image {
            Some(image) => self.images.prepare(article, image).await,
            None => None,
        };

        match self.publisher.post(&PostContent { text, media }).await {
            Ok(id) => {
                log::info!("Published {} as post {id}", article.path);
                // Mark only after a confirmed publish; a failed write is
                // logged inside the ledger and never fails the item.
                self.ledger.mark(&key).await;
                ItemOutcome::Posted(id)
            }
            Err(e) => {
                log::warn!("Publish failed for {}: {e}", article.path);
                ItemOutcome::PostFailed
            }
        }
    }
}

/// Placeholder publisher for dry runs; never reached because a dry run
/// stops before publishing.
struct DisabledPublisher;

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn post(&self, _content: &PostContent) -> Result<PostId> {
        Err(crate::error::AppError::config(
            "publishing is disabled in dry-run mode",
        ))
    }
}

/// Run the full workflow from the process environment.
pub async fn run_autopost(config: Arc<Config>, dry_run: bool) -> Result<RunSummary> {
    let source = ChangeEventSource::new(Arc::clone(&config));
    let candidates = source.candidates().await;
    if candidates.is_empty() {
        log::info!("No new articles found; nothing to do");
        return Ok(RunSummary::default());
    }

    let client = http::create_async_client(&config.http)?;

    // Credentials are checked before any item is processed; a dry run
    // deliberately skips the check so it works without secrets.
    let publisher: Arc<dyn Publisher> = if dry_run {
        Arc::new(DisabledPublisher)
    } else {
        Arc::new(XPublisher::from_env(&config.publisher, client.clone())?)
    };

    let ledger = Arc::new(HttpLedger::from_config(&config.ledger, client.clone()));
    if !ledger.is_enabled() {
        log::info!("Ledger not configured; duplicate suppression disabled");
    }

    let enhancer: Option<Arc<dyn TextEnhancer>> =
        GenAiEnhancer::from_config(&config.enhancer, client.clone())
            .map(|e| Arc::new(e) as Arc<dyn TextEnhancer>);

    let autoposter = Autoposter::new(config, client, ledger, publisher, enhancer, dry_run);
    Ok(autoposter.run(&candidates).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory ledger double.
    #[derive(Default)]
    struct MemoryLedger {
        seen: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl Ledger for MemoryLedger {
        async fn has(&self, key: &str) -> bool {
            self.seen.lock().unwrap().contains(key)
        }

        async fn mark(&self, key: &str) {
            self.seen.lock().unwrap().insert(key.to_string());
        }
    }

    /// Publisher double recording every post text.
    struct RecordingPublisher {
        fail: bool,
        posts: Mutex<Vec<String>>,
    }

    impl RecordingPublisher {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                posts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn post(&self, content: &PostContent) -> Result<PostId> {
            if self.fail {
                return Err(AppError::publish("create_post", "simulated outage"));
            }
            let mut posts = self.posts.lock().unwrap();
            posts.push(content.text.clone());
            Ok(PostId(format!("post-{}", posts.len())))
        }
    }

    fn test_config(root: &std::path::Path) -> Arc<Config> {
        let mut config = Config::default();
        config.site.content_root = root.to_string_lossy().into_owned();
        config.run.pause_between_posts_secs = 0;
        Arc::new(config)
    }

    fn write_article(root: &std::path::Path, name: &str, title: &str) -> ArticleRef {
        let dir = root.join("article");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(name),
            format!("<html><head><title>{title} | Horizon Libre</title></head></html>"),
        )
        .unwrap();
        ArticleRef::new(format!("article/{name}"))
    }

    fn autoposter(
        config: Arc<Config>,
        ledger: Arc<MemoryLedger>,
        publisher: Arc<RecordingPublisher>,
        dry_run: bool,
    ) -> Autoposter {
        Autoposter::new(
            config,
            reqwest::Client::new(),
            ledger,
            publisher,
            None,
            dry_run,
        )
    }

    #[tokio::test]
    async fn empty_batch_is_a_successful_no_op() {
        let tmp = tempfile::TempDir::new().unwrap();
        let publisher = Arc::new(RecordingPublisher::new(false));
        let poster = autoposter(
            test_config(tmp.path()),
            Arc::new(MemoryLedger::default()),
            Arc::clone(&publisher),
            false,
        );

        let summary = poster.run(&[]).await;
        assert_eq!(summary, RunSummary::default());
        assert!(publisher.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn seen_candidate_is_skipped_and_new_one_posted() {
        let tmp = tempfile::TempDir::new().unwrap();
        let first = write_article(tmp.path(), "a.html", "Already Told");
        let second = write_article(tmp.path(), "b.html", "Fresh News");

        let ledger = Arc::new(MemoryLedger::default());
        ledger.mark(&publication_key(&first.path)).await;
        let publisher = Arc::new(RecordingPublisher::new(false));

        let poster = autoposter(
            test_config(tmp.path()),
            Arc::clone(&ledger),
            Arc::clone(&publisher),
            false,
        );
        let summary = poster.run(&[first, second.clone()]).await;

        assert_eq!(summary.skipped_duplicates, 1);
        assert_eq!(summary.posted, 1);
        assert_eq!(publisher.posts.lock().unwrap().len(), 1);
        assert!(ledger.has(&publication_key(&second.path)).await);
    }

    #[tokio::test]
    async fn failed_publish_is_never_marked() {
        let tmp = tempfile::TempDir::new().unwrap();
        let article = write_article(tmp.path(), "a.html", "Won't Go Out");

        let ledger = Arc::new(MemoryLedger::default());
        let publisher = Arc::new(RecordingPublisher::new(true));

        let poster = autoposter(
            test_config(tmp.path()),
            Arc::clone(&ledger),
            publisher,
            false,
        );
        let summary = poster.run(std::slice::from_ref(&article)).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.posted, 0);
        assert!(!ledger.has(&publication_key(&article.path)).await);
    }

    #[tokio::test]
    async fn second_run_publishes_nothing_with_a_working_ledger() {
        let tmp = tempfile::TempDir::new().unwrap();
        let article = write_article(tmp.path(), "a.html", "Once Only");

        let ledger = Arc::new(MemoryLedger::default());
        let publisher = Arc::new(RecordingPublisher::new(false));

        let poster = autoposter(
            test_config(tmp.path()),
            Arc::clone(&ledger),
            Arc::clone(&publisher),
            false,
        );

        let first = poster.run(std::slice::from_ref(&article)).await;
        let second = poster.run(std::slice::from_ref(&article)).await;

        assert_eq!(first.posted, 1);
        assert_eq!(second.posted, 0);
        assert_eq!(second.skipped_duplicates, 1);
        assert_eq!(publisher.posts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_article_is_skipped_without_failing_the_run() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = ArticleRef::new("article/gone.html");
        let present = write_article(tmp.path(), "b.html", "Still Here");

        let ledger = Arc::new(MemoryLedger::default());
        let publisher = Arc::new(RecordingPublisher::new(false));

        let poster = autoposter(
            test_config(tmp.path()),
            Arc::clone(&ledger),
            Arc::clone(&publisher),
            false,
        );
        let summary = poster.run(&[missing.clone(), present]).await;

        assert_eq!(summary.skipped_unreadable, 1);
        assert_eq!(summary.posted, 1);
        assert!(!ledger.has(&publication_key(&missing.path)).await);
    }

    #[tokio::test]
    async fn dry_run_neither_publishes_nor_marks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let article = write_article(tmp.path(), "a.html", "Preview Me");

        let ledger = Arc::new(MemoryLedger::default());
        let publisher = Arc::new(RecordingPublisher::new(false));

        let poster = autoposter(
            test_config(tmp.path()),
            Arc::clone(&ledger),
            Arc::clone(&publisher),
            true,
        );
        let summary = poster.run(std::slice::from_ref(&article)).await;

        assert_eq!(summary.previewed, 1);
        assert_eq!(summary.posted, 0);
        assert!(publisher.posts.lock().unwrap().is_empty());
        assert!(!ledger.has(&publication_key(&article.path)).await);
    }

    #[tokio::test]
    async fn composed_text_carries_title_and_canonical_url() {
        let tmp = tempfile::TempDir::new().unwrap();
        let article = write_article(tmp.path(), "2024-05-01-elections.html", "Élections 2024");

        let ledger = Arc::new(MemoryLedger::default());
        let publisher = Arc::new(RecordingPublisher::new(false));

        let poster = autoposter(
            test_config(tmp.path()),
            ledger,
            Arc::clone(&publisher),
            false,
        );
        poster.run(std::slice::from_ref(&article)).await;

        let posts = publisher.posts.lock().unwrap();
        assert_eq!(
            posts[0],
            "Élections 2024 https://horizon-libre.net/article/2024-05-01-elections.html #HorizonLibre"
        );
    }
}
