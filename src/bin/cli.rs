//! autopost CLI
//!
//! Single-run entry point invoked from the CI workflow.

use std::path::PathBuf;
use std::sync::Arc;

use autopost::{
    error::Result,
    models::{ArticleRef, Config},
    pipeline,
    services::{ArticleExtractor, ChangeEventSource, PostComposer},
    utils::url::canonical_url,
};
use clap::{Parser, Subcommand};

/// autopost - Social auto-poster for newly published articles
#[derive(Parser, Debug)]
#[command(
    name = "autopost",
    version,
    about = "Detects newly published articles and posts summaries to X"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full workflow: detect, compose, publish, mark
    Run {
        /// Compose and log posts without publishing or marking
        #[arg(long)]
        dry_run: bool,
    },

    /// List the candidate articles the current event would yield
    Detect,

    /// Compose the baseline post for one article and print it
    Preview {
        /// Repository-relative article path
        path: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;
    let config = Arc::new(config);

    match cli.command {
        Command::Run { dry_run } => {
            let summary = pipeline::run_autopost(Arc::clone(&config), dry_run).await?;
            log::info!(
                "Done: {} attempted, {} posted",
                summary.attempted,
                summary.posted
            );
        }

        Command::Detect => {
            let source = ChangeEventSource::new(Arc::clone(&config));
            let candidates = source.candidates().await;
            if candidates.is_empty() {
                log::info!("No new articles found");
            }
            for article in candidates {
                println!("{}", article.path);
            }
        }

        Command::Preview { path } => {
            let article = ArticleRef::new(path);
            if !article.matches(&config.site) {
                return Err(autopost::error::AppError::validation(format!(
                    "{} is not an article path under {}/",
                    article.path, config.site.content_dir
                )));
            }

            let extractor = ArticleExtractor::new(&config.site.content_root);
            let meta = extractor.extract(&article).await?;
            let url = canonical_url(&config.site.origin, &article.path);

            // Deterministic baseline only; the enhancer never runs here.
            let composer = PostComposer::new(config.compose.clone());
            let text = composer.compose(&meta, &url, None).await;
            println!("{text}");
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            log::info!("  site.origin: {}", config.site.origin);
            log::info!("  site.content_dir: {}/", config.site.content_dir);
            log::info!("  run.max_articles_per_run: {}", config.run.max_articles_per_run);
            log::info!(
                "  ledger: {}",
                if config.ledger.base_url.is_some() {
                    "configured"
                } else {
                    "disabled"
                }
            );
            log::info!("All validations passed!");
        }
    }

    Ok(())
}
