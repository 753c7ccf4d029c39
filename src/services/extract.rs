// src/services/extract.rs

//! Article metadata extraction.
//!
//! Pulls title, category, and a representative image reference out of an
//! article document. Missing fields walk a fallback chain instead of
//! failing; only an unreadable document surfaces an error, and the
//! orchestrator treats that as a per-item skip.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{ArticleMetadata, ArticleRef, ImageRef};

/// Service for extracting metadata from article documents.
pub struct ArticleExtractor {
    root: PathBuf,
}

impl ArticleExtractor {
    /// Create an extractor reading documents under the given content root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read and extract one article document.
    pub async fn extract(&self, article: &ArticleRef) -> Result<ArticleMetadata> {
        let html = tokio::fs::read_to_string(self.root.join(&article.path)).await?;
        Ok(self.extract_from_html(&html, &article.path))
    }

    /// Extract metadata from already-loaded document content.
    pub fn extract_from_html(&self, html: &str, path: &str) -> ArticleMetadata {
        let document = Html::parse_document(html);

        ArticleMetadata {
            title: extract_title(&document, path),
            category: extract_category(&document),
            image: extract_image(&document),
        }
    }
}

fn extract_title(document: &Html, path: &str) -> String {
    if let Some(raw) = first_text(document, "title") {
        // Site branding is conventionally appended after a pipe.
        let title = raw.split('|').next().unwrap_or("").trim().to_string();
        if !title.is_empty() {
            return title;
        }
    }

    if let Some(heading) = first_text(document, "h1") {
        let heading = heading.trim().to_string();
        if !heading.is_empty() {
            return heading;
        }
    }

    filename_label(path)
}

fn extract_category(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="article:section"]"#, "content")
        .or_else(|| meta_content(document, r#"meta[name="category"]"#, "content"))
}

fn extract_image(document: &Html) -> Option<ImageRef> {
    let src = meta_content(document, r#"meta[property="og:image"]"#, "content")
        .or_else(|| meta_content(document, r#"meta[name="twitter:image"]"#, "content"))
        .or_else(|| meta_content(document, r#"link[rel="image_src"]"#, "href"));

    if let Some(src) = src {
        return Some(ImageRef { src, alt: None });
    }

    first_content_image(document)
}

/// First image inside the main content region, with its alt attribute or
/// an enclosing figcaption as alt text.
fn first_content_image(document: &Html) -> Option<ImageRef> {
    let img_sel = parse_selector("article img")?;
    let img = document.select(&img_sel).next()?;
    let src = img.value().attr("src")?.trim().to_string();
    if src.is_empty() {
        return None;
    }

    let alt = img
        .value()
        .attr("alt")
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .or_else(|| figcaption_text(&img));

    Some(ImageRef { src, alt })
}

fn figcaption_text(img: &ElementRef) -> Option<String> {
    let figure = img
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "figure")?;

    let caption_sel = parse_selector("figcaption")?;
    let caption = figure.select(&caption_sel).next()?;
    let text: String = caption.text().collect();
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Derive a human-readable label from the file name: drop the date prefix,
/// turn separators into spaces, capitalize the first letter.
fn filename_label(path: &str) -> String {
    static DATE_PREFIX: OnceLock<Regex> = OnceLock::new();
    let date_prefix =
        DATE_PREFIX.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[-_]?").expect("valid regex"));

    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path);

    let label = date_prefix.replace(stem, "");
    let label = label.replace(['-', '_'], " ");
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Untitled".to_string(),
    }
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = parse_selector(selector)?;
    let element = document.select(&sel).next()?;
    Some(element.text().collect::<String>())
}

fn meta_content(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = parse_selector(selector)?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_selector(selector: &str) -> Option<Selector> {
    Selector::parse(selector)
        .map_err(|e| log::warn!("Invalid selector '{selector}': {e:?}"))
        .ok()
}
