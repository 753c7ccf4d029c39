// src/services/compose.rs

//! Post composition.
//!
//! Turns (title, category, canonical URL) into publishable text that never
//! exceeds the platform length limit. The deterministic baseline is always
//! available; a configured enhancer may replace it, but any enhancement
//! failure falls back silently.

use unicode_segmentation::UnicodeSegmentation;

use crate::models::{ArticleMetadata, ComposeConfig};
use crate::services::enhance::TextEnhancer;
use crate::utils::url::append_utm;

/// Service composing post text.
pub struct PostComposer {
    config: ComposeConfig,
}

impl PostComposer {
    pub fn new(config: ComposeConfig) -> Self {
        Self { config }
    }

    /// Compose the post for one article.
    ///
    /// Applies URL decoration, derives hashtags, builds the deterministic
    /// baseline, and lets a configured enhancer improve on it. The result
    /// is always at or under the length limit and contains the URL.
    pub async fn compose(
        &self,
        meta: &ArticleMetadata,
        canonical_url: &str,
        enhancer: Option<&dyn TextEnhancer>,
    ) -> String {
        let url = if self.config.utm_enabled {
            append_utm(canonical_url)
        } else {
            canonical_url.to_string()
        };
        let tags = self.hashtags(&meta.title, meta.category.as_deref());
        let baseline = self.compose_baseline(&meta.title, &url, &tags);

        let Some(enhancer) = enhancer else {
            return baseline;
        };

        match enhancer
            .rewrite(&self.enhancement_prompt(meta, &url, &tags))
            .await
        {
            Ok(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    log::debug!("Enhancer returned empty text, using baseline");
                    return baseline;
                }
                let text = if text.contains(&url) {
                    text
                } else {
                    format!("{text} {url}")
                };
                self.clamp_to_url_tail(&text, &url).unwrap_or(baseline)
            }
            Err(e) => {
                log::warn!("Text enhancement failed, using baseline: {e}");
                baseline
            }
        }
    }

    /// Derive at most two hashtags: the brand tag first, then one from the
    /// category or, failing that, from the first significant title word.
    pub fn hashtags(&self, title: &str, category: Option<&str>) -> String {
        let mut tags = vec![self.config.brand_hashtag.clone()];

        let second = category
            .and_then(|cat| {
                let joined: String = cat.chars().filter(|c| !c.is_whitespace()).collect();
                (!joined.is_empty()).then(|| normalize_tag(&joined))
            })
            .or_else(|| self.significant_word(title).map(|w| normalize_tag(&w)));

        if let Some(tag) = second {
            let tag = format!("#{tag}");
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }

        tags.truncate(2);
        tags.join(" ")
    }

    /// First title word that qualifies for a hashtag: punctuation stripped,
    /// plain ASCII with at least one letter, long enough, not a stopword.
    fn significant_word(&self, title: &str) -> Option<String> {
        title.split_whitespace().find_map(|word| {
            let clean: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            let qualifies = !clean.is_empty()
                && clean.chars().all(|c| c.is_ascii_alphanumeric())
                && clean.chars().any(|c| c.is_ascii_alphabetic())
                && clean.len() >= self.config.min_hashtag_word_len
                && !self
                    .config
                    .stopwords
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&clean));
            qualifies.then_some(clean)
        })
    }

    /// Deterministic assembly: `"{title} {url} {hashtags}"`, clamped to the
    /// limit by truncating the title and appending an ellipsis. URL and
    /// hashtags survive intact whenever the limit allows it at all.
    pub fn compose_baseline(&self, title: &str, url: &str, tags: &str) -> String {
        let max = self.config.max_post_length;
        let text = if tags.is_empty() {
            format!("{title} {url}")
        } else {
            format!("{title} {url} {tags}")
        };
        if grapheme_len(&text) <= max {
            return text;
        }

        let tail = if tags.is_empty() {
            format!(" {url}")
        } else {
            format!(" {url} {tags}")
        };
        let tail_len = grapheme_len(&tail);

        if tail_len + 2 <= max {
            let budget = max - tail_len;
            let truncated = truncate_graphemes(title, budget - 1);
            return format!("{}…{tail}", truncated.trim_end());
        }

        // URL and hashtags alone exceed the limit; hard-truncate as a last
        // resort so the bound still holds.
        format!("{}…", truncate_graphemes(&text, max.saturating_sub(1)))
    }

    /// Clamp enhanced text while keeping its trailing URL intact.
    ///
    /// Returns None when the text cannot be clamped without losing the URL;
    /// the caller falls back to the baseline in that case.
    fn clamp_to_url_tail(&self, text: &str, url: &str) -> Option<String> {
        let max = self.config.max_post_length;
        if grapheme_len(text) <= max {
            return Some(text.to_string());
        }

        let prefix = text.strip_suffix(url)?.trim_end();
        let url_len = grapheme_len(url);
        if url_len + 3 > max {
            return None;
        }

        let budget = max - url_len - 1;
        let truncated = truncate_graphemes(prefix, budget - 1);
        Some(format!("{}… {url}", truncated.trim_end()))
    }

    fn enhancement_prompt(&self, meta: &ArticleMetadata, url: &str, tags: &str) -> String {
        format!(
            "Rewrite this announcement of a news article as a single short, \
             neutral-toned social media post in the article's language. \
             Stay under {max} characters, include the hashtags \"{tags}\", \
             and end with this URL exactly as given: {url}\n\n\
             Title: {title}\nCategory: {category}",
            max = self.config.max_post_length,
            title = meta.title,
            category = meta.category.as_deref().unwrap_or("none"),
        )
    }
}

fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

fn truncate_graphemes(s: &str, n: usize) -> String {
    s.graphemes(true).take(n).collect()
}

/// Normalize a hashtag word: lowercase, then capitalize the first letter.
fn normalize_tag(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lower,
    }
}
