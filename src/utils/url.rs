// src/utils/url.rs

//! URL construction utilities.

use url::Url;

/// Fixed tracking parameters appended when UTM decoration is enabled.
const UTM_PARAMS: [(&str, &str); 3] = [
    ("utm_source", "twitter"),
    ("utm_medium", "social"),
    ("utm_campaign", "autopost"),
];

/// Build the publicly reachable URL for an article path.
pub fn canonical_url(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Append the fixed UTM parameters to a URL, merging with any existing
/// query parameters. Keys already present are left untouched.
pub fn append_utm(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let existing: Vec<String> = parsed
        .query_pairs()
        .map(|(k, _)| k.into_owned())
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in UTM_PARAMS {
            if !existing.iter().any(|k| k == key) {
                pairs.append_pair(key, value);
            }
        }
    }

    parsed.to_string()
}
