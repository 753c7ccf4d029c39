// src/utils/oauth.rs

//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! The platform's media and posting endpoints authenticate individual
//! requests with a signed `Authorization` header. Only the header
//! construction lives here; credential resolution is the publisher's job.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sha1::Sha1;
use url::Url;

/// The four credential values every signed request needs.
#[derive(Debug, Clone)]
pub struct OauthKeys {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

/// Build a signed `Authorization` header for one request.
///
/// `extra_params` carries form parameters that participate in the signature
/// base string; query parameters are taken from `url` itself. JSON and
/// multipart bodies are not signed, per the platform's signing rules.
pub fn authorization_header(
    keys: &OauthKeys,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
) -> String {
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let timestamp = chrono::Utc::now().timestamp().to_string();

    build_header(keys, method, url, extra_params, &nonce, &timestamp)
}

/// Deterministic header construction, split out for testability.
fn build_header(
    keys: &OauthKeys,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    nonce: &str,
    timestamp: &str,
) -> String {
    let oauth_params: [(&str, &str); 6] = [
        ("oauth_consumer_key", &keys.consumer_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", &keys.access_token),
        ("oauth_version", "1.0"),
    ];

    let signature = sign(keys, method, url, &oauth_params, extra_params);

    let mut header = String::from("OAuth ");
    for (i, (key, value)) in oauth_params.iter().enumerate() {
        if i > 0 {
            header.push_str(", ");
        }
        header.push_str(&format!("{}=\"{}\"", key, encode(value)));
    }
    header.push_str(&format!(", oauth_signature=\"{}\"", encode(&signature)));
    header
}

/// Compute the base64 HMAC-SHA1 signature over the RFC 5849 base string.
fn sign(
    keys: &OauthKeys,
    method: &str,
    url: &str,
    oauth_params: &[(&str, &str)],
    extra_params: &[(&str, &str)],
) -> String {
    // Collect every signed parameter: oauth params, URL query, form params.
    let mut params: Vec<(String, String)> = oauth_params
        .iter()
        .chain(extra_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();

    let base_url = match Url::parse(url) {
        Ok(parsed) => {
            for (key, value) in parsed.query_pairs() {
                params.push((encode(&key), encode(&value)));
            }
            let mut stripped = parsed.clone();
            stripped.set_query(None);
            stripped.set_fragment(None);
            stripped.to_string()
        }
        Err(_) => url.to_string(),
    };

    params.sort();
    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&base_url),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&keys.consumer_secret),
        encode(&keys.access_token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(signing_key.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// RFC 3986 percent-encoding (unreserved characters pass through).
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
