//! Normalized request keys for partition lookups.
//!
//! Two requests for the same resource must land on the same partition
//! entry, so keys are derived from a canonical form of the URL: lowercase
//! host, no fragment, query preserved as-is.

use sha2::{Digest, Sha256};
use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string for consistent cache keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Lowercase the host
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, KeyError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(KeyError::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| KeyError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(KeyError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(lowered.as_str()))
            .map_err(|e| KeyError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Compute the partition key for a request URL.
///
/// The key is the SHA-256 of the canonical URL, so equivalent URLs
/// (case-different hosts, fragment variants) collapse to one entry.
pub fn request_key(url: &Url) -> String {
    let mut canonical = url.clone();
    if let Some(host) = canonical.host_str() {
        let lowered = host.to_lowercase();
        // set_host only fails for cannot-be-a-base URLs, which http(s) never are
        let _ = canonical.set_host(Some(lowered.as_str()));
    }
    canonical.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM/Path").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com/page#section").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com?a=1&b=2").unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(KeyError::Empty)));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(KeyError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_request_key_stability() {
        let url = Url::parse("https://example.com/styles/main.css").unwrap();
        assert_eq!(request_key(&url), request_key(&url));
    }

    #[test]
    fn test_request_key_ignores_fragment_and_case() {
        let a = Url::parse("https://EXAMPLE.com/page#top").unwrap();
        let b = Url::parse("https://example.com/page").unwrap();
        assert_eq!(request_key(&a), request_key(&b));
    }

    #[test]
    fn test_request_key_distinguishes_query() {
        let a = Url::parse("https://example.com/api/items?page=1").unwrap();
        let b = Url::parse("https://example.com/api/items?page=2").unwrap();
        assert_ne!(request_key(&a), request_key(&b));
    }

    #[test]
    fn test_request_key_format() {
        let url = Url::parse("https://example.com/").unwrap();
        let key = request_key(&url);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
