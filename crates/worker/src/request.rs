//! The intercepted request model.
//!
//! A `FetchRequest` carries the metadata the classifier and pipeline need:
//! method, absolute URL, request mode, and optional destination. The gateway
//! builds these from inbound HTTP requests (`Sec-Fetch-Mode`,
//! `Sec-Fetch-Dest`); tests build them directly.

use reqwest::Method;
use squall_core::store::key::request_key;
use url::Url;

/// How the request was initiated, mirroring the fetch-metadata mode values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    NoCors,
    #[default]
    Cors,
    SameOrigin,
}

impl RequestMode {
    /// Parse a `Sec-Fetch-Mode` header value. Unknown values map to `Cors`.
    pub fn from_header(value: &str) -> Self {
        match value {
            "navigate" => RequestMode::Navigate,
            "no-cors" => RequestMode::NoCors,
            "same-origin" => RequestMode::SameOrigin,
            _ => RequestMode::Cors,
        }
    }
}

/// What kind of resource the request is for, when the initiator declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Font,
    Image,
    Script,
    Style,
}

impl Destination {
    /// Parse a `Sec-Fetch-Dest` header value. Values outside the set the
    /// classifier cares about yield `None` (suffix matching takes over).
    pub fn from_header(value: &str) -> Option<Self> {
        match value {
            "document" => Some(Destination::Document),
            "font" => Some(Destination::Font),
            "image" => Some(Destination::Image),
            "script" => Some(Destination::Script),
            "style" => Some(Destination::Style),
            _ => None,
        }
    }
}

/// An inbound request as seen by the interception pipeline.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Option<Destination>,
}

impl FetchRequest {
    /// A plain GET with default mode and no destination metadata.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::default(), destination: None }
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the destination metadata.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Whether the method is GET.
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// The normalized partition key for this request's URL.
    pub fn key(&self) -> String {
        request_key(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_header() {
        assert_eq!(RequestMode::from_header("navigate"), RequestMode::Navigate);
        assert_eq!(RequestMode::from_header("no-cors"), RequestMode::NoCors);
        assert_eq!(RequestMode::from_header("same-origin"), RequestMode::SameOrigin);
        assert_eq!(RequestMode::from_header("cors"), RequestMode::Cors);
        assert_eq!(RequestMode::from_header("websocket"), RequestMode::Cors);
    }

    #[test]
    fn test_destination_from_header() {
        assert_eq!(Destination::from_header("font"), Some(Destination::Font));
        assert_eq!(Destination::from_header("image"), Some(Destination::Image));
        assert_eq!(Destination::from_header("document"), Some(Destination::Document));
        assert_eq!(Destination::from_header("empty"), None);
        assert_eq!(Destination::from_header("worker"), None);
    }

    #[test]
    fn test_request_builder() {
        let url = Url::parse("https://example.com/fonts/inter.woff2").unwrap();
        let request = FetchRequest::get(url)
            .with_mode(RequestMode::NoCors)
            .with_destination(Destination::Font);

        assert!(request.is_get());
        assert_eq!(request.mode, RequestMode::NoCors);
        assert_eq!(request.destination, Some(Destination::Font));
    }

    #[test]
    fn test_key_matches_url_normalization() {
        let a = FetchRequest::get(Url::parse("https://EXAMPLE.com/page#top").unwrap());
        let b = FetchRequest::get(Url::parse("https://example.com/page").unwrap());
        assert_eq!(a.key(), b.key());
    }
}
