//! Stored response snapshots.

use bytes::Bytes;

/// A stored response: status, headers, and body captured at fetch time.
///
/// Snapshots are immutable once stored; overwriting a partition key
/// replaces the whole snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as name/value pairs, original order preserved.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Bytes,
    /// RFC 3339 timestamp of when the snapshot was stored.
    pub stored_at: String,
}

impl ResponseSnapshot {
    /// Build a snapshot with the current timestamp.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self { status, headers, body, stored_at: chrono::Utc::now().to_rfc3339() }
    }

    /// The empty offline response: 503, no body.
    ///
    /// Returned when a strategy has exhausted both network and cache.
    pub fn offline() -> Self {
        Self::new(503, vec![("x-squall-offline".into(), "1".into())], Bytes::new())
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Content-Type header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}
