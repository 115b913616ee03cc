//! Origin allow-list gating.
//!
//! Only the site's own origin and a fixed set of trusted third-party hosts
//! (font and image CDNs, suffix-matched) participate in the caching
//! contract. Everything else passes through uncached, which keeps arbitrary
//! cross-origin responses out of the partitions.

use squall_core::Error;
use squall_core::store::key::canonicalize;
use url::Url;

/// The allow-list: own origin plus trusted third-party host suffixes.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    own: Url,
    trusted_hosts: Vec<String>,
}

impl OriginPolicy {
    /// Build a policy from the configured origin and trusted hosts.
    pub fn new(origin: &str, trusted_hosts: Vec<String>) -> Result<Self, Error> {
        let own = canonicalize(origin).map_err(|e| Error::InvalidUrl(format!("{origin}: {e}")))?;
        if own.host_str().is_none() {
            return Err(Error::InvalidUrl(format!("{origin}: missing host")));
        }
        Ok(Self { own, trusted_hosts })
    }

    /// The site's own origin.
    pub fn own_origin(&self) -> &Url {
        &self.own
    }

    /// Whether a URL is allowed to participate in caching.
    pub fn allows(&self, url: &Url) -> bool {
        if self.is_same_origin(url) {
            return true;
        }

        match url.host_str() {
            Some(host) => {
                let host = host.to_ascii_lowercase();
                self.trusted_hosts
                    .iter()
                    .any(|pattern| host_matches(&host, &pattern.to_ascii_lowercase()))
            }
            None => false,
        }
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.own.scheme()
            && url.host_str().map(|h| h.to_ascii_lowercase()) == self.own.host_str().map(|h| h.to_ascii_lowercase())
            && url.port_or_known_default() == self.own.port_or_known_default()
    }
}

/// Exact match or subdomain of the pattern.
fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern || host.ends_with(&format!(".{pattern}"))
}
