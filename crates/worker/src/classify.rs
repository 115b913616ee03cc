//! Request classification.
//!
//! Maps every intercepted request to exactly one resource class. The
//! decision is an ordered list of predicate/outcome rules evaluated top to
//! bottom: destination metadata first (authoritative when present), then
//! request mode for navigations, then the API path prefix, then URL-suffix
//! patterns as the fallback. The function is pure and total.

use std::sync::LazyLock;

use regex::Regex;
use squall_core::store::PartitionKind;

use crate::request::{Destination, FetchRequest, RequestMode};

static FONT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.(woff2?|ttf|otf|eot)$").unwrap());
static IMAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(png|jpe?g|gif|webp|avif|svg|ico)$").unwrap());
static ASSET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.(m?js|css)$").unwrap());

/// The resource class an intercepted request belongs to.
///
/// Determines which caching strategy the pipeline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Font,
    Image,
    ScriptOrStyle,
    /// Top-level document load.
    Navigation,
    /// Path under the configured API prefix.
    Api,
    /// Generic runtime resource.
    Other,
}

impl ResourceClass {
    /// The partition kind responses of this class are stored in.
    pub fn partition_kind(self) -> PartitionKind {
        match self {
            ResourceClass::Font => PartitionKind::Fonts,
            ResourceClass::Image => PartitionKind::Images,
            ResourceClass::Api => PartitionKind::Api,
            ResourceClass::ScriptOrStyle | ResourceClass::Navigation | ResourceClass::Other => PartitionKind::Runtime,
        }
    }
}

type Rule = (fn(&FetchRequest, &str) -> bool, ResourceClass);

/// Ordered rules, first match wins. Destination metadata outranks suffix
/// patterns; navigation is decided by mode alone.
const RULES: &[Rule] = &[
    (|r, _| r.destination == Some(Destination::Font), ResourceClass::Font),
    (|r, _| r.destination == Some(Destination::Image), ResourceClass::Image),
    (
        |r, _| matches!(r.destination, Some(Destination::Script) | Some(Destination::Style)),
        ResourceClass::ScriptOrStyle,
    ),
    (
        |r, _| r.mode == RequestMode::Navigate || r.destination == Some(Destination::Document),
        ResourceClass::Navigation,
    ),
    (|r, prefix| r.url.path().starts_with(prefix), ResourceClass::Api),
    (|r, _| FONT_SUFFIX.is_match(r.url.path()), ResourceClass::Font),
    (|r, _| IMAGE_SUFFIX.is_match(r.url.path()), ResourceClass::Image),
    (|r, _| ASSET_SUFFIX.is_match(r.url.path()), ResourceClass::ScriptOrStyle),
];

/// Classify a request.
///
/// Pure and deterministic: identical request metadata always yields the
/// same class.
pub fn classify(request: &FetchRequest, api_prefix: &str) -> ResourceClass {
    for (matches, class) in RULES {
        if matches(request, api_prefix) {
            return *class;
        }
    }
    ResourceClass::Other
}
