//! Canonical domain keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Normalized hostname used to partition everything the engine learns.
///
/// Always lowercase, trimmed, without scheme, port, path or leading `www.`.
/// Construct it with [`DomainKey::normalize`]; normalizing an existing key
/// yields the same key. Deserialization normalizes too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct DomainKey(String);

impl DomainKey {
    /// Normalize a raw hostname or URL into a domain key.
    ///
    /// Never fails. Input that doesn't parse as a host is kept as-is after
    /// trimming and lowercasing.
    pub fn normalize(raw: &str) -> Self {
        let mut key = normalize_once(raw);
        // Stripping `www.` can expose a host the URL parser canonicalizes
        // differently (e.g. `www.1` -> `1` -> `0.0.0.1`), so settle it.
        for _ in 0..MAX_NORMALIZE_PASSES {
            let next = normalize_once(&key);
            if next == key {
                break;
            }
            key = next;
        }
        Self(key)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the raw input carried no usable hostname.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DomainKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

impl From<String> for DomainKey {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

const MAX_NORMALIZE_PASSES: usize = 4;

fn normalize_once(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let host = extract_host(&lowered).unwrap_or(lowered);
    strip_www(&host).to_string()
}

fn extract_host(input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }

    let parsed = if input.contains("://") {
        Url::parse(input).ok()?
    } else {
        Url::parse(&format!("http://{}", input)).ok()?
    };

    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
}

fn strip_www(host: &str) -> &str {
    let mut rest = host;
    while let Some(stripped) = rest.strip_prefix("www.") {
        if stripped.is_empty() {
            break;
        }
        rest = stripped;
    }
    rest
}
