//! Cache-key and name-normalization helpers shared by the DNS services.

use hickory_proto::rr::{Name, RecordType};

/// Key identifying a cached answer: the normalized query name, its record
/// type, and the upstream it was fetched from (different upstreams never
/// share a cache entry).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    domain: String,
    qtype: RecordType,
    upstream: String,
}

impl CacheKey {
    /// Builds a key from an already-normalized domain.
    pub fn new(domain: impl Into<String>, qtype: RecordType, upstream: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            qtype,
            upstream: upstream.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn qtype(&self) -> RecordType {
        self.qtype
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }
}

/// Normalizes a DNS [`Name`] into the lowercase, trailing-dot-stripped form
/// used as a cache key and for bypass-list comparisons.
///
/// `hickory_proto::rr::Name`'s `Display` implementation is case-preserving
/// (DNS 0x20 case randomization means a query for `ClOuDfLaRe.CoM` is
/// legitimate and equivalent to `cloudflare.com`), so the rendered name is
/// lowercased explicitly before the trailing root dot is stripped.
pub fn normalize_name(name: &Name) -> String {
    let text = name.to_string().to_lowercase();
    text.strip_suffix('.').unwrap_or(&text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn normalizes_trailing_dot() {
        let name = Name::from_str("example.com.").unwrap();
        assert_eq!(normalize_name(&name), "example.com");
    }

    #[test]
    fn normalizes_mixed_case_0x20_encoded_name() {
        let name = Name::from_str("ClOuDfLaRe.CoM.").unwrap();
        assert_eq!(normalize_name(&name), "cloudflare.com");
    }

    #[test]
    fn cache_key_equality_requires_same_upstream() {
        let a = CacheKey::new("example.com", RecordType::A, "https://1.1.1.1/dns-query");
        let b = CacheKey::new("example.com", RecordType::A, "https://1.0.0.1/dns-query");
        assert_ne!(a, b);
    }
}
