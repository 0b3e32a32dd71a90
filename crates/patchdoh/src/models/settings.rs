//! Application configuration settings for the DoH proxy.
//!
//! This structure contains the complete configuration needed to run the
//! proxy: server binding, the default upstream resolver, the donor hostname
//! used when patching, and cache sizing/TTL ceilings. Configuration is
//! typically loaded from a JSON file via [`crate::config::settings::load_settings`]
//! and validated before use via [`crate::config::validation::ConfigValidator`].
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "bind_host": "0.0.0.0",
//!   "bind_port": 8000,
//!   "default_upstream": "https://1.1.1.1/dns-query",
//!   "donor_domain": "namu.wiki",
//!   "upstream_timeout_secs": 30,
//!   "cache": {
//!     "max_size": 1000,
//!     "max_ttl_answer_secs": 3000,
//!     "max_ttl_cdn_secs": 3600,
//!     "neg_ttl_cdn_secs": 60,
//!     "default_ttl_on_miss_secs": 300,
//!     "donor_ttl_floor_secs": 600
//!   }
//! }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use patchdoh::models::settings::Settings;
//!
//! let settings = Settings::default();
//! assert!(settings.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

/// Sizing and TTL parameters for the two TTL caches (DNS answers and CDN
/// classification).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CacheSettings {
    /// Maximum number of entries held by either cache before size-bounded
    /// eviction kicks in.
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Ceiling applied to a cached DNS answer's TTL, regardless of what the
    /// upstream returned.
    #[serde(default = "default_max_ttl_answer")]
    pub max_ttl_answer_secs: u64,

    /// TTL for a positive CDN classification.
    #[serde(default = "default_max_ttl_cdn")]
    pub max_ttl_cdn_secs: u64,

    /// TTL for a negative/error CDN classification.
    #[serde(default = "default_neg_ttl_cdn")]
    pub neg_ttl_cdn_secs: u64,

    /// TTL assumed for an answer with no A/AAAA record to read a TTL from.
    #[serde(default = "default_ttl_on_miss")]
    pub default_ttl_on_miss_secs: u64,

    /// Minimum TTL applied to records produced by patching.
    #[serde(default = "default_donor_ttl_floor")]
    pub donor_ttl_floor_secs: u64,
}

fn default_max_size() -> usize {
    1000
}
fn default_max_ttl_answer() -> u64 {
    3000
}
fn default_max_ttl_cdn() -> u64 {
    3600
}
fn default_neg_ttl_cdn() -> u64 {
    60
}
fn default_ttl_on_miss() -> u64 {
    300
}
fn default_donor_ttl_floor() -> u64 {
    600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_ttl_answer_secs: default_max_ttl_answer(),
            max_ttl_cdn_secs: default_max_ttl_cdn(),
            neg_ttl_cdn_secs: default_neg_ttl_cdn(),
            default_ttl_on_miss_secs: default_ttl_on_miss(),
            donor_ttl_floor_secs: default_donor_ttl_floor(),
        }
    }
}

/// Top-level application configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    /// Configuration schema version for compatibility checking.
    #[serde(default = "default_version")]
    pub version: u8,

    /// Address the HTTP server binds to. Overridable via `PATCHDOH_HOST`.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Port the HTTP server binds to. Overridable via `PATCHDOH_PORT`.
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Upstream DoH resolver used when a request has no `{upstream}` path
    /// override.
    #[serde(default = "default_upstream")]
    pub default_upstream: String,

    /// Hostname whose A/AAAA records replace a CDN-fronted answer.
    #[serde(default = "default_donor_domain")]
    pub donor_domain: String,

    /// Timeout applied to each upstream DoH request.
    #[serde(default = "default_timeout")]
    pub upstream_timeout_secs: u64,

    /// Cache sizing and TTL parameters.
    #[serde(default)]
    pub cache: CacheSettings,
}

fn default_version() -> u8 {
    1
}
fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}
fn default_bind_port() -> u16 {
    8000
}
fn default_upstream() -> String {
    "https://1.1.1.1/dns-query".to_string()
}
fn default_donor_domain() -> String {
    "namu.wiki".to_string()
}
fn default_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            bind_host: default_bind_host(),
            bind_port: default_bind_port(),
            default_upstream: default_upstream(),
            donor_domain: default_donor_domain(),
            upstream_timeout_secs: default_timeout(),
            cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    /// Performs structural validation of the settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered. Common errors include
    /// a non-`https` default upstream, an empty donor domain, or a zero-sized
    /// cache. See [`crate::config::validation::ConfigValidator`] for a more
    /// thorough, non-short-circuiting check intended for startup reporting.
    pub fn validate(&self) -> Result<(), String> {
        if !self.default_upstream.starts_with("https://") {
            return Err("default_upstream must be an https:// URL".to_string());
        }
        if self.donor_domain.trim().is_empty() {
            return Err("donor_domain cannot be empty".to_string());
        }
        if self.cache.max_size == 0 {
            return Err("cache.max_size must be greater than zero".to_string());
        }
        if self.upstream_timeout_secs == 0 {
            return Err("upstream_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn rejects_plain_http_upstream() {
        let mut settings = Settings::default();
        settings.default_upstream = "http://1.1.1.1/dns-query".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_zero_cache_size() {
        let mut settings = Settings::default();
        settings.cache.max_size = 0;
        assert!(settings.validate().is_err());
    }
}
