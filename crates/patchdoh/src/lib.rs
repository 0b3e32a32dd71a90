//! `patchdoh` — a DNS-over-HTTPS forwarding proxy.
//!
//! Accepts RFC 8484 DoH queries, forwards them to a configurable upstream
//! resolver, and rewrites answers whose first address record belongs to a
//! known CDN so that it instead resolves to a donor hostname. All other DNS
//! semantics (question section, transaction ID, non-address records) are
//! preserved.
//!
//! # Module Organization
//!
//! - [`models`] — configuration and error types
//! - [`config`] — settings loading and validation
//! - [`logs`] — structured logging setup
//! - [`services`] — the DoH pipeline: CDN matching, TTL caching, upstream
//!   dispatch, patch policy, and request orchestration
//! - [`routes`] — actix-web HTTP handlers exposing the DoH surface
//!
//! # Examples
//!
//! ```rust
//! use patchdoh::services::cdn::CdnMatcher;
//!
//! let matcher = CdnMatcher::new();
//! assert!(matcher.is_cdn_ip("104.16.0.5"));
//! assert!(!matcher.is_cdn_ip("8.8.8.8"));
//! ```

pub mod config;
pub mod logs;
pub mod models;
pub mod routes;
pub mod services;
