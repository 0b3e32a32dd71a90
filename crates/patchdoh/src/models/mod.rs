//! Data models shared across the DoH proxy.
//!
//! # Module Organization
//!
//! - [`error`] — proxy error types with HTTP response mapping
//! - [`settings`] — application configuration
//! - [`dns`] — cache-key and name-normalization helpers shared by the DNS services
//!
//! # Examples
//!
//! ```rust
//! use patchdoh::models::dns::CacheKey;
//! use hickory_proto::rr::RecordType;
//!
//! let key = CacheKey::new("example.com", RecordType::A, "https://1.1.1.1/dns-query");
//! assert_eq!(key.domain(), "example.com");
//! ```

pub mod dns;
pub mod error;
pub mod settings;
