//! The DoH request pipeline.
//!
//! # Module Organization
//!
//! - [`cache`] — generic, size-bounded TTL cache used for both DNS answers
//!   and CDN classification
//! - [`cdn`] — static CIDR-based CDN membership matcher
//! - [`upstream`] — pooled DoH client that dispatches queries to the
//!   upstream resolver
//! - [`patch`] — bypass rules and the answer-rewriting policy
//! - [`handler`] — orchestrates the above into a single request/response
//!   cycle, holding the shared [`handler::AppState`]
//!
//! # Architecture
//!
//! ```text
//! Client → routes → handler → cache (hit?) ───────────────┐
//!                      │                                  │
//!                      └─ miss → upstream → patch → cdn   │
//!                                    │                     │
//!                                    └─────── cache.store ─┘
//! ```

pub mod cache;
pub mod cdn;
pub mod handler;
pub mod patch;
pub mod upstream;
