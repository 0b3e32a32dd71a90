//! Configuration loading and validation.
//!
//! # Module Organization
//!
//! - [`settings`] — loads [`crate::models::settings::Settings`] from a JSON
//!   file, with environment-variable overrides for the server bind address
//! - [`validation`] — a comprehensive, non-short-circuiting validator that
//!   reports errors, warnings, and recommendations

pub mod settings;
pub mod validation;
