//! Comprehensive, non-short-circuiting configuration validation.
//!
//! Unlike [`crate::models::settings::Settings::validate`], which returns on
//! the first error, [`ConfigValidator::validate_comprehensive`] collects
//! every issue it finds so the server binary can report the full picture at
//! startup, in the teacher's "errors + warnings + recommendations" shape.

use crate::models::settings::Settings;

/// Outcome of a comprehensive validation pass.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// `true` iff `errors` is empty.
    pub is_valid: bool,
    /// Structural problems that must be fixed before starting the server.
    pub errors: Vec<String>,
    /// Legal but risky configuration choices.
    pub warnings: Vec<String>,
    /// Soft suggestions that do not block startup.
    pub recommendations: Vec<String>,
}

impl ValidationResult {
    /// Creates an empty, valid result.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Records an error and marks the result invalid.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    /// Records a warning without affecting validity.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Records a recommendation without affecting validity.
    pub fn add_recommendation(&mut self, message: impl Into<String>) {
        self.recommendations.push(message.into());
    }
}

/// Validates a [`Settings`] value beyond the structural checks in
/// [`Settings::validate`].
pub struct ConfigValidator;

impl ConfigValidator {
    /// Runs every check against `settings` and returns the aggregated
    /// result. Never short-circuits: every applicable check runs regardless
    /// of earlier failures.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use patchdoh::config::validation::ConfigValidator;
    /// use patchdoh::models::settings::Settings;
    ///
    /// let result = ConfigValidator::validate_comprehensive(&Settings::default());
    /// assert!(result.is_valid);
    /// ```
    pub fn validate_comprehensive(settings: &Settings) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(e) = settings.validate() {
            result.add_error(e);
        }

        if !settings.default_upstream.starts_with("https://") {
            result.add_error("default_upstream must use https://");
        }

        if settings.bind_port < 1024 {
            result.add_warning(format!(
                "bind_port {} is a privileged port; the process will need elevated permissions",
                settings.bind_port
            ));
        }

        let cache = &settings.cache;
        if cache.max_size < 16 {
            result.add_warning(format!(
                "cache.max_size {} is very small; most entries will be evicted immediately under load",
                cache.max_size
            ));
        }
        if cache.max_ttl_answer_secs < cache.donor_ttl_floor_secs {
            result.add_warning(
                "cache.max_ttl_answer_secs is lower than cache.donor_ttl_floor_secs; patched \
                 answers will be evicted before their nominal TTL expires",
            );
        }
        if cache.max_ttl_cdn_secs < cache.neg_ttl_cdn_secs {
            result.add_error(
                "cache.max_ttl_cdn_secs must be at least cache.neg_ttl_cdn_secs",
            );
        }

        if settings.upstream_timeout_secs > 60 {
            result.add_recommendation(
                "upstream_timeout_secs is over a minute; consider lowering it so a slow \
                 upstream cannot pin down request-handling tasks for long",
            );
        }

        result.add_recommendation(
            "consider restricting `{upstream}` path overrides to a fixed allow-list if this \
             proxy is reachable from untrusted clients",
        );

        result
    }
}
