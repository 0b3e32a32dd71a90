//! End-to-end request orchestration and the shared application state.

use crate::models::dns::{normalize_name, CacheKey};
use crate::models::error::ProxyError;
use crate::models::settings::Settings;
use crate::services::cache::{Timer, TtlCache};
use crate::services::cdn::CdnMatcher;
use crate::services::patch::PatchPolicy;
use crate::services::upstream::UpstreamClient;
use hickory_proto::op::{Message, MessageType, OpCode};
use hickory_proto::rr::Record;
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Process-wide state shared by every request handler.
///
/// Cloning is cheap: every field is itself `Arc`-backed or a plain pooled
/// client. Registered once via `actix_web::web::Data` at server startup.
#[derive(Clone)]
pub struct AppState {
    answer_cache: Arc<TtlCache<CacheKey, Vec<Record>>>,
    upstream: Arc<UpstreamClient>,
    cdn: Arc<CdnMatcher>,
    patch_policy: Arc<PatchPolicy>,
    default_upstream: String,
}

impl AppState {
    /// Builds the shared state from resolved [`Settings`], using the real
    /// monotonic clock for both caches.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_settings_with_timer(settings, Arc::new(Instant::now))
    }

    /// Builds the shared state with an injected `timer` driving both the
    /// answer cache and the CDN-classification cache, so tests can advance
    /// expiry deterministically instead of sleeping on the real clock.
    pub fn from_settings_with_timer(settings: &Settings, timer: Timer) -> Self {
        let answer_cache = Arc::new(TtlCache::with_timer(
            settings.cache.max_size,
            Duration::from_secs(settings.cache.max_ttl_answer_secs),
            timer.clone(),
        ));
        let upstream = Arc::new(UpstreamClient::new(
            Duration::from_secs(settings.upstream_timeout_secs),
            answer_cache.clone(),
            Duration::from_secs(settings.cache.max_ttl_answer_secs),
            Duration::from_secs(settings.cache.default_ttl_on_miss_secs),
        ));
        let cdn = Arc::new(CdnMatcher::with_cache_size_and_timer(
            settings.cache.max_size,
            timer,
        ));
        let patch_policy = Arc::new(PatchPolicy::new(
            settings.donor_domain.clone(),
            settings.default_upstream.clone(),
            Duration::from_secs(settings.cache.donor_ttl_floor_secs),
        ));

        Self {
            answer_cache,
            upstream,
            cdn,
            patch_policy,
            default_upstream: settings.default_upstream.clone(),
        }
    }

    pub fn default_upstream(&self) -> &str {
        &self.default_upstream
    }

    /// Validates and normalizes a caller-supplied `{upstream}` path
    /// override. Only `https://` URLs are accepted.
    pub fn validate_upstream_override(upstream: &str) -> Result<(), ProxyError> {
        if upstream.starts_with("https://") {
            Ok(())
        } else {
            Err(ProxyError::UpstreamRejected {
                url: upstream.to_string(),
            })
        }
    }

    /// Runs the full DoH pipeline for a wire-format query, returning the
    /// wire-format reply.
    pub async fn handle_doh(&self, query_bytes: &[u8], upstream: &str) -> Result<Vec<u8>, ProxyError> {
        let query = Message::from_bytes(query_bytes).map_err(|e| ProxyError::MalformedQuery {
            message: e.to_string(),
        })?;

        let question = query
            .queries()
            .first()
            .ok_or_else(|| ProxyError::MalformedQuery {
                message: "query carries no question".to_string(),
            })?
            .clone();

        let domain = normalize_name(question.name());
        let qtype = question.query_type();
        let key = CacheKey::new(domain.clone(), qtype, upstream.to_string());

        let rrs = if let Some(cached) = self.answer_cache.get(&key) {
            cached
        } else {
            let fetched = self.upstream.fetch_rrs(&domain, qtype, upstream).await?;
            let patched = self
                .patch_policy
                .apply(&domain, qtype, fetched, &self.cdn, &self.upstream)
                .await;
            self.answer_cache.store(key, patched.clone(), None);
            patched
        };

        let mut reply = Message::new();
        reply
            .set_id(query.id())
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(query.recursion_desired())
            .set_recursion_available(true)
            .add_query(question);
        for rr in rrs {
            reply.add_answer(rr);
        }

        reply.to_bytes().map_err(|e| ProxyError::EncodeFailed {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_query(domain: &str) -> Vec<u8> {
        use hickory_proto::op::Query;
        use hickory_proto::rr::{Name, RecordType};
        use std::str::FromStr;

        let mut message = Message::new();
        message
            .set_id(0x1234)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(Name::from_str(domain).unwrap(), RecordType::A));
        message.to_bytes().unwrap()
    }

    #[test]
    fn rejects_non_https_upstream_override() {
        assert!(AppState::validate_upstream_override("http://1.1.1.1/dns-query").is_err());
        assert!(AppState::validate_upstream_override("https://1.1.1.1/dns-query").is_ok());
    }

    #[tokio::test]
    async fn cache_hit_preserves_transaction_id_and_skips_upstream() {
        let settings = Settings::default();
        let state = AppState::from_settings(&settings);

        let name = hickory_proto::rr::Name::from_utf8("example.com").unwrap();
        let rr = Record::from_rdata(
            name,
            3600,
            hickory_proto::rr::RData::A(hickory_proto::rr::rdata::A(std::net::Ipv4Addr::new(
                93, 184, 216, 34,
            ))),
        );
        let key = CacheKey::new(
            "example.com".to_string(),
            hickory_proto::rr::RecordType::A,
            settings.default_upstream.clone(),
        );
        state.answer_cache.store(key, vec![rr], None);

        let query_bytes = build_query("example.com");
        let reply_bytes = state
            .handle_doh(&query_bytes, &settings.default_upstream)
            .await
            .expect("cache hit should not require network access");

        let reply = Message::from_bytes(&reply_bytes).unwrap();
        assert_eq!(reply.id(), 0x1234);
        assert_eq!(reply.answers().len(), 1);
    }

    #[test]
    fn malformed_query_bytes_are_rejected() {
        let settings = Settings::default();
        let state = AppState::from_settings(&settings);
        let result = tokio_test::block_on(state.handle_doh(&[0xff, 0x00], &settings.default_upstream));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn cached_answer_expires_against_an_injected_clock() {
        use std::sync::Mutex;

        let settings = Settings::default();
        let now = Arc::new(Mutex::new(Instant::now()));
        let clock = now.clone();
        let timer: Timer = Arc::new(move || *clock.lock().unwrap());
        let state = AppState::from_settings_with_timer(&settings, timer);

        let name = hickory_proto::rr::Name::from_utf8("example.com").unwrap();
        let rr = Record::from_rdata(
            name,
            1,
            hickory_proto::rr::RData::A(hickory_proto::rr::rdata::A(std::net::Ipv4Addr::new(
                93, 184, 216, 34,
            ))),
        );
        let key = CacheKey::new(
            "example.com".to_string(),
            hickory_proto::rr::RecordType::A,
            settings.default_upstream.clone(),
        );
        state.answer_cache.store(key.clone(), vec![rr], Some(Duration::from_secs(1)));
        assert!(state.answer_cache.get(&key).is_some());

        *now.lock().unwrap() += Duration::from_secs(2);
        assert!(state.answer_cache.get(&key).is_none());
    }
}
