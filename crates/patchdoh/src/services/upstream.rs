//! The pooled DoH client that dispatches queries to the upstream resolver.

use crate::models::dns::CacheKey;
use crate::models::error::ProxyError;
use crate::services::cache::TtlCache;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, Record, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Performs DoH `POST` requests against a configurable upstream resolver and
/// memoizes successful answers.
///
/// Holds a single, connection-pooled [`reqwest::Client`] shared across every
/// request — built once at startup, never per-call.
pub struct UpstreamClient {
    http: reqwest::Client,
    timeout: Duration,
    cache: Arc<TtlCache<CacheKey, Vec<Record>>>,
    max_ttl: Duration,
    default_ttl_on_miss: Duration,
}

impl UpstreamClient {
    /// Builds a client with a pooled `reqwest::Client`, sized the way the
    /// rest of the gateway's HTTP clients are.
    pub fn new(
        timeout: Duration,
        cache: Arc<TtlCache<CacheKey, Vec<Record>>>,
        max_ttl: Duration,
        default_ttl_on_miss: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .timeout(timeout)
            .build()
            .expect("reqwest client configuration is valid");

        Self {
            http,
            timeout,
            cache,
            max_ttl,
            default_ttl_on_miss,
        }
    }

    /// Fetches the Answer-section records for `(domain, qtype)` from
    /// `upstream`, consulting and then populating the answer cache.
    ///
    /// If a fresh cache entry already exists for this key, the upstream
    /// request is skipped entirely.
    pub async fn fetch_rrs(
        &self,
        domain: &str,
        qtype: RecordType,
        upstream: &str,
    ) -> Result<Vec<Record>, ProxyError> {
        let key = CacheKey::new(domain, qtype, upstream);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let query_bytes = build_query(domain, qtype)?;

        let response = self
            .http
            .post(upstream)
            .header("Content-Type", "application/dns-message")
            .header("Accept", "application/dns-message")
            .body(query_bytes)
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamUnavailable {
                url: upstream.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ProxyError::UpstreamMalformed {
                url: upstream.to_string(),
                message: format!("status {}", response.status()),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::UpstreamUnavailable {
                url: upstream.to_string(),
                message: e.to_string(),
            })?;

        let message = Message::from_bytes(&body).map_err(|e| ProxyError::UpstreamMalformed {
            url: upstream.to_string(),
            message: e.to_string(),
        })?;

        let rrs: Vec<Record> = message.answers().to_vec();
        let ttl = min_address_ttl(&rrs).unwrap_or_else(|| self.default_ttl_on_miss.as_secs() as u32);
        self.cache.store(
            key,
            rrs.clone(),
            Some(Duration::from_secs(ttl as u64).min(self.max_ttl)),
        );

        Ok(rrs)
    }

    /// Timeout applied to each upstream request, for callers that need to
    /// report it (e.g. the config validator).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Smallest TTL among the A/AAAA records in `rrs`, or `None` if there are
/// none.
fn min_address_ttl(rrs: &[Record]) -> Option<u32> {
    rrs.iter()
        .filter(|r| matches!(r.record_type(), RecordType::A | RecordType::AAAA))
        .map(|r| r.ttl())
        .min()
}

fn build_query(domain: &str, qtype: RecordType) -> Result<Vec<u8>, ProxyError> {
    let name = Name::from_str(domain).map_err(|e| ProxyError::MalformedQuery {
        message: format!("invalid domain {domain}: {e}"),
    })?;

    let mut message = Message::new();
    message
        .set_id(0)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, qtype));

    message.to_bytes().map_err(|e| ProxyError::EncodeFailed {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::RData;
    use std::net::Ipv4Addr;

    #[test]
    fn builds_a_well_formed_query() {
        let bytes = build_query("example.com", RecordType::A).unwrap();
        let message = Message::from_bytes(&bytes).unwrap();
        assert_eq!(message.queries().len(), 1);
        assert_eq!(message.queries()[0].query_type(), RecordType::A);
    }

    #[test]
    fn min_address_ttl_ignores_non_address_records() {
        let name = Name::from_str("example.com.").unwrap();
        let a = Record::from_rdata(name.clone(), 120, RData::A(A(Ipv4Addr::new(1, 2, 3, 4))));
        let ns = Record::from_rdata(name, 99999, RData::NS(Name::from_str("ns1.example.com.").unwrap()));
        assert_eq!(min_address_ttl(&[a, ns]), Some(120));
    }

    #[test]
    fn min_address_ttl_is_none_without_address_records() {
        let name = Name::from_str("example.com.").unwrap();
        let ns = Record::from_rdata(name, 300, RData::NS(Name::from_str("ns1.example.com.").unwrap()));
        assert_eq!(min_address_ttl(&[ns]), None);
    }
}
