//! Bypass rules and the CDN answer-patching policy.

use crate::models::dns::normalize_name;
use crate::services::cdn::CdnMatcher;
use crate::services::upstream::UpstreamClient;
use hickory_proto::rr::{Record, RecordType};
use std::time::Duration;

/// Hosts that must never be patched, regardless of CDN membership.
///
/// A pattern starting with `.` matches any name ending in that suffix
/// (dot-anchored); any other pattern must match exactly.
const BYPASS_LIST: &[&str] = &[
    "prod.api.letsencrypt.org",
    "cloudflare.com",
    "speed.cloudflare.com",
    "shops.myshopify.com",
    ".cdn.cloudflare.net",
    ".pacloudflare.com",
];

fn matches_bypass(name: &str) -> bool {
    BYPASS_LIST.iter().any(|pattern| {
        if let Some(suffix) = pattern.strip_prefix('.') {
            name == suffix || name.ends_with(&format!(".{suffix}"))
        } else {
            name == *pattern
        }
    })
}

/// `true` iff `domain` or any CNAME/NS record's rdata in `rrs` matches
/// [`BYPASS_LIST`].
pub fn should_bypass(domain: &str, rrs: &[Record]) -> bool {
    if matches_bypass(domain) {
        return true;
    }
    rrs.iter().any(|rr| match rr.data() {
        Some(hickory_proto::rr::RData::CNAME(name)) => matches_bypass(&normalize_name(name)),
        Some(hickory_proto::rr::RData::NS(name)) => matches_bypass(&normalize_name(name)),
        _ => false,
    })
}

/// First A/AAAA record's textual address, in order of appearance.
fn first_address(rrs: &[Record]) -> Option<String> {
    rrs.iter().find_map(|rr| match rr.data() {
        Some(hickory_proto::rr::RData::A(addr)) => Some(addr.0.to_string()),
        Some(hickory_proto::rr::RData::AAAA(addr)) => Some(addr.0.to_string()),
        _ => None,
    })
}

/// Decides whether `rrs` (the Answer section for `domain`/`qtype`) should be
/// rewritten, and performs the rewrite.
///
/// Patching only ever applies to `qtype` `A`/`AAAA`; other qtypes are
/// returned unchanged without even consulting the CDN matcher or the donor.
pub struct PatchPolicy {
    donor_domain: String,
    default_upstream: String,
    donor_ttl_floor: Duration,
}

impl PatchPolicy {
    pub fn new(donor_domain: String, default_upstream: String, donor_ttl_floor: Duration) -> Self {
        Self {
            donor_domain,
            default_upstream,
            donor_ttl_floor,
        }
    }

    /// Applies the patch policy, returning the (possibly rewritten) Answer
    /// section. Non-address records are always preserved verbatim.
    pub async fn apply(
        &self,
        domain: &str,
        qtype: RecordType,
        rrs: Vec<Record>,
        cdn: &CdnMatcher,
        upstream_client: &UpstreamClient,
    ) -> Vec<Record> {
        if !matches!(qtype, RecordType::A | RecordType::AAAA) {
            return rrs;
        }
        if should_bypass(domain, &rrs) {
            return rrs;
        }

        let Some(first_ip) = first_address(&rrs) else {
            return rrs;
        };

        if !cdn.is_cdn_ip(&first_ip) {
            return rrs;
        }

        let donor_rrs = match upstream_client
            .fetch_rrs(&self.donor_domain, qtype, &self.default_upstream)
            .await
        {
            Ok(rrs) => rrs,
            // the donor is unreachable: fail safe and serve the original answer
            Err(_) => return rrs,
        };

        let mut patched: Vec<Record> = rrs
            .into_iter()
            .filter(|rr| !matches!(rr.record_type(), RecordType::A | RecordType::AAAA))
            .collect();

        let query_name = match hickory_proto::rr::Name::from_utf8(domain) {
            Ok(name) => name,
            Err(_) => return patched,
        };

        for donor_rr in donor_rrs
            .iter()
            .filter(|rr| matches!(rr.record_type(), RecordType::A | RecordType::AAAA))
        {
            let ttl = donor_rr.ttl().max(self.donor_ttl_floor.as_secs() as u32);
            if let Some(data) = donor_rr.data() {
                patched.push(Record::from_rdata(query_name.clone(), ttl, data.clone()));
            }
        }

        patched
    }
}
