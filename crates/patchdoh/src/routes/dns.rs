//! `GET`/`POST /dns-query[/{upstream}]` — the RFC 8484 DoH surface.
//!
//! These handlers own only the HTTP-layer concerns (base64url decoding,
//! content negotiation, the optional upstream path override) and delegate
//! the DNS pipeline itself to [`crate::services::handler::AppState`].

use crate::models::error::ProxyError;
use crate::services::handler::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::Deserialize;

const DNS_MESSAGE_MIME: &str = "application/dns-message";

#[derive(Deserialize)]
struct DnsQueryParams {
    dns: String,
}

/// Registers the DoH routes under the app's root scope.
pub fn configure_dns(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/dns-query")
            .route(web::get().to(handle_get))
            .route(web::post().to(handle_post)),
    )
    .service(
        web::resource("/dns-query/{upstream:.*}")
            .route(web::get().to(handle_get_override))
            .route(web::post().to(handle_post_override)),
    );
}

async fn handle_get(
    state: web::Data<AppState>,
    params: web::Query<DnsQueryParams>,
) -> Result<HttpResponse, ProxyError> {
    respond(&state, decode_get_param(&params.dns)?, state.default_upstream()).await
}

async fn handle_post(state: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> Result<HttpResponse, ProxyError> {
    require_dns_message_media_type(&req)?;
    respond(&state, body.to_vec(), state.default_upstream()).await
}

async fn handle_get_override(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<DnsQueryParams>,
) -> Result<HttpResponse, ProxyError> {
    let upstream = path.into_inner();
    AppState::validate_upstream_override(&upstream)?;
    respond(&state, decode_get_param(&params.dns)?, &upstream).await
}

async fn handle_post_override(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ProxyError> {
    require_dns_message_media_type(&req)?;
    let upstream = path.into_inner();
    AppState::validate_upstream_override(&upstream)?;
    respond(&state, body.to_vec(), &upstream).await
}

async fn respond(state: &AppState, query_bytes: Vec<u8>, upstream: &str) -> Result<HttpResponse, ProxyError> {
    let reply_bytes = state.handle_doh(&query_bytes, upstream).await?;
    Ok(HttpResponse::Ok()
        .content_type(DNS_MESSAGE_MIME)
        .body(reply_bytes))
}

/// Decodes a `GET` query's `dns` parameter: base64url, padded with `=` up to
/// a multiple of 4 if the caller omitted padding (both are legal under RFC
/// 8484, but `=`-padded input is what the decoder below requires).
fn decode_get_param(raw: &str) -> Result<Vec<u8>, ProxyError> {
    let mut padded = raw.to_string();
    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| ProxyError::MalformedQuery {
            message: format!("invalid base64 in dns parameter: {e}"),
        })
}

/// A `POST` request must advertise the DNS wire format on either
/// `Content-Type` or `Accept`; otherwise the request is rejected with 406.
fn require_dns_message_media_type(req: &HttpRequest) -> Result<(), ProxyError> {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    let accept = req.headers().get("accept").and_then(|v| v.to_str().ok());

    let ok = content_type == Some(DNS_MESSAGE_MIME) || accept == Some(DNS_MESSAGE_MIME);
    if ok {
        Ok(())
    } else {
        Err(ProxyError::UnsupportedMedia)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_unpadded_base64url() {
        // "abc" -> base64url "YWJj" (already a multiple of 4, no padding needed)
        let decoded = decode_get_param("YWJj").unwrap();
        assert_eq!(decoded, b"abc");
    }

    #[test]
    fn pads_base64url_missing_padding() {
        // "ab" -> base64url without padding is "YWI" (7 chars, needs one '=')
        let decoded = decode_get_param("YWI").unwrap();
        assert_eq!(decoded, b"ab");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_get_param("not valid base64!!!").is_err());
    }
}
