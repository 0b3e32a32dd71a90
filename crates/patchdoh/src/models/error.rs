//! Proxy error types and their HTTP response mapping.
//!
//! [`ProxyError`] is the single error type returned by the DoH pipeline
//! (upstream dispatch, wire-format decoding, and request validation). It
//! implements [`actix_web::ResponseError`] so handlers can propagate it with
//! `?` and still produce the status codes the wire protocol calls for.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the DoH request pipeline.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The incoming query could not be decoded: bad base64 on `GET`, or an
    /// unparsable DNS message on either method.
    #[error("malformed query: {message}")]
    MalformedQuery { message: String },

    /// A `POST` request arrived without `Content-Type`/`Accept:
    /// application/dns-message`.
    #[error("unsupported media type")]
    UnsupportedMedia,

    /// The `{upstream}` path override was not a valid `https://` URL.
    #[error("rejected upstream override: {url}")]
    UpstreamRejected { url: String },

    /// The upstream resolver could not be reached or timed out.
    #[error("upstream {url} unavailable: {message}")]
    UpstreamUnavailable { url: String, message: String },

    /// The upstream resolver returned a non-2xx status or an unparsable body.
    #[error("upstream {url} returned a malformed response: {message}")]
    UpstreamMalformed { url: String, message: String },

    /// The DNS message could not be re-encoded for the HTTP response.
    #[error("failed to encode response: {message}")]
    EncodeFailed { message: String },
}

/// JSON body returned alongside an error status code.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MalformedQuery { .. } => StatusCode::BAD_REQUEST,
            ProxyError::UnsupportedMedia => StatusCode::NOT_ACCEPTABLE,
            ProxyError::UpstreamRejected { .. } => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamMalformed { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::EncodeFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_query_maps_to_400() {
        let err = ProxyError::MalformedQuery {
            message: "bad base64".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsupported_media_maps_to_406() {
        assert_eq!(
            ProxyError::UnsupportedMedia.status_code(),
            StatusCode::NOT_ACCEPTABLE
        );
    }

    #[test]
    fn upstream_unavailable_maps_to_502() {
        let err = ProxyError::UpstreamUnavailable {
            url: "https://1.1.1.1/dns-query".into(),
            message: "timed out".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
