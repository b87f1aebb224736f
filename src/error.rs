//! Proxy error definitions.
//!
//! Error details are for logs; responses carry only a status and a generic
//! body so upstream internals never leak to the page.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while handling a proxied collection request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No route matched the request path. Expected; maps to 404.
    #[error("no route matches {0}")]
    RouteMiss(String),

    /// A route matched but its vendor config is missing. Maps to 500; the
    /// proxy never forwards unprotected.
    #[error("vendor config missing for route {0}")]
    MissingConfig(String),

    /// The upstream target URL could not be built.
    #[error("invalid upstream target: {0}")]
    BadTarget(String),

    /// Upstream request timed out. Maps to 504 (or 204 on beacon paths).
    #[error("upstream timeout after {0} seconds")]
    UpstreamTimeout(u64),

    /// Upstream request failed. Maps to 502 (or 204 on beacon paths).
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RouteMiss(_) => StatusCode::NOT_FOUND,
            ProxyError::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BadTarget(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::NOT_FOUND => "no matching route",
            StatusCode::GATEWAY_TIMEOUT => "upstream timeout",
            StatusCode::BAD_GATEWAY => "upstream request failed",
            _ => "internal error",
        };
        (status, body).into_response()
    }
}
