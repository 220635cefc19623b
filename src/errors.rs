// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Error Taxonomy
//!
//! Every failure the Oura client can produce is mapped into one of the
//! [`ApiError`] kinds below. Callers branch on the kind to decide how to
//! react (re-authorize, back off, treat as empty, retry later); the
//! status code and server-provided detail string carried by each variant
//! are enough to render a user-facing message.

use serde::Deserialize;
use thiserror::Error;

/// Typed failure returned by the Oura API client.
///
/// The client never retries internally beyond the single 401 refresh
/// cycle; `RateLimited` and `ServerError` signal to the caller whether
/// a retry is safe, they do not perform one.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token invalid, expired, or revoked and could not be refreshed.
    #[error("[401] authentication failed: {detail}")]
    Auth { detail: String },

    /// Token is valid but lacks a required scope or the subscription lapsed.
    #[error("[{status}] access forbidden: {detail}")]
    Forbidden { status: u16, detail: String },

    /// No resource at that identifier or date.
    #[error("[{status}] not found: {detail}")]
    NotFound { status: u16, detail: String },

    /// Malformed or rejected request parameters.
    #[error("[{status}] invalid request: {detail}")]
    InvalidRequest { status: u16, detail: String },

    /// API quota exceeded. The client surfaces this immediately; backoff
    /// policy belongs to the caller.
    #[error("[{status}] rate limited: {detail}")]
    RateLimited { status: u16, detail: String },

    /// Upstream 5xx, potentially transient.
    #[error("[{status}] upstream server error: {detail}")]
    ServerError { status: u16, detail: String },

    /// Network-level failure: timeout, connection refused, DNS.
    #[error("request failed: {detail}")]
    Transport { detail: String },

    /// A 2xx response whose body did not parse as the expected shape.
    #[error("malformed response body: {detail}")]
    Protocol { detail: String },
}

impl ApiError {
    /// HTTP status associated with this error, when one exists.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::Forbidden { status, .. }
            | Self::NotFound { status, .. }
            | Self::InvalidRequest { status, .. }
            | Self::RateLimited { status, .. }
            | Self::ServerError { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Protocol { .. } => None,
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::Transport { .. } => "transport",
            Self::Protocol { .. } => "protocol",
        }
    }

    /// Whether a caller may safely retry the same request later.
    pub fn is_retry_safe(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ServerError { .. } | Self::Transport { .. }
        )
    }

    /// Classify a non-2xx response into an error kind, extracting detail
    /// text from the problem payload when the body carries one.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let detail = ProblemDetails::parse(body)
            .map(|p| p.message())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status}")
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            401 => Self::Auth {
                detail: format!(
                    "access token rejected; it may be expired or revoked ({detail})"
                ),
            },
            403 => Self::Forbidden { status, detail },
            404 => Self::NotFound { status, detail },
            400 | 422 => Self::InvalidRequest { status, detail },
            429 => Self::RateLimited { status, detail },
            500..=599 => Self::ServerError { status, detail },
            // Anything else is outside the documented contract; keep the
            // retry-safe signal by treating it as an upstream fault.
            _ => Self::ServerError { status, detail },
        }
    }
}

/// Problem-details shaped error body returned by the Oura API.
///
/// Data endpoints use `status`/`title`/`detail`; the OAuth token endpoint
/// uses `error`/`error_description` instead.
#[derive(Debug, Deserialize)]
pub struct ProblemDetails {
    pub status: Option<u16>,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl ProblemDetails {
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Best human-readable message this payload carries.
    pub fn message(&self) -> String {
        match (&self.title, &self.detail) {
            (Some(title), Some(detail)) => format!("{title}: {detail}"),
            (Some(title), None) => title.clone(),
            (None, Some(detail)) => detail.clone(),
            (None, None) => match (&self.error, &self.error_description) {
                (Some(error), Some(description)) => format!("{error}: {description}"),
                (Some(error), None) => error.clone(),
                (None, Some(description)) => description.clone(),
                (None, None) => self
                    .status
                    .map(|s| format!("HTTP {s}"))
                    .unwrap_or_else(|| "API error".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let forbidden = ApiError::from_response(403, "{}");
        assert!(matches!(forbidden, ApiError::Forbidden { status: 403, .. }));

        let not_found = ApiError::from_response(404, "{}");
        assert!(matches!(not_found, ApiError::NotFound { status: 404, .. }));

        let invalid = ApiError::from_response(422, "{}");
        assert!(matches!(invalid, ApiError::InvalidRequest { status: 422, .. }));

        let bad_request = ApiError::from_response(400, "{}");
        assert!(matches!(bad_request, ApiError::InvalidRequest { status: 400, .. }));

        let limited = ApiError::from_response(429, "{}");
        assert!(matches!(limited, ApiError::RateLimited { status: 429, .. }));

        let upstream = ApiError::from_response(503, "{}");
        assert!(matches!(upstream, ApiError::ServerError { status: 503, .. }));

        let auth = ApiError::from_response(401, "{}");
        assert!(matches!(auth, ApiError::Auth { .. }));
    }

    #[test]
    fn test_problem_details_extraction() {
        let error = ApiError::from_response(
            403,
            r#"{"status": 403, "title": "Forbidden", "detail": "missing scope: daily"}"#,
        );
        match error {
            ApiError::Forbidden { detail, .. } => {
                assert_eq!(detail, "Forbidden: missing scope: daily");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[test]
    fn test_oauth_error_fields() {
        let problem = ProblemDetails::parse(
            r#"{"error": "invalid_grant", "error_description": "refresh token already used"}"#,
        )
        .expect("should parse");
        assert_eq!(problem.message(), "invalid_grant: refresh token already used");
    }

    #[test]
    fn test_non_json_body_falls_back_to_text() {
        let error = ApiError::from_response(500, "Bad Gateway");
        match error {
            ApiError::ServerError { detail, .. } => assert_eq!(detail, "Bad Gateway"),
            other => panic!("expected ServerError, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_body_falls_back_to_status() {
        let error = ApiError::from_response(502, "");
        match error {
            ApiError::ServerError { detail, .. } => assert_eq!(detail, "HTTP 502"),
            other => panic!("expected ServerError, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_safety_signal() {
        assert!(ApiError::from_response(429, "{}").is_retry_safe());
        assert!(ApiError::from_response(500, "{}").is_retry_safe());
        assert!(!ApiError::from_response(403, "{}").is_retry_safe());
        assert!(!ApiError::from_response(401, "{}").is_retry_safe());
    }

    #[test]
    fn test_kind_and_status_accessors() {
        let error = ApiError::from_response(429, "{}");
        assert_eq!(error.kind(), "rate_limited");
        assert_eq!(error.status(), Some(429));

        let transport = ApiError::Transport {
            detail: "connection refused".to_string(),
        };
        assert_eq!(transport.kind(), "transport");
        assert_eq!(transport.status(), None);
    }
}
