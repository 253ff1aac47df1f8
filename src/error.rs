//! Error types for storefront-auth

use axum::{
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Too many attempts, retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        /// `Retry-After` and `X-RateLimit-*` pairs from the rejected admission
        headers: Vec<(&'static str, String)>,
    },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    /// Tampered, malformed and expired tokens all end up here.
    #[error("Authentication required")]
    TokenInvalid,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found. Run 'storefront-auth init' first.")]
    ConfigNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Failed to sign token: {0}")]
    TokenIssue(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// HTTP status a handler should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::InvalidCredentials | Error::TokenInvalid => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::EmailTaken => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to an unauthenticated client
    pub fn public_message(&self) -> String {
        match self {
            Error::RateLimited { .. }
            | Error::InvalidCredentials
            | Error::Forbidden
            | Error::TokenInvalid
            | Error::EmailTaken
            | Error::Validation(_) => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.public_message(),
        }));

        match self {
            Error::RateLimited { headers, .. } => {
                (status, AppendHeaders(headers), body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdmitResult;
    use axum::http::header;
    use chrono::{TimeZone, Utc};

    fn rate_limited(retry_after_secs: u64) -> Error {
        let reset_at = Utc.timestamp_opt(1_700_000_900, 0).unwrap();
        let admit = AdmitResult {
            allowed: false,
            limit: 5,
            remaining: 0,
            reset_at,
        };
        let now = reset_at - chrono::Duration::seconds(retry_after_secs as i64);
        Error::RateLimited {
            retry_after_secs: admit.retry_after_secs(now),
            headers: admit.headers(now),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            rate_limited(3).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(Error::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::TokenInvalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            Error::Config("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = Error::Config("jwt secret at /etc/secret unreadable".into());
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_rate_limited_message() {
        let err = rate_limited(42);
        assert_eq!(err.public_message(), "Too many attempts, retry after 42s");
    }

    #[test]
    fn test_rate_limited_response_has_retry_after() {
        let response = rate_limited(7).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "7");
        assert_eq!(response.headers()["x-ratelimit-limit"], "5");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
        assert_eq!(response.headers()["x-ratelimit-reset"], "1700000900");
    }
}
