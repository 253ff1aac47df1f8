//! Authentication middleware and extractors

use crate::api::server::SharedState;
use crate::auth::RoleRequirement;
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

/// Every session token in the request, the Authorization header first and then
/// each named cookie in order. Empty values are skipped.
pub fn candidate_tokens(headers: &HeaderMap, cookie_names: &[&str]) -> Vec<String> {
    let mut tokens = Vec::new();

    if let Some(auth_header) = headers.get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    tokens.push(token.to_string());
                }
            }
        }
    }

    let jar = CookieJar::from_headers(headers);
    tokens.extend(
        cookie_names
            .iter()
            .filter_map(|name| jar.get(name))
            .map(|cookie| cookie.value())
            .filter(|token| !token.is_empty())
            .map(str::to_string),
    );
    tokens
}

/// The first session token in the request
pub fn extract_token(headers: &HeaderMap, cookie_names: &[&str]) -> Option<String> {
    candidate_tokens(headers, cookie_names).into_iter().next()
}

/// Middleware for routes any signed-in account may use.
/// Puts the verified `Claims` into the request extensions.
pub async fn require_user(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let cookies = &state.cookies;
    let tokens = candidate_tokens(
        req.headers(),
        &[cookies.user_name.as_str(), cookies.admin_name.as_str()],
    );

    let mut first_err = None;
    for token in &tokens {
        match state.gate.authenticate(token, RoleRequirement::Any) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                return Ok(next.run(req).await);
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or(Error::TokenInvalid))
}

/// Middleware for admin routes. Re-checks the account against the user store
/// and puts the live `User` record into the request extensions.
pub async fn require_admin(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let tokens = candidate_tokens(req.headers(), &[state.cookies.admin_name.as_str()]);

    let mut first_err = None;
    for token in &tokens {
        match state.gate.authenticate_admin(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
                return Ok(next.run(req).await);
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or(Error::TokenInvalid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_no_token() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers, &["user_token"]).is_none());
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_token(&headers, &["user_token"]).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_extract_cookie_token_in_order() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_static("theme=dark; admin_token=admin.jwt; user_token=user.jwt"),
        );
        assert_eq!(
            extract_token(&headers, &["user_token", "admin_token"]).as_deref(),
            Some("user.jwt")
        );
        assert_eq!(
            extract_token(&headers, &["admin_token"]).as_deref(),
            Some("admin.jwt")
        );
        assert!(extract_token(&headers, &["other"]).is_none());
    }

    #[test]
    fn test_candidate_tokens_lists_every_source() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer bearer.jwt"));
        headers.insert(
            "Cookie",
            HeaderValue::from_static("user_token=; admin_token=admin.jwt"),
        );
        assert_eq!(
            candidate_tokens(&headers, &["user_token", "admin_token"]),
            vec!["bearer.jwt".to_string(), "admin.jwt".to_string()]
        );
    }
}
