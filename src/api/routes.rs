//! API route handlers

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::net::SocketAddr;

use super::server::{AppState, SharedState};
use crate::auth::models::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use crate::auth::{Claims, IssuedToken, SessionScope, User};
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Identify the caller for rate limiting: peer IP, or the last
/// `X-Forwarded-For` hop when the proxy is trusted. Earlier hops are
/// client-supplied.
pub fn client_id(state: &AppState, addr: SocketAddr, headers: &HeaderMap) -> String {
    if state.config.server.trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    addr.ip().to_string()
}

fn session_response(
    state: &AppState,
    scope: SessionScope,
    jar: CookieJar,
    issued: IssuedToken,
) -> (CookieJar, Json<ApiResponse<LoginResponse>>) {
    let response = LoginResponse {
        user: UserInfo::from(&issued.claims),
        expires_at: issued.claims.exp,
    };
    let jar = jar.add(state.cookies.session_cookie(scope, issued.token));
    (jar, Json(ApiResponse::ok(response)))
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Session routes

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let client = client_id(&state, addr, &headers);
    let issued = state
        .gate
        .login(SessionScope::User, &client, &req.email, &req.password)
        .await?;
    Ok(session_response(&state, SessionScope::User, jar, issued))
}

pub async fn admin_login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let client = client_id(&state, addr, &headers);
    let issued = state
        .gate
        .login(SessionScope::Admin, &client, &req.email, &req.password)
        .await?;
    Ok(session_response(&state, SessionScope::Admin, jar, issued))
}

pub async fn register(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let client = client_id(&state, addr, &headers);
    let issued = state.gate.register(&client, req).await?;
    Ok(session_response(&state, SessionScope::User, jar, issued))
}

pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(state.cookies.removal_cookie(SessionScope::User));
    (jar, Json(ApiResponse::ok("logged out")))
}

pub async fn admin_logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(state.cookies.removal_cookie(SessionScope::Admin));
    (jar, Json(ApiResponse::ok("logged out")))
}

// Authenticated routes

pub async fn me(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(ApiResponse::ok(UserInfo::from(&claims)))
}

pub async fn admin_me(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(ApiResponse::ok(UserInfo::from(user)))
}
