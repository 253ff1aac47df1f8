//! Session cookie construction

use axum_extra::extract::cookie::{Cookie, SameSite};
use std::time::Duration;

use crate::auth::SessionScope;
use crate::config::Config;

/// Names, lifetimes and flags of the two session cookies
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub user_name: String,
    pub admin_name: String,
    pub secure: bool,
    pub user_max_age: Duration,
    pub admin_max_age: Duration,
}

impl From<&Config> for CookieSettings {
    fn from(config: &Config) -> Self {
        Self {
            user_name: config.auth.user_cookie.clone(),
            admin_name: config.auth.admin_cookie.clone(),
            secure: config.server.production,
            user_max_age: config.auth.user_session(),
            admin_max_age: config.auth.admin_session(),
        }
    }
}

impl CookieSettings {
    pub fn name(&self, scope: SessionScope) -> &str {
        match scope {
            SessionScope::User => &self.user_name,
            SessionScope::Admin => &self.admin_name,
        }
    }

    /// HTTP-only, SameSite=Strict cookie carrying `token`
    pub fn session_cookie(&self, scope: SessionScope, token: String) -> Cookie<'static> {
        let max_age = match scope {
            SessionScope::User => self.user_max_age,
            SessionScope::Admin => self.admin_max_age,
        };
        let max_age = time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));

        Cookie::build((self.name(scope).to_string(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(max_age)
            .build()
    }

    /// Empty, already-expired cookie that overwrites the session on logout
    pub fn removal_cookie(&self, scope: SessionScope) -> Cookie<'static> {
        Cookie::build((self.name(scope).to_string(), ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(time::Duration::ZERO)
            .build()
    }
}
