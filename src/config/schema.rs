//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::models::UserRole;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Accounts loaded into the in-memory user store at startup
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Marks session cookies `Secure`
    #[serde(default)]
    pub production: bool,

    /// Use the last `X-Forwarded-For` entry, the one appended by the reverse
    /// proxy, as the client identity. Only enable behind exactly one proxy.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3457
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            production: false,
            trust_forwarded_for: false,
        }
    }
}

/// Token, cookie and hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Leaving it unset starts the server
    /// with a built-in key and a warning.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_user_session_days")]
    pub user_session_days: u32,

    #[serde(default = "default_admin_session_hours")]
    pub admin_session_hours: u32,

    #[serde(default = "default_user_cookie")]
    pub user_cookie: String,

    #[serde(default = "default_admin_cookie")]
    pub admin_cookie: String,

    /// Answer 403 instead of 401 when an admin login has the right password
    /// but the account is not an admin
    #[serde(default)]
    pub reveal_admin_role_mismatch: bool,
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_user_session_days() -> u32 {
    7
}

fn default_admin_session_hours() -> u32 {
    24
}

fn default_user_cookie() -> String {
    "user_token".to_string()
}

fn default_admin_cookie() -> String {
    "admin_token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            bcrypt_cost: default_bcrypt_cost(),
            user_session_days: default_user_session_days(),
            admin_session_hours: default_admin_session_hours(),
            user_cookie: default_user_cookie(),
            admin_cookie: default_admin_cookie(),
            reveal_admin_role_mismatch: false,
        }
    }
}

impl AuthConfig {
    pub fn user_session(&self) -> Duration {
        Duration::from_secs(u64::from(self.user_session_days) * 24 * 60 * 60)
    }

    pub fn admin_session(&self) -> Duration {
        Duration::from_secs(u64::from(self.admin_session_hours) * 60 * 60)
    }
}

/// A limit of `limit` requests per `window_secs`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitRule {
    pub limit: u32,
    pub window_secs: u64,
}

impl RateLimitRule {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limit settings for the credential endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_rule")]
    pub login: RateLimitRule,

    #[serde(default = "default_register_rule")]
    pub register: RateLimitRule,

    /// Store size at which admitting a new key sweeps expired entries
    #[serde(default = "default_eviction_threshold")]
    pub eviction_threshold: usize,
}

fn default_login_rule() -> RateLimitRule {
    RateLimitRule {
        limit: 5,
        window_secs: 15 * 60,
    }
}

fn default_register_rule() -> RateLimitRule {
    RateLimitRule {
        limit: 3,
        window_secs: 60 * 60,
    }
}

fn default_eviction_threshold() -> usize {
    10_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: default_login_rule(),
            register: default_register_rule(),
            eviction_threshold: default_eviction_threshold(),
        }
    }
}

/// A user record declared in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub email: String,

    pub name: String,

    /// bcrypt hash, as printed by `storefront-auth hash-password`
    pub password_hash: String,

    #[serde(default = "default_seed_role")]
    pub role: UserRole,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub avatar: Option<String>,
}

fn default_seed_role() -> UserRole {
    UserRole::User
}
