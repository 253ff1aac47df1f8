//! Configuration loading and environment variable interpolation

use crate::auth::password::{MAX_COST, MIN_COST};
use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "storefront-auth.toml";

/// Load configuration from storefront-auth.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    parse_config(&content)
}

/// Parse configuration text, interpolating environment variables first
pub fn parse_config(content: &str) -> Result<Config> {
    let content = interpolate_env_vars(content);
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
pub fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if !(MIN_COST..=MAX_COST).contains(&config.auth.bcrypt_cost) {
        return Err(Error::Config(format!(
            "auth.bcrypt_cost must be between {} and {}",
            MIN_COST, MAX_COST
        )));
    }
    if config.auth.user_session_days == 0 || config.auth.admin_session_hours == 0 {
        return Err(Error::Config("session lifetimes must be non-zero".to_string()));
    }
    if config.auth.user_cookie == config.auth.admin_cookie {
        return Err(Error::Config(
            "auth.user_cookie and auth.admin_cookie must differ".to_string(),
        ));
    }
    for (name, rule) in [
        ("login", &config.rate_limit.login),
        ("register", &config.rate_limit.register),
    ] {
        if rule.limit == 0 || rule.window_secs == 0 {
            return Err(Error::Config(format!(
                "rate_limit.{} needs a non-zero limit and window",
                name
            )));
        }
    }
    Ok(())
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // This regex is a compile-time constant, panicking is acceptable here
    // as it indicates a programming error in the codebase, not a runtime issue
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content with the given signing secret
pub fn default_config_content(secret: &str) -> String {
    format!(
        r#"# storefront-auth configuration

[server]
host = "0.0.0.0"
port = 3457
production = false
# Only enable behind a single reverse proxy that appends the client address to X-Forwarded-For
trust_forwarded_for = false

[auth]
# Override with STOREFRONT_JWT_SECRET in production
jwt_secret = "${{STOREFRONT_JWT_SECRET:-{secret}}}"
bcrypt_cost = 12
user_session_days = 7
admin_session_hours = 24
user_cookie = "user_token"
admin_cookie = "admin_token"

[rate_limit]
login = {{ limit = 5, window_secs = 900 }}
register = {{ limit = 3, window_secs = 3600 }}
eviction_threshold = 10000

# Seed accounts. Generate hashes with 'storefront-auth hash-password'.
# [[users]]
# email = "admin@example.com"
# name = "Admin"
# role = "admin"
# password_hash = "$2b$12$..."
"#
    )
}
