//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::api;
use crate::auth::{BcryptHasher, CredentialHasher, SigningKeySource, UserRole};
use crate::cli::{error, info, print_user_table, success, warn, OutputFormat, UserRow};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::error::Error;

/// Write a new storefront-auth.toml configuration file
pub async fn init(force: bool) -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() && !force {
        warn(&format!("{} already exists (use --force to overwrite)", CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content(&random_secret());
    fs::write(config_path, content)?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Add [[users]] entries, then run 'storefront-auth serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = match load(config_path) {
        Ok(config) => config,
        Err(Error::ConfigNotFound) if config_path.is_none() => {
            warn(&format!("No {} found, using defaults", CONFIG_FILENAME));
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server on {}:{}", host, port));
    api::run_server(config, &host, port).await?;
    Ok(())
}

/// Hash a password for a seeded user entry
pub async fn hash_password(config_path: Option<&Path>, password: Option<String>) -> Result<()> {
    let (cost, fallback) = hashing_cost(config_path);
    if let Some(message) = fallback {
        warn(&message);
    }

    let password = match password {
        Some(p) => p,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .context("Failed to read password")?,
    };

    let hash = tokio::task::spawn_blocking(move || BcryptHasher::new(cost).hash(&password))
        .await
        .context("Hashing task failed")??;
    println!("{}", hash);
    Ok(())
}

/// Print a fresh signing secret
pub async fn generate_secret() -> Result<()> {
    println!("{}", random_secret());
    Ok(())
}

/// List seeded users
pub async fn users(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load(config_path)?;
    let rows: Vec<UserRow> = config.users.iter().map(UserRow::from).collect();

    match format {
        OutputFormat::Table => {
            print_user_table(&rows);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&rows)?;
            println!("{}", yaml);
        }
    }

    Ok(())
}

/// Report configuration problems
pub async fn doctor(config_path: Option<&Path>) -> Result<()> {
    info("Checking storefront-auth configuration...\n");

    let config = match load(config_path) {
        Ok(config) => {
            success("Configuration file parsed");
            config
        }
        Err(e) => {
            error(&format!("Configuration: {}", e));
            return Ok(());
        }
    };

    let findings = check_config(&config);
    if findings.is_empty() {
        success("No problems found");
    }
    for finding in &findings {
        match finding.severity {
            Severity::Warning => warn(&finding.message),
            Severity::Info => info(&finding.message),
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

/// Inspect a parsed configuration for risky settings
pub fn check_config(config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    if SigningKeySource::from_config(config.auth.jwt_secret.as_deref()).is_insecure() {
        findings.push(Finding::warning(
            "auth.jwt_secret is not set: tokens would be signed with a built-in key and are forgeable",
        ));
    } else if config.auth.jwt_secret.as_deref().map(str::len).unwrap_or(0) < 32 {
        findings.push(Finding::warning(
            "auth.jwt_secret is shorter than 32 characters",
        ));
    }

    if config.auth.bcrypt_cost < crate::auth::password::DEFAULT_COST {
        findings.push(Finding::warning(format!(
            "auth.bcrypt_cost is {}, below the recommended {}",
            config.auth.bcrypt_cost,
            crate::auth::password::DEFAULT_COST
        )));
    }

    if !config.server.production {
        findings.push(Finding::info(
            "server.production is false: session cookies are not marked Secure",
        ));
    }

    if config.server.trust_forwarded_for {
        findings.push(Finding::info(
            "server.trust_forwarded_for is on: rate limits key on X-Forwarded-For",
        ));
    }

    for user in &config.users {
        if !looks_like_bcrypt(&user.password_hash) {
            findings.push(Finding::warning(format!(
                "user {} has a password_hash that is not a bcrypt hash; login will always fail",
                user.email
            )));
        }
    }

    if !config.users.iter().any(|u| u.role == UserRole::Admin) {
        findings.push(Finding::info("No admin account is seeded"));
    }

    findings
}

/// bcrypt cost from the configuration, or the default plus a warning when it
/// cannot be loaded
fn hashing_cost(config_path: Option<&Path>) -> (u32, Option<String>) {
    match load(config_path) {
        Ok(config) => (config.auth.bcrypt_cost, None),
        Err(e) => {
            let cost = crate::auth::password::DEFAULT_COST;
            (
                cost,
                Some(format!(
                    "Could not load configuration ({}), hashing with cost {}",
                    e, cost
                )),
            )
        }
    }
}

fn looks_like_bcrypt(hash: &str) -> bool {
    hash.len() == 60 && hash.starts_with("$2")
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn load(config_path: Option<&Path>) -> crate::error::Result<Config> {
    match config_path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    }
}
