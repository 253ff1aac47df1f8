//! Configuration file tests
//! Loads storefront-auth.toml from disk and checks the error paths
//!
//! Run with: cargo test --test config_tests

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use storefront_auth::api::build_state;
use storefront_auth::auth::{InMemoryUserStore, UserRole, UserStore};
use storefront_auth::config::{load_config_from_path, loader::default_config_content};
use storefront_auth::Error;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = TempDir::new().unwrap();
    let result = load_config_from_path(&dir.path().join("storefront-auth.toml"));
    assert!(matches!(result, Err(Error::ConfigNotFound)));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront-auth.toml");
    fs::write(&path, "this is [ not valid toml").unwrap();

    let result = load_config_from_path(&path);
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_generated_config_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront-auth.toml");
    fs::write(&path, default_config_content("0123456789abcdef")).unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.auth.bcrypt_cost, 12);
    assert_eq!(config.rate_limit.login.limit, 5);
    assert_eq!(config.rate_limit.login.window_secs, 900);
    assert!(config.auth.jwt_secret.is_some());
}

#[test]
fn test_invalid_values_are_config_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront-auth.toml");
    fs::write(&path, "[auth]\nbcrypt_cost = 40\n").unwrap();

    let result = load_config_from_path(&path);
    assert!(matches!(result, Err(Error::Config(_))));
}

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn test_seeded_users_are_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storefront-auth.toml");
    fs::write(
        &path,
        r#"
[auth]
jwt_secret = "seed-test-secret"

[[users]]
email = "Owner@Example.com"
name = "Owner"
password_hash = "$2b$04$C6UzMDM.H6dfI/f/IKcEeO5A6yFZ6CQ0zj8HRSMsGk4bAYJQqcJAG"
role = "admin"

[[users]]
email = "shopper@example.com"
name = "Shopper"
password_hash = "$2b$04$C6UzMDM.H6dfI/f/IKcEeO5A6yFZ6CQ0zj8HRSMsGk4bAYJQqcJAG"
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    let store = InMemoryUserStore::from_seed(&config.users).unwrap();
    assert_eq!(store.user_count().await, 2);

    let owner = store.find_by_email("owner@example.com").await.unwrap().unwrap();
    assert_eq!(owner.role, UserRole::Admin);
    let shopper = store.find_by_email("shopper@example.com").await.unwrap().unwrap();
    assert_eq!(shopper.role, UserRole::User);

    // State builds from the same config without touching the network
    let state = build_state(config, Arc::new(store));
    assert_eq!(state.gate.policy().login.limit, 5);
}

#[test]
fn test_duplicate_seed_email_is_rejected() {
    let config = storefront_auth::config::parse_config(
        r#"
[[users]]
email = "dup@example.com"
name = "One"
password_hash = "x"

[[users]]
email = "DUP@example.com"
name = "Two"
password_hash = "y"
"#,
    )
    .unwrap();

    let result = InMemoryUserStore::from_seed(&config.users);
    assert!(matches!(result, Err(Error::Config(_))));
}
