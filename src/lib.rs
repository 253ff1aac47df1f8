//! storefront-auth - access control for the storefront
//!
//! Password hashing, signed session tokens, login rate limiting and the
//! gate that combines them, plus the HTTP routes that expose them.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;

pub use auth::AccessGate;
pub use config::Config;
pub use error::Error;
