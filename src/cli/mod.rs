//! CLI interface for storefront-auth

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "storefront-auth")]
#[command(version)]
#[command(about = "Login, sessions and rate limiting for the storefront", long_about = None)]
pub struct Cli {
    /// Path to storefront-auth.toml (searched upward from the current directory by default)
    #[arg(short, long, global = true, env = "STOREFRONT_AUTH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a storefront-auth.toml with a freshly generated signing secret
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Hash a password for a [[users]] entry
    HashPassword {
        /// Password to hash; prompted for when omitted
        password: Option<String>,
    },

    /// Print a random secret suitable for auth.jwt_secret
    GenerateSecret,

    /// List the seeded user accounts
    Users {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check the configuration for insecure or invalid settings
    Doctor,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
