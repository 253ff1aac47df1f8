use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_auth::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => cli::commands::init(force).await,
        Commands::Serve { host, port } => cli::commands::serve(config_path, host, port).await,
        Commands::HashPassword { password } => cli::commands::hash_password(config_path, password).await,
        Commands::GenerateSecret => cli::commands::generate_secret().await,
        Commands::Users { format } => cli::commands::users(config_path, format).await,
        Commands::Doctor => cli::commands::doctor(config_path).await,
    }
}
