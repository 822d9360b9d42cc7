use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use yt_oauth::{ClientSecrets, OAuthConfig, start_auth_flow};

/// OAuth 2.0 helper: authorize this tool against your YouTube account and save the token
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Client secrets JSON downloaded from the Google Cloud console
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Path to save the OAuth token file
    #[arg(long, default_value = "token.json")]
    token_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("yt_oauth=info")),
        )
        .init();

    let args = Args::parse();

    let secrets = ClientSecrets::load(&args.credentials)
        .with_context(|| format!("failed to load '{}'", args.credentials.display()))?;
    let config = OAuthConfig::from_secrets(&secrets);

    let token = start_auth_flow(&config)
        .await
        .context("authorization failed")?;
    token
        .save_to_file(&args.token_path)
        .context("failed to save token")?;

    info!(path = %args.token_path.display(), "OAuth token saved");
    eprintln!("You can now run yt-automation with --token {}", args.token_path.display());

    Ok(())
}
