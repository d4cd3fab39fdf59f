//! privacy-button - physical privacy button for UniFi Protect cameras

use anyhow::Context;
use clap::Parser;
use privacy_button::camera_platform::{CameraPlatform, ProtectClient};
use privacy_button::cli::{self, Cli, Command};
use privacy_button::config::validate_upstream;
use privacy_button::lifecycle;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privacy_button=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Exiting with failure");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let upstream = cli.upstream();
    let command = cli.command();

    if command == Command::Run {
        tracing::info!("Starting privacy-button v{}", env!("CARGO_PKG_VERSION"));
        return lifecycle::run_service(&cli.config, &upstream)
            .await
            .context("Button controller failed");
    }

    validate_upstream(&upstream)?;
    let platform: Arc<dyn CameraPlatform> = Arc::new(
        ProtectClient::connect(&upstream)
            .await
            .with_context(|| format!("Could not connect to {}:{}", upstream.host, upstream.port))?,
    );

    if command == Command::Interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        cli::interactive(platform, stdin, &mut std::io::stdout()).await?;
        return Ok(());
    }

    let output = cli::execute(platform, &command).await?;
    print!("{}", output);
    Ok(())
}
