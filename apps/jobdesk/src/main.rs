mod backend_client;
mod bot;
mod cli;
mod config;
mod errors;
mod models;
mod panels;
mod render;
mod session;
mod shell;
mod state;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(
        cli.api_url.clone(),
        cli.user_id.clone(),
        cli.email.clone(),
    );

    // Logs go to stderr so stdout carries only rendered output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("jobdesk v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Backend {} (timeout {}s)",
        config.api_url,
        config.request_timeout.as_secs()
    );

    let state = AppState::init(config).await?;
    if state.session.current().is_none() {
        info!("No user configured; set JOBDESK_USER_ID or pass --user-id to sign in");
    }

    cli::run(cli.command, &state).await
}
