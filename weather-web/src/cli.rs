use std::net::SocketAddr;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use log::{error, info};
use tokio::{net::TcpListener, signal};
use weather_core::{Config, ProviderId};
use weather_web::{app, build_app_state, get_log_level, setup_logger};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-web", version, about = "City weather web page")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server.
    Serve {
        /// Host to listen on (use 0.0.0.0 for all interfaces).
        #[arg(long, env = "WEATHER_WEB_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, env = "WEATHER_WEB_PORT", default_value_t = 3000)]
        port: u16,

        /// Directory served under /static.
        #[arg(long, env = "WEATHER_WEB_STATIC_DIR", default_value = "./static")]
        static_dir: String,

        /// Log level: trace, debug, info, warn, error.
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Store the API key for a provider in the config file.
    Configure {
        /// Provider short name: "opencage" or "openweather".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { host, port, static_dir, level } => {
                serve(&host, port, static_dir, level.as_deref()).await
            }
            Command::Configure { provider } => configure(&provider),
        }
    }
}

async fn serve(host: &str, port: u16, static_dir: String, level: Option<&str>) -> anyhow::Result<()> {
    let log_level = get_log_level(level);
    setup_logger()
        .level(log_level)
        .level_for("weather_core", log_level)
        .level_for("weather_web", log_level)
        .level_for("http_request", log_level)
        .level_for("http_response", log_level)
        .apply()?;

    let config = Config::load_with_env()?;

    let socket_addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow!("invalid address: {}", e))?;

    let app_state = build_app_state(&config, static_dir.clone()).map_err(|e| {
        error!("error building app: {:#}", e);
        e
    })?;

    let listener = TcpListener::bind(socket_addr)
        .await
        .with_context(|| format!("error binding to {socket_addr}"))?;

    info!("Weather page starting...");
    info!("  Listen:   http://{}", socket_addr);
    info!("  Static:   {}", static_dir);
    info!("  Timezone: {}", app_state.handler.timezone());

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    config.upsert_provider_api_key(id, api_key.to_string());
    config.save()?;

    println!(
        "Saved {id} key to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutting down");
}
