mod api;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use dutybot_channels::{ChannelAdapter, LineAdapter, LineClient, LineConfig};
use dutybot_config::BotConfig;

use api::AppState;

#[derive(Parser)]
#[command(name = "dutybot")]
#[command(about = "dutybot: weekly duty rotation bot for LINE")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to bind the HTTP server to (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print this week's duty owner without starting the server
    Who {
        /// Instant to evaluate, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Query the health endpoint of a running instance
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = dutybot_config::from_env().context("Failed to read configuration from environment")?;

    dutybot_logging::init_logger(&config.log_level, config.log_dir.as_deref());

    match cli.command {
        Commands::Serve { port } => {
            let config = BotConfig {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Who { at } => {
            let rotation = config.rotation().context("Invalid duty rotation settings")?;
            let snapshot = rotation.snapshot_at(at.unwrap_or_else(Utc::now));
            println!(
                "Week {} ({}): {} is on duty, previous was {}",
                snapshot.week,
                rotation.time_zone().name(),
                snapshot.on_duty,
                snapshot.previous
            );
        }
        Commands::Status => {
            println!("dutybot status: checking...");
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("dutybot is not running on port {}", config.port);
                }
            }
        }
    }

    Ok(())
}

async fn run_server(config: BotConfig) -> Result<()> {
    let config = dutybot_config::ensure_valid(config)?;
    info!(config = %dutybot_config::redact(&config), "Starting dutybot");

    // Roster and time zone are checked here, before any traffic is accepted.
    let rotation = config.rotation().context("Invalid duty rotation settings")?;
    info!(
        roster = %rotation.roster(),
        time_zone = rotation.time_zone().name(),
        "Duty rotation ready"
    );

    let client = LineClient::new(&config.channel_access_token, &config.api_base_url)
        .context("Failed to build LINE API client")?;
    let adapter = LineAdapter::new(
        LineConfig {
            channel_secret: config.channel_secret.clone(),
            webhook_path: config.webhook_path.clone(),
        },
        rotation.clone(),
        Arc::new(client),
    );
    adapter.start().await?;
    info!(adapter = adapter.name(), "Registered channel adapter");

    let app_state = Arc::new(AppState {
        rotation,
        started_at: Instant::now(),
    });
    let app = api::build_router(app_state, adapter.build_router()).layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, webhook = %config.webhook_path, "HTTP server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
