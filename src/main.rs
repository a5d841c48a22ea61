use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use secrecy::ExposeSecret;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use safekeys::config::SafekeysConfig;
use safekeys::gate::{spawn_sweeper, Sweep};
use safekeys::http::{AppState, HttpServer};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Password and token utilities behind rate limiting and lockout.
#[derive(Debug, Parser)]
#[command(name = "safekeys", version, about)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "SAFEKEYS_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long, env = "SAFEKEYS_BIND")]
    bind: Option<SocketAddr>,

    /// Log output format
    #[arg(long, env = "SAFEKEYS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting SafeKeys");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = SafekeysConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    info!(
        bind_addr = %config.server.bind_addr,
        environment = %config.server.environment,
        "Configuration loaded"
    );
    if config.pepper.expose_secret().is_empty() {
        warn!("No pepper configured, set SAFEKEYS_PEPPER");
    }

    let state = AppState::from_config(&config)?;
    info!(
        max_requests = config.rate_limiting.max_requests,
        window_secs = config.rate_limiting.window_secs,
        max_failures = config.lockout.max_failures,
        lock_secs = config.lockout.lock_secs,
        "Gates initialized"
    );

    let targets: Vec<Arc<dyn Sweep>> = vec![
        state.rate_limiter.clone() as Arc<dyn Sweep>,
        state.lockout.clone() as Arc<dyn Sweep>,
    ];
    let sweeper = spawn_sweeper(
        targets,
        Duration::from_secs(config.server.sweep_interval_secs),
    );

    let server = HttpServer::bind(config.server.bind_addr, state).await?;
    info!("Listening on http://{}", server.local_addr()?);

    // Run the server with graceful shutdown on Ctrl+C
    server.serve_with_shutdown(shutdown_signal()).await?;

    sweeper.abort();
    info!("SafeKeys stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("safekeys=info,tower_http=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
