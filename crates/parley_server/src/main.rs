use anyhow::Result;
use clap::Parser;
use parley_server::{
    ObservabilityConfig, ParleyConfig, build_from_config, create_router, init_observability,
    spawn_cache_sweeper,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Parley streaming chat server", long_about = None)]
struct Args {
    /// Configuration file replacing ./parley.toml
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind_addr)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_observability(&ObservabilityConfig {
        log_level: args.log_level.clone(),
        json_logs: args.json_logs,
    })?;

    let mut config = ParleyConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    config.validate()?;

    let (state, cache) = build_from_config(&config).await?;
    let sweeper = spawn_cache_sweeper(
        cache,
        Duration::from_secs(config.cache.sweep_interval_secs),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(
        addr = %listener.local_addr()?,
        model = %config.provider.default_model,
        auth = ?config.auth.mode,
        cache_ttl = config.cache.default_ttl,
        "Starting Parley server"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
