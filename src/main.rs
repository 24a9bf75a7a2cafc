mod anomaly;
mod app;
mod auth;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod rpc;
mod state;

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::rpc::AdminRpc;
use crate::state::AppState;

// this is main async function with tokio
#[tokio::main]
async fn main() -> ExitCode {
    // parse cli arguments
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (rate_config, sweep_every) = match (args.rate_limit_config(), args.sweep_every()) {
        (Ok(rate), Ok(sweep)) => (rate, sweep),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let rpc = match AdminRpc::new(&args.database_url, args.service_key.clone(), args.upstream_timeout()) {
        Ok(rpc) => rpc,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build admin database client");
            return ExitCode::FAILURE;
        }
    };

    // limiter lives for the whole process, sweeper stops with it
    let rate_limiter = Arc::new(RateLimiter::new(rate_config));
    let sweeper = rate_limiter.spawn_sweeper(sweep_every);

    let state = Arc::new(AppState {
        rpc,
        rate_limiter,
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(port = args.port, "REcontrol gateway running");
    tracing::info!(database = %state.rpc.base_url(), "Forwarding admin RPCs");
    tracing::info!(
        max_requests = rate_config.max_requests,
        window_ms = rate_config.window.as_millis() as u64,
        "Admin write rate limit"
    );

    let served = axum::serve(listener, app::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await;

    sweeper.shutdown().await;

    if let Err(e) = served {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
