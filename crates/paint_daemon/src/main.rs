mod routes;
mod state;
mod tick_loop;

use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "paint_daemon", about = "Paint shop buffer simulation server")]
struct Args {
    /// Line configuration JSON. Defaults to the reference line.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for vehicle streams and run ids. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3001)]
    port: u16,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
    /// Seconds between ticks; overrides the config value.
    #[arg(long)]
    tick_delay: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = paint_world::load_config_or_reference(args.config.as_deref())?;
    if let Some(secs) = args.tick_delay {
        config.tick_delay_secs = secs;
        config.validate().context("applying --tick-delay")?;
    }
    let cors_origin: HeaderValue = args
        .cors_origin
        .parse()
        .with_context(|| format!("parsing --cors-origin {}", args.cors_origin))?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let state = AppState::new(config, seed)?;
    let app = routes::make_router_with_cors(state, cors_origin);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, seed, "paint_daemon listening");
    axum::serve(listener, app).await.context("serving http")?;
    Ok(())
}
