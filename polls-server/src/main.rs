//! Poll server - HTTP API and live results for classroom polls.

mod error;
mod routes;
mod sse;
mod state;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use polls::app::{load_resolved_config, open_service, open_service_with};
use polls::io::config::PollsConfig;
use polls::io::snapshot::MemoryStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "polls-server")]
#[command(about = "HTTP API and live results for classroom polls")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "polls.toml")]
    config: PathBuf,

    /// Address to bind the server to (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(long)]
    port: Option<u16>,

    /// Keep polls in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,

    /// Directory containing UI static files
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    polls::logging::init("polls=info,polls_server=info");

    let args = Args::parse();
    let cfg = load_resolved_config(&args.config)?;

    let service = if args.ephemeral {
        warn!("ephemeral mode, poll data is not persisted");
        open_service_with(&cfg, Box::new(MemoryStore::new()))?
    } else {
        info!(data = %cfg.data_path.display(), "opening poll data");
        open_service(&cfg)?
    };

    let bind = args.bind.unwrap_or_else(|| cfg.server.bind.clone());
    let port = args.port.unwrap_or(cfg.server.port);
    let base_url = share_base_url(&cfg.base_url, &bind, port);
    info!(base_url = %base_url, "share links");

    let state = AppState::new(
        service,
        base_url,
        Duration::from_secs(cfg.server.keep_alive_secs),
    );

    let api_router = routes::api_router().route("/polls/{id}/stream", get(sse::results_stream));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", api_router)
        .route("/events", get(sse::events_handler));

    match args.ui_dir {
        Some(ui_dir) if ui_dir.exists() => {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        }
        Some(ui_dir) => {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
            app = app.route("/", get(routes::landing));
        }
        None => {
            app = app.route("/", get(routes::landing));
        }
    }

    let app = app.layer(cors).with_state(state);

    let ip: IpAddr = bind.parse()?;
    let addr = SocketAddr::new(ip, port);
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Base of share links. A `base_url` left at its default follows the
/// address actually served; an explicit one is used as written.
fn share_base_url(configured: &str, bind: &str, port: u16) -> String {
    if configured != PollsConfig::default().base_url {
        return configured.to_string();
    }
    let host = match bind {
        "127.0.0.1" | "0.0.0.0" | "::" | "::1" => "localhost".to_string(),
        ipv6 if ipv6.contains(':') => format!("[{ipv6}]"),
        other => other.to_string(),
    };
    format!("http://{host}:{port}")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
