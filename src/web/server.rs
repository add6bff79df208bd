use anyhow::{Context, Result};
use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, ApiError, SharedState};
use super::embedded::Assets;

/// Configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Permissive CORS for front-end development against another origin.
    pub dev_mode: bool,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            dev_mode: false,
            open_browser: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the full application router: page, event stream and static assets.
pub fn build_router(state: SharedState) -> Router {
    api::api_router()
        .route("/static/{*path}", get(static_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assets reachable under `/static`; the page template and sample context
/// are only used server-side.
const STATIC_ASSETS: [&str; 2] = ["app.js", "style.css"];

/// Serve an embedded asset by path.
async fn static_handler(Path(path): Path<String>) -> Response {
    let asset = STATIC_ASSETS
        .contains(&path.as_str())
        .then(|| Assets::get(&path))
        .flatten();
    match asset {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => ApiError::NotFound(format!("Asset {} not found", path)).into_response(),
    }
}

/// Start the web server and run until Ctrl-C.
pub async fn start_server(config: ServerConfig, state: SharedState) -> Result<()> {
    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    let url = format!("http://{}", local_addr);
    tracing::info!(%url, dev_mode = config.dev_mode, "server listening");
    println!("Proposal generator running at {}", url);

    if config.open_browser
        && let Err(err) = open::that(&url)
    {
        tracing::warn!(error = %err, "failed to open browser");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}
