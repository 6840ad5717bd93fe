//! HTTP health surface
//!
//! - `GET /`: human-readable status page
//! - `GET /health`: JSON `{ "status", "uptime", "sessionPresent" }`
//!
//! Read-only: nothing here can change the bot's state.

use std::net::SocketAddr;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use courier_application::StatusBoard;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Build the health router over `board`
pub fn health_router(board: StatusBoard) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .with_state(board)
}

async fn handle_index(State(board): State<StatusBoard>) -> impl IntoResponse {
    let snapshot = board.snapshot();
    Html(format!(
        "<h1>🤖 {} Running</h1>\n<p>Status: {}</p>\n<p>Use {} in chat to see commands</p>\n",
        escape_html(&snapshot.bot_name),
        snapshot.status,
        escape_html(&snapshot.menu_command)
    ))
}

async fn handle_health(State(board): State<StatusBoard>) -> impl IntoResponse {
    Json(board.snapshot())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Serve `router` on `port` until `shutdown` fires
pub async fn serve(
    port: u16,
    router: Router,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    info!(addr = %listener.local_addr()?, "🌐 Health server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
