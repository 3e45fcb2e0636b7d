//! Local HTTP front end.
//!
//! Forwards requests to the shell over its command channel, so the HTTP
//! handlers never touch playback state directly. Binds to 127.0.0.1 only.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::shell::{Command, Reply, ShellHandle};

#[derive(Deserialize)]
struct SubmitRequest {
    text: String,
}

#[derive(Deserialize)]
struct SetVoiceRequest {
    voice: String,
}

type ApiResult = Result<Json<Reply>, StatusCode>;

/// Build the axum router.
pub fn router(shell: ShellHandle) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/voices", get(handle_voices))
        .route("/submit", post(handle_submit))
        .route("/replay", post(handle_replay))
        .route("/set-voice", post(handle_set_voice))
        .with_state(shell)
}

/// Start the API server as a background tokio task.
///
/// Returns the bind error so the caller can decide whether running without
/// the API is acceptable.
pub async fn start_api(shell: ShellHandle, port: u16) -> std::io::Result<()> {
    let app = router(shell);
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("API server error: {e}");
        }
    });
    Ok(())
}

/// One-line log form of submitted text: at most 80 characters, newlines
/// flattened, followed by the full length in characters.
fn preview(text: &str) -> String {
    let head: String = text.chars().take(80).collect();
    format!("\"{}\" ({} chars)", head.replace('\n', " "), text.chars().count())
}

async fn forward(shell: &ShellHandle, command: Command) -> ApiResult {
    shell
        .call(command)
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

async fn handle_status(State(shell): State<ShellHandle>) -> ApiResult {
    forward(&shell, Command::Status).await
}

async fn handle_voices(State(shell): State<ShellHandle>) -> ApiResult {
    forward(&shell, Command::ListVoices).await
}

async fn handle_submit(
    State(shell): State<ShellHandle>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult {
    info!("HTTP /submit: {}", preview(&req.text));
    forward(&shell, Command::Submit(req.text)).await
}

async fn handle_replay(State(shell): State<ShellHandle>) -> ApiResult {
    forward(&shell, Command::Replay).await
}

async fn handle_set_voice(
    State(shell): State<ShellHandle>,
    Json(req): Json<SetVoiceRequest>,
) -> ApiResult {
    forward(&shell, Command::SelectVoice(req.voice)).await
}
