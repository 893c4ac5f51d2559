//! Axum web server with WebSocket streaming for playback.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::config::VisConfig;
use crate::error::{Error, Result};
use crate::playback::{Playback, PlaybackSpeed, PlaybackState, PlaybackStatus};
use crate::scene::{Change, SceneSnapshot};
use crate::session::{LoadOutcome, SessionSlot, Update};

/// Shared application state.
pub struct AppState {
    slot: SessionSlot,
    config: VisConfig,
}

/// Visualization server.
pub struct VisServer {
    state: Arc<AppState>,
}

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, String)>;

fn rejection(err: Error) -> (StatusCode, String) {
    let status = match &err {
        Error::NoSession | Error::UnknownEntity(_) => StatusCode::NOT_FOUND,
        Error::InvalidInput(_) | Error::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Mismatch { .. } | Error::MissingInverse(_) | Error::Task(_) | Error::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl VisServer {
    pub fn new(config: VisConfig) -> Self {
        Self {
            state: Arc::new(AppState {
                slot: SessionSlot::new(config.speed, config.time_unit),
                config,
            }),
        }
    }

    /// The session holder, for loading scenarios outside a request.
    pub fn slot(&self) -> &SessionSlot {
        &self.state.slot
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .nest_service("/static", ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")))
            // API routes
            .route("/api/status", get(status_handler))
            .route("/api/scene", get(scene_handler))
            .route("/api/load", post(load_handler))
            .route("/api/playback", get(playback_status_handler))
            .route("/api/playback/play", post(play_handler))
            .route("/api/playback/pause", post(pause_handler))
            .route("/api/playback/stop", post(stop_handler))
            .route("/api/playback/seek", post(seek_handler))
            .route("/api/playback/speed", post(speed_handler))
            // WebSocket for change notifications
            .route("/ws", get(ws_handler))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Drive playing sessions from the wall clock, one tick per frame interval.
    pub fn spawn_clock(&self) -> tokio::task::JoinHandle<()> {
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(state.config.frame_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let playing = state
                    .slot
                    .read()
                    .await
                    .as_ref()
                    .is_some_and(|s| s.playback().state() == PlaybackState::Playing);
                if !playing {
                    continue;
                }

                let mut guard = state.slot.write().await;
                let Some(session) = guard.as_mut() else {
                    continue;
                };
                match session.playback_mut().tick() {
                    Ok(changes) => state.slot.publish_changes(session, changes),
                    Err(err) => {
                        tracing::error!("playback tick failed: {}", err);
                        session.playback_mut().pause();
                    }
                }
            }
        })
    }

    /// Run the server on the configured address.
    pub async fn serve(self) -> std::result::Result<(), std::io::Error> {
        let addr = self.state.config.listen_addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let clock = self.spawn_clock();
        tracing::info!("Visualization server running on http://{}", addr);
        let served = axum::serve(listener, self.router()).await;
        clock.abort();
        served
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

/// Server status response.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    generation: Option<u64>,
    source: Option<PathBuf>,
    node_count: usize,
    event_count: usize,
    warnings: Vec<String>,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let guard = state.slot.read().await;
    Json(match guard.as_ref() {
        Some(session) => StatusResponse {
            status: "ok",
            generation: Some(session.generation()),
            source: session.source().map(PathBuf::from),
            node_count: session.playback().scene().node_count(),
            event_count: session.playback().timeline().len(),
            warnings: session.warnings().iter().map(ToString::to_string).collect(),
        },
        None => StatusResponse {
            status: "empty",
            generation: None,
            source: None,
            node_count: 0,
            event_count: 0,
            warnings: Vec::new(),
        },
    })
}

async fn scene_handler(State(state): State<Arc<AppState>>) -> ApiResult<SceneSnapshot> {
    let guard = state.slot.read().await;
    let session = guard.as_ref().ok_or(Error::NoSession).map_err(rejection)?;
    Ok(Json(session.playback().scene().snapshot()))
}

#[derive(Deserialize)]
struct LoadRequest {
    path: PathBuf,
}

async fn load_handler(State(state): State<Arc<AppState>>, Json(req): Json<LoadRequest>) -> ApiResult<LoadOutcome> {
    state
        .slot
        .load_file(req.path, state.config.parse_options())
        .await
        .map(Json)
        .map_err(rejection)
}

async fn current_status(state: &AppState) -> Result<PlaybackStatus> {
    let guard = state.slot.read().await;
    let session = guard.as_ref().ok_or(Error::NoSession)?;
    Ok(PlaybackStatus::new(session.playback(), state.slot.time_unit()))
}

/// Run `action` on the live playback, broadcast what it changed, return the new status.
async fn control<F>(state: &AppState, action: F) -> Result<PlaybackStatus>
where
    F: FnOnce(&mut Playback) -> Result<Vec<Change>>,
{
    let mut guard = state.slot.write().await;
    let session = guard.as_mut().ok_or(Error::NoSession)?;
    let changes = action(session.playback_mut())?;
    state.slot.publish_changes(session, changes);
    Ok(PlaybackStatus::new(session.playback(), state.slot.time_unit()))
}

async fn playback_status_handler(State(state): State<Arc<AppState>>) -> ApiResult<PlaybackStatus> {
    current_status(&state).await.map(Json).map_err(rejection)
}

async fn play_handler(State(state): State<Arc<AppState>>) -> ApiResult<PlaybackStatus> {
    control(&state, Playback::play).await.map(Json).map_err(rejection)
}

async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult<PlaybackStatus> {
    control(&state, |p| {
        p.pause();
        Ok(Vec::new())
    })
    .await
    .map(Json)
    .map_err(rejection)
}

async fn stop_handler(State(state): State<Arc<AppState>>) -> ApiResult<PlaybackStatus> {
    control(&state, Playback::stop).await.map(Json).map_err(rejection)
}

#[derive(Deserialize)]
struct SeekRequest {
    /// Simulation time in milliseconds
    time: f64,
}

async fn seek_handler(State(state): State<Arc<AppState>>, Json(req): Json<SeekRequest>) -> ApiResult<PlaybackStatus> {
    control(&state, |p| p.seek(req.time)).await.map(Json).map_err(rejection)
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: PlaybackSpeed,
}

async fn speed_handler(State(state): State<Arc<AppState>>, Json(req): Json<SpeedRequest>) -> ApiResult<PlaybackStatus> {
    control(&state, |p| {
        p.set_speed(req.speed);
        Ok(Vec::new())
    })
    .await
    .map(Json)
    .map_err(rejection)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send<T: Serialize>(socket: &mut WebSocket, message: &T) -> std::result::Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(err) => {
            tracing::error!("failed to encode websocket message: {}", err);
            Ok(())
        }
    }
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    tracing::info!("WebSocket client connected");
    let mut updates = state.slot.subscribe();

    if let Ok(status) = current_status(&state).await {
        if send(&mut socket, &WsResponse::Status(status)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<WsCommand>(&text) {
                    Ok(cmd) => {
                        let response = handle_ws_command(&state, cmd).await;
                        if send(&mut socket, &response).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::debug!("ignoring malformed command: {}", err),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!("WebSocket error: {}", err);
                    break;
                }
            },
            update = updates.recv() => match forward(&state, update).await {
                Some(messages) => {
                    if send_all(&mut socket, &messages).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
    tracing::info!("WebSocket client disconnected");
}

/// Anything pushed to a client unprompted.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outbound {
    Update(Update),
    Response(WsResponse),
}

async fn send_all(socket: &mut WebSocket, messages: &[Outbound]) -> std::result::Result<(), axum::Error> {
    for message in messages {
        send(socket, message).await?;
    }
    Ok(())
}

/// Messages for one broadcast receive; `None` once the channel is closed.
///
/// A lagging client missed change batches, so it gets the whole scene
/// and status again instead.
async fn forward(state: &AppState, received: std::result::Result<Update, RecvError>) -> Option<Vec<Outbound>> {
    match received {
        Ok(update) => Some(vec![Outbound::Update(update)]),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "WebSocket client lagging; resending the scene");
            Some(resync(state).await)
        }
        Err(RecvError::Closed) => None,
    }
}

async fn resync(state: &AppState) -> Vec<Outbound> {
    let guard = state.slot.read().await;
    let Some(session) = guard.as_ref() else {
        return Vec::new();
    };
    vec![
        Outbound::Response(WsResponse::Scene(session.playback().scene().snapshot())),
        Outbound::Response(WsResponse::Status(PlaybackStatus::new(
            session.playback(),
            state.slot.time_unit(),
        ))),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WsCommand {
    GetScene,
    GetStatus,
    Seek { time: f64 },
    Play,
    Pause,
    Stop,
    Speed { speed: PlaybackSpeed },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum WsResponse {
    Scene(SceneSnapshot),
    Status(PlaybackStatus),
    Error { message: String },
}

async fn handle_ws_command(state: &AppState, cmd: WsCommand) -> WsResponse {
    let outcome = match cmd {
        WsCommand::GetScene => {
            let guard = state.slot.read().await;
            return match guard.as_ref() {
                Some(session) => WsResponse::Scene(session.playback().scene().snapshot()),
                None => WsResponse::Error {
                    message: Error::NoSession.to_string(),
                },
            };
        }
        WsCommand::GetStatus => current_status(state).await,
        WsCommand::Seek { time } => control(state, |p| p.seek(time)).await,
        WsCommand::Play => control(state, Playback::play).await,
        WsCommand::Pause => {
            control(state, |p| {
                p.pause();
                Ok(Vec::new())
            })
            .await
        }
        WsCommand::Stop => control(state, Playback::stop).await,
        WsCommand::Speed { speed } => {
            control(state, |p| {
                p.set_speed(speed);
                Ok(Vec::new())
            })
            .await
        }
    };
    match outcome {
        Ok(status) => WsResponse::Status(status),
        Err(err) => WsResponse::Error {
            message: err.to_string(),
        },
    }
}
