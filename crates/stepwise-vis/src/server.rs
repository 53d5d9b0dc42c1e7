//! Axum web server with WebSocket streaming for step playback.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stepwise_playback::{ParamSource, PlaybackConfig, PlaybackStatus, Player, Session};
use stepwise_step::{Sequence, Step};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::error::{status_code, Result};
use crate::visualizer::Visualizer;

/// Shared application state.
pub struct AppState<P: Visualizer> {
    player: Player<P>,
    config: PlaybackConfig,
}

/// Visualization server for one producer.
pub struct VisServer<P: Visualizer> {
    state: Arc<AppState<P>>,
}

impl<P: Visualizer> VisServer<P> {
    /// Mount the producer with its default params. Must be called inside a
    /// tokio runtime.
    pub fn new(config: PlaybackConfig) -> Self {
        Self::with_params(P::Params::default(), config)
    }

    pub fn with_params(params: P::Params, config: PlaybackConfig) -> Self {
        let session = Session::new(P::default(), params, config.clone());
        Self {
            state: Arc::new(AppState {
                player: Player::spawn(session),
                config,
            }),
        }
    }

    /// Handle to the underlying player.
    pub fn player(&self) -> &Player<P> {
        &self.state.player
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/info", get(info_handler::<P>))
            .route("/api/status", get(status_handler::<P>))
            .route("/api/frame", get(frame_handler::<P>))
            .route("/api/sequence", get(sequence_handler::<P>))
            .route("/api/playback/toggle", post(toggle_handler::<P>))
            .route("/api/playback/speed", post(speed_handler::<P>))
            .route("/api/playback/reset", post(reset_handler::<P>))
            .route("/api/playback/seek", post(seek_handler::<P>))
            .route("/api/playback/step", post(step_handler::<P>))
            .route("/api/params", post(params_handler::<P>))
            .route("/api/operation", post(operation_handler::<P>))
            // WebSocket for real-time updates
            .route("/ws", get(ws_handler::<P>))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the given port.
    pub async fn serve(self, port: u16) -> Result<()> {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(visualizer = P::NAME, "Visualization server running on http://localhost:{}", port);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Current step together with the playback status.
#[derive(Debug, Clone, Serialize)]
pub struct FrameView<S, R> {
    pub step: Step<S, R>,
    pub status: PlaybackStatus,
}

impl<S: Clone, R: Clone> From<&stepwise_playback::Frame<S, R>> for FrameView<S, R> {
    fn from(frame: &stepwise_playback::Frame<S, R>) -> Self {
        Self {
            step: frame.step().clone(),
            status: frame.status.clone(),
        }
    }
}

type Reply = std::result::Result<Json<PlaybackStatus>, StatusCode>;

#[derive(Serialize)]
struct InfoResponse {
    visualizer: &'static str,
    min_speed: u32,
    max_speed: u32,
    initial_speed: u32,
}

async fn info_handler<P: Visualizer>(State(state): State<Arc<AppState<P>>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        visualizer: P::NAME,
        min_speed: state.config.speed.min(),
        max_speed: state.config.speed.max(),
        initial_speed: state.config.initial_speed,
    })
}

async fn status_handler<P: Visualizer>(State(state): State<Arc<AppState<P>>>) -> Reply {
    let status = state.player.status().await.map_err(status_code)?;
    Ok(Json(status))
}

async fn frame_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<FrameView<P::Snapshot, P::Role>> {
    Json(FrameView::from(&state.player.frame()))
}

async fn sequence_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<Sequence<P::Snapshot, P::Role>> {
    let frame = state.player.frame();
    Json(Sequence::clone(&frame.sequence))
}

async fn toggle_handler<P: Visualizer>(State(state): State<Arc<AppState<P>>>) -> Reply {
    let status = state.player.toggle_play_pause().await.map_err(status_code)?;
    Ok(Json(status))
}

#[derive(Deserialize)]
struct SpeedRequest {
    speed: u32,
}

async fn speed_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<SpeedRequest>,
) -> Reply {
    let status = state.player.set_speed(req.speed).await.map_err(status_code)?;
    Ok(Json(status))
}

#[derive(Deserialize)]
struct ResetRequest {
    source: ParamSource,
}

async fn reset_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<ResetRequest>,
) -> Reply {
    let status = state.player.reset(req.source).await.map_err(status_code)?;
    Ok(Json(status))
}

#[derive(Deserialize)]
struct SeekRequest {
    index: usize,
}

async fn seek_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<SeekRequest>,
) -> Reply {
    let status = state.player.seek(req.index).await.map_err(status_code)?;
    Ok(Json(status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Forward,
    Backward,
}

#[derive(Deserialize)]
struct StepRequest {
    direction: Direction,
}

async fn step_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(req): Json<StepRequest>,
) -> Reply {
    let status = match req.direction {
        Direction::Forward => state.player.step_forward().await,
        Direction::Backward => state.player.step_backward().await,
    }
    .map_err(status_code)?;
    Ok(Json(status))
}

async fn params_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(params): Json<P::Params>,
) -> Reply {
    let status = state.player.set_params(params).await.map_err(status_code)?;
    Ok(Json(status))
}

async fn operation_handler<P: Visualizer>(
    State(state): State<Arc<AppState<P>>>,
    Json(op): Json<P::Op>,
) -> Reply {
    let status = state.player.request_operation(op).await.map_err(status_code)?;
    Ok(Json(status))
}

async fn ws_handler<P: Visualizer>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<P>>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Commands a WebSocket client may send.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand<Params, Op> {
    GetFrame,
    GetStatus,
    Toggle,
    Speed { speed: u32 },
    Reset { source: ParamSource },
    Seek { index: usize },
    Step { direction: Direction },
    Rewind,
    Params { params: Params },
    Operation { op: Op },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsEvent<S, R> {
    Frame(FrameView<S, R>),
    Status(PlaybackStatus),
    Error { message: String },
}

async fn handle_ws<P: Visualizer>(mut socket: WebSocket, state: Arc<AppState<P>>) {
    info!(visualizer = P::NAME, "WebSocket client connected");
    let mut frames = state.player.subscribe();

    let initial = FrameView::from(&*frames.borrow_and_update());
    if let Err(e) = send_event(&mut socket, &WsEvent::Frame(initial)).await {
        warn!("Failed to send initial frame: {}", e);
        return;
    }

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    debug!("player stopped, closing WebSocket");
                    break;
                }
                let view = FrameView::from(&*frames.borrow_and_update());
                if let Err(e) = send_event(&mut socket, &WsEvent::Frame(view)).await {
                    warn!("Failed to push frame: {}", e);
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<WsCommand<P::Params, P::Op>>(&text) {
                            Ok(cmd) => handle_ws_command(&state, cmd).await,
                            Err(e) => WsEvent::Error { message: e.to_string() },
                        };
                        if let Err(e) = send_event(&mut socket, &event).await {
                            warn!("Failed to send response: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn handle_ws_command<P: Visualizer>(
    state: &AppState<P>,
    cmd: WsCommand<P::Params, P::Op>,
) -> WsEvent<P::Snapshot, P::Role> {
    let player = &state.player;
    let result = match cmd {
        WsCommand::GetFrame => return WsEvent::Frame(FrameView::from(&player.frame())),
        WsCommand::GetStatus => player.status().await,
        WsCommand::Toggle => player.toggle_play_pause().await,
        WsCommand::Speed { speed } => player.set_speed(speed).await,
        WsCommand::Reset { source } => player.reset(source).await,
        WsCommand::Seek { index } => player.seek(index).await,
        WsCommand::Step { direction: Direction::Forward } => player.step_forward().await,
        WsCommand::Step { direction: Direction::Backward } => player.step_backward().await,
        WsCommand::Rewind => player.rewind().await,
        WsCommand::Params { params } => player.set_params(params).await,
        WsCommand::Operation { op } => player.request_operation(op).await,
    };
    match result {
        Ok(status) => WsEvent::Status(status),
        Err(e) => WsEvent::Error {
            message: e.to_string(),
        },
    }
}

async fn send_event<S: Serialize, R: Serialize>(
    socket: &mut WebSocket,
    event: &WsEvent<S, R>,
) -> std::result::Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use stepwise_producers::{MinMax, MinMaxParams, SubsetSum, Wal};
    use tower::ServiceExt;

    fn paused() -> PlaybackConfig {
        PlaybackConfig::default().with_autoplay(false)
    }

    async fn call(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn post_status(router: Router, uri: &str, body: &str) -> PlaybackStatus {
        let (code, bytes) = call(router, "POST", uri, body).await;
        assert_eq!(code, StatusCode::OK, "{}", String::from_utf8_lossy(&bytes));
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn server_creation() {
        let server = VisServer::<MinMax>::new(paused());
        let status = server.player().status().await.unwrap();
        assert!(status.total > 1);
    }

    #[test]
    fn router_builds() {
        tokio_test::block_on(async {
            let server = VisServer::<Wal>::new(paused());
            let _router = server.router();
        });
    }

    #[tokio::test]
    async fn status_and_frame() {
        let server = VisServer::<MinMax>::with_params(MinMaxParams::values([1, 2, 3]), paused());

        let (code, bytes) = call(server.router(), "GET", "/api/status", "").await;
        assert_eq!(code, StatusCode::OK);
        let status: PlaybackStatus = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status.index, 0);
        assert_eq!(status.total, 4);

        let (code, bytes) = call(server.router(), "GET", "/api/frame", "").await;
        assert_eq!(code, StatusCode::OK);
        let frame: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(frame["step"]["state"]["min_value"], 1);
        assert_eq!(frame["status"]["total"], 4);
    }

    #[tokio::test]
    async fn sequence_lists_every_step() {
        let server = VisServer::<MinMax>::with_params(MinMaxParams::values([1, 2, 3]), paused());
        let (code, bytes) = call(server.router(), "GET", "/api/sequence", "").await;
        assert_eq!(code, StatusCode::OK);
        let steps: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(steps.len(), 4);
    }

    #[tokio::test]
    async fn playback_controls() {
        let server = VisServer::<MinMax>::new(paused());

        let status = post_status(server.router(), "/api/playback/speed", r#"{ "speed": 5000 }"#).await;
        assert_eq!(status.speed, 1000);
        assert_eq!(status.delay_ms, 10);

        let status =
            post_status(server.router(), "/api/playback/step", r#"{ "direction": "forward" }"#).await;
        assert_eq!(status.index, 1);

        let status = post_status(server.router(), "/api/playback/seek", r#"{ "index": 3 }"#).await;
        assert_eq!(status.index, 3);

        let status =
            post_status(server.router(), "/api/playback/reset", r#"{ "source": "defaults" }"#).await;
        assert_eq!(status.index, 0);
        assert!(!status.is_playing);

        let status = post_status(server.router(), "/api/playback/toggle", "").await;
        assert!(status.is_playing);
    }

    #[tokio::test]
    async fn params_regenerate() {
        let server = VisServer::<SubsetSum>::new(paused());
        let before = server.player().status().await.unwrap();

        let status = post_status(
            server.router(),
            "/api/params",
            r#"{ "numbers": [5, 4], "target": 9 }"#,
        )
        .await;
        assert_ne!(status.total, before.total);
        assert_eq!(status.epoch, before.epoch + 1);
    }

    #[tokio::test]
    async fn operations_commit_to_the_store() {
        let server = VisServer::<Wal>::new(paused());
        let status = post_status(
            server.router(),
            "/api/operation",
            r#"{ "type": "Put", "key": "a", "value": "1" }"#,
        )
        .await;
        assert_eq!(status.store_version, 1);
        assert!(status.is_playing);
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected() {
        let server = VisServer::<MinMax>::new(paused());

        let (code, _) = call(server.router(), "POST", "/api/operation", r#"{ "type": "Put" }"#).await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);

        let (code, _) =
            call(server.router(), "POST", "/api/playback/step", r#"{ "direction": "sideways" }"#)
                .await;
        assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn ws_commands_map_to_player_calls() {
        let server = VisServer::<MinMax>::new(paused());
        let cmd: WsCommand<MinMaxParams, stepwise_step::NoOperation> =
            serde_json::from_str(r#"{ "type": "step", "direction": "forward" }"#).unwrap();
        match handle_ws_command(&server.state, cmd).await {
            WsEvent::Status(status) => assert_eq!(status.index, 1),
            _ => panic!("expected a status event"),
        }

        let cmd: WsCommand<MinMaxParams, stepwise_step::NoOperation> =
            serde_json::from_str(r#"{ "type": "params", "params": { "type": "Values", "values": [4] } }"#)
                .unwrap();
        match handle_ws_command(&server.state, cmd).await {
            WsEvent::Status(status) => assert_eq!(status.total, 2),
            _ => panic!("expected a status event"),
        }
    }

    #[test]
    fn ws_events_are_tagged() {
        let event: WsEvent<(), ()> = WsEvent::Error {
            message: "nope".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "nope");
    }
}
