//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::transport::ConnectionId;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    info!(conn_id = %conn_id, "New WebSocket connection");

    let outbound = state.hub.register(conn_id);
    let (ws_sink, ws_stream) = socket.split();

    run_session(conn_id, &state, ws_sink, ws_stream, outbound).await;

    // Cleanup on disconnect
    state.coordinator.disconnect(conn_id);
    state.hub.unregister(conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    conn_id: ConnectionId,
    state: &AppState,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound: mpsc::Receiver<ServerMsg>,
) {
    let rate_limiter = ConnectionRateLimiter::new(state.config.join_rate_limit);

    // Spawn writer task: hub channel -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                break;
            }
        }
        debug!(conn_id = %conn_id, "Outbound channel closed");
    });

    // Reader loop: WebSocket -> coordinator
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(client_msg) => {
                    if matches!(client_msg, ClientMsg::JoinGame { .. }) && !rate_limiter.check_join() {
                        warn!(conn_id = %conn_id, "Rate limited join request");
                        continue;
                    }
                    state.coordinator.handle(conn_id, client_msg);
                }
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
