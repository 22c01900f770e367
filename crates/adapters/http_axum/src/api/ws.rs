//! Observer WebSocket endpoint.
//!
//! Each accepted socket is registered with the fan-out broadcaster and
//! drained until the peer disconnects. The socket is full-duplex: outbound
//! frames come from the broadcaster channel, while the only inbound request
//! a client may make is `{"action":"get_initial_data"}`, answered with the
//! current snapshot.

use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use futures_util::{Sink, SinkExt, StreamExt};

use farmhub_app::ports::{ActionRecorder, CommandTransport};

use crate::state::AppState;

/// `GET /ws`
pub async fn upgrade<T, R>(
    State(state): State<AppState<T, R>>,
    ws: WebSocketUpgrade,
) -> Response
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| serve_observer(socket, state))
}

async fn serve_observer<T, R>(socket: WebSocket, state: AppState<T, R>)
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    let (connection_id, mut events) = state.broadcaster.register().await;
    tracing::info!(%connection_id, "observer connected");

    let (mut sink, mut stream) = socket.split();

    let greeting = serde_json::json!({
        "type": "connection",
        "message": "WebSocket connected successfully",
        "timestamp": Utc::now().to_rfc3339(),
    });
    if send_json(&mut sink, &greeting).await.is_err() {
        state.broadcaster.unregister(connection_id).await;
        return;
    }

    loop {
        tokio::select! {
            frame = events.recv() => {
                // A closed channel means the broadcaster dropped us.
                let Some(frame) = frame else { break };
                if sink.send(Message::Text(Utf8Bytes::from(frame.to_string()))).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if handle_client_message(&mut sink, &state, text.as_str())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, %err, "observer socket error");
                        break;
                    }
                }
            }
        }
    }

    state.broadcaster.unregister(connection_id).await;
    tracing::info!(%connection_id, "observer disconnected");
}

async fn handle_client_message<T, R>(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    state: &AppState<T, R>,
    text: &str,
) -> Result<(), axum::Error>
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    #[derive(serde::Deserialize)]
    struct ClientRequest {
        action: String,
    }

    match serde_json::from_str::<ClientRequest>(text) {
        Ok(request) if request.action == "get_initial_data" => {
            let reply = serde_json::json!({
                "type": "initial_data",
                "data": state.snapshot.snapshot(),
            });
            send_json(sink, &reply).await
        }
        Ok(request) => {
            tracing::debug!(action = %request.action, "ignoring unknown observer request");
            Ok(())
        }
        Err(err) => {
            let reply = serde_json::json!({
                "type": "error",
                "message": err.to_string(),
            });
            send_json(sink, &reply).await
        }
    }
}

async fn send_json(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    value: &serde_json::Value,
) -> Result<(), axum::Error> {
    sink.send(Message::Text(Utf8Bytes::from(value.to_string())))
        .await
}
