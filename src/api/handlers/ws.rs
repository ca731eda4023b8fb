use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tokio::sync::mpsc;

use crate::api::client::client_id;
use crate::api::ws_types::{ClientMessage, WsError, WsMessage};
use crate::explorer::TraderQuery;
use crate::services::{run_count_debouncer, CountUpdate};
use crate::AppState;

use super::explorer::load_context;

pub async fn handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let client = client_id(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, client))
}

async fn send(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WsMessage");
            true
        }
    }
}

/// One explorer session: filter edits in, debounced trader counts out.
async fn handle_socket(mut socket: WebSocket, state: AppState, client: String) {
    tracing::info!(client = %client, "Explorer WebSocket client connected");

    let (query_tx, query_rx) = mpsc::channel::<TraderQuery>(32);
    let (update_tx, mut update_rx) = mpsc::channel::<CountUpdate>(32);

    tokio::spawn(run_count_debouncer(
        query_rx,
        state.db.clone(),
        state.config.count_debounce(),
        update_tx,
    ));

    loop {
        tokio::select! {
            update = update_rx.recv() => {
                let Some(update) = update else { break };
                if !send(&mut socket, &WsMessage::TraderCount(update)).await {
                    break;
                }
            }
            client_msg = socket.recv() => {
                match client_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Query { query }) => {
                                let ctx = load_context(&state, client.clone(), &query).await;
                                if query_tx.send(ctx.trader_query()).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Ignoring malformed explorer message");
                                let msg = WsMessage::Error(WsError {
                                    message: format!("invalid message: {e}"),
                                });
                                if !send(&mut socket, &msg).await {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {} // ignore binary/pong
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::info!(client = %client, "Explorer WebSocket client disconnected");
}
