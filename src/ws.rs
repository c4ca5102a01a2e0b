//! Live-update WebSocket channel
//!
//! The session identity is resolved during the HTTP upgrade and carried by
//! the connection task from then on; inbound vote messages are bound to
//! that identity, never to ambient session state.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_sessions::Session;

use crate::auth::{self, SessionUser};
use crate::protocol::ClientMessage;
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    session: Session,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let identity = auth::current_user(&session).await;

    tracing::info!(
        "WebSocket connection request from {}",
        identity
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("anonymous")
    );

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, identity: Option<SessionUser>, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client_id = state.registry.register(tx).await;

    loop {
        tokio::select! {
            // Events fanned out by the registry
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    // Registry dropped us after a failed send
                    None => break,
                }
            }

            // Messages from the client
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(msg) => handle_message(msg, identity.as_ref(), &state).await,
                            Err(e) => {
                                // Malformed traffic never kills the channel
                                tracing::warn!("Ignoring unparseable live message: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.registry.unregister(&client_id).await;
}

/// Dispatch one inbound client message.
///
/// Engine errors are logged and dropped: there is no response channel on
/// this path and the connection itself stays up.
async fn handle_message(msg: ClientMessage, identity: Option<&SessionUser>, state: &Arc<AppState>) {
    match msg {
        ClientMessage::Vote {
            poll_id,
            selected_option,
        } => {
            let voter = match identity {
                Some(user) => Some(&user.id),
                None if state.config.anonymous_live_votes => None,
                None => {
                    tracing::warn!(
                        "Dropping vote on poll {} from unauthenticated live client",
                        poll_id
                    );
                    return;
                }
            };

            if let Err(e) = state
                .engine
                .apply_vote(&poll_id, &selected_option, voter)
                .await
            {
                tracing::warn!(
                    "Live vote on poll {} for {:?} rejected: {}",
                    poll_id,
                    selected_option,
                    e
                );
            }
        }
    }
}
