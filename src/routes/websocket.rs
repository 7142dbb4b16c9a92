use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    auth::{Credential, IdentityProvider},
    core::{ClaimError, MAX_CLAIMS_PER_SECOND, MAX_CLIENT_MESSAGE_BYTES},
    middleware::rate_limiter::SlidingWindow,
    models::{ClaimResponse, ClientMessage, ErrorResponse, ServerMessage},
    services::{submit_claim, Subscription},
    state::AppState,
};

/// WebSocket endpoint for live grid updates
///
/// # Flow
///
/// 1. Register a subscription (snapshot + live updates)
/// 2. Accept the WebSocket connection
/// 3. Push the snapshot, then every update from the hub
/// 4. Answer claim messages with the credential presented at connect time
///
/// Anonymous clients may subscribe; their claims are rejected.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    credential: Credential,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ClaimError> {
    let subscription = state.sync_hub.subscribe(Arc::clone(&state.grid))?;

    let client = state
        .identity
        .verify(credential.as_deref())
        .map(|identity| identity.id)
        .unwrap_or_else(|_| "anonymous".to_string());

    tracing::info!("WebSocket accepted: client={}", client);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, subscription, credential, client, state)))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!("Failed to encode server message: {}", e);
            None
        }
    }
}

/// Reply to one text frame from the client
///
/// Claims past `MAX_CLAIMS_PER_SECOND` on this connection are answered with
/// a `rate_limited` error without touching the grid.
///
/// # Returns
///
/// The message to send back, or None for frames that need no reply
pub async fn handle_client_text(
    state: &AppState,
    credential: &Credential,
    claims: &mut SlidingWindow,
    text: &str,
) -> Option<Message> {
    if text == "ping" {
        return Some(Message::Text("pong".to_string()));
    }

    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Claim { .. }) if !claims.allow() => ServerMessage::Error(ErrorResponse {
            error: "rate_limited".to_string(),
            detail: "Too many claims. Please slow down.".to_string(),
        }),
        Ok(ClientMessage::Claim { row, col }) => match submit_claim(
            &state.grid,
            &state.sync_hub,
            state.identity.as_ref(),
            &row,
            &col,
            credential.as_deref(),
        )
        .await
        {
            Ok(result) => ServerMessage::ClaimResult(ClaimResponse::from(&result)),
            Err(e) => ServerMessage::Error(ErrorResponse::from(&e)),
        },
        Err(e) => ServerMessage::Error(ErrorResponse {
            error: "bad_request".to_string(),
            detail: e.to_string(),
        }),
    };

    encode(&reply)
}

/// Handle WebSocket connection
///
/// The send task owns the socket's write half and merges hub updates with
/// replies from the receive task. When either task ends the other is aborted,
/// which drops the subscription.
async fn handle_socket(
    socket: WebSocket,
    mut subscription: Subscription,
    credential: Credential,
    client: String,
    state: AppState,
) {
    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<Message>(16);

    let client_clone = client.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                update = subscription.next_update() => match update {
                    Some(update) => encode(&ServerMessage::from(update)),
                    None => {
                        tracing::debug!("Update stream ended for client={}", client_clone);
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => Some(reply),
                    None => break,
                },
            };

            if let Some(message) = outgoing {
                if sender.send(message).await.is_err() {
                    tracing::debug!("Failed to send to client={}", client_clone);
                    break;
                }
            }
        }
    });

    let client_clone = client.clone();
    let mut recv_task = tokio::spawn(async move {
        let mut claims = SlidingWindow::per_second(MAX_CLAIMS_PER_SECOND);

        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if text.len() > MAX_CLIENT_MESSAGE_BYTES {
                        tracing::warn!(
                            "Message too large from client={}: {} bytes",
                            client_clone,
                            text.len()
                        );
                        break;
                    }

                    if let Some(reply) =
                        handle_client_text(&state, &credential, &mut claims, &text).await
                    {
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => {
                    tracing::debug!("Close message from client={}", client_clone);
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Axum handles WebSocket ping/pong frames automatically
                }
                Message::Binary(_) => {
                    tracing::warn!("Unexpected binary message from client={}", client_clone);
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::info!("WebSocket connection closed: client={}", client);
}
