use crate::domain::PeerId;
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{EnvelopeDto, EventDto, WireMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::{RelayError, RelayHandle, RelayRegistry};

use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug, serde::Deserialize)]
pub struct RelayQuery {
    // Session the peer wants to join.
    #[serde(default)]
    session_id: Option<String>,
    // Identity the peer uses for every entity it owns.
    peer_id: u32,
}

#[derive(Debug, serde::Serialize)]
struct SessionMembersResponse {
    session_id: String,
    peer_ids: Vec<u32>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<RelayQuery>,
) -> impl IntoResponse {
    let session_id = query
        .session_id
        .unwrap_or_else(|| state.default_session_id.to_string());
    let peer = PeerId(query.peer_id);

    if state.relay_registry.is_member(&session_id, peer).await {
        // Keep conflict responses consistent with the JSON error schema.
        return (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "peer already connected".to_string(),
            }),
        )
            .into_response();
    }

    let registry = state.relay_registry.clone();
    ws.on_upgrade(move |socket| {
        let span = info_span!("conn", conn_id = next_conn_id(), session_id = %session_id, peer_id = %peer);
        handle_socket(socket, registry, session_id, peer).instrument(span)
    })
}

pub async fn session_members_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.relay_registry.members(&session_id).await {
        Some(members) => (
            StatusCode::OK,
            Json(SessionMembersResponse {
                session_id,
                peer_ids: members.into_iter().map(|peer| peer.0).collect(),
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "session not found".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn handle_socket(
    mut socket: WebSocket,
    registry: Arc<RelayRegistry>,
    session_id: String,
    peer: PeerId,
) {
    let handle = match registry.join(&session_id, peer).await {
        Ok(handle) => handle,
        Err(RelayError::PeerAlreadyConnected) => {
            // Lost a race with another connection using the same peer id.
            warn!("peer id already connected; closing");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "peer already connected".into(),
                })))
                .await;
            return;
        }
    };

    // Subscribe before announcing so the joiner sees everything after its own join.
    let mut frames_rx = handle.frames_tx.subscribe();
    publish(&handle, peer, WireMessage::Event(EventDto::PeerJoined((peer.0,))));
    info!("peer joined session");

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => relay_frame(&handle, peer, text.as_str()),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "socket error");
                    break;
                }
            },
            frame = frames_rx.recv() => match forward_action(frame) {
                Forward::Frame(bytes) => {
                    if sender.send(Message::Text(bytes)).await.is_err() {
                        debug!("peer socket closed while sending");
                        break;
                    }
                }
                Forward::Resync { missed } => {
                    // Missed events cannot be replayed; the peer must rejoin and rebuild.
                    warn!(missed, "peer lagged; closing so it can rejoin");
                    let _ = sender
                        .send(Message::Close(Some(CloseFrame {
                            code: close_code::AGAIN,
                            reason: "lagged behind session".into(),
                        })))
                        .await;
                    break;
                }
                Forward::Closed => break,
            },
        }
    }

    registry.leave(&session_id, peer).await;
    publish(&handle, peer, WireMessage::Event(EventDto::PeerLeft((peer.0,))));
    info!("peer left session");
}

#[derive(Debug, PartialEq)]
enum Forward {
    Frame(Utf8Bytes),
    Resync { missed: u64 },
    Closed,
}

fn forward_action(received: Result<Utf8Bytes, broadcast::error::RecvError>) -> Forward {
    match received {
        Ok(bytes) => Forward::Frame(bytes),
        Err(broadcast::error::RecvError::Lagged(missed)) => Forward::Resync { missed },
        Err(broadcast::error::RecvError::Closed) => Forward::Closed,
    }
}

// Validates a peer frame, stamps the sender and fans it out.
fn relay_frame(handle: &RelayHandle, peer: PeerId, text: &str) {
    match serde_json::from_str::<WireMessage>(text) {
        Ok(message) => publish(handle, peer, message),
        Err(e) => warn!(error = %e, "dropping malformed frame"),
    }
}

// Serializes once and broadcasts the shared bytes to every member.
fn publish(handle: &RelayHandle, peer: PeerId, message: WireMessage) {
    let envelope = EnvelopeDto {
        sender: peer.0,
        message,
    };
    match serde_json::to_string(&envelope) {
        Ok(txt) => {
            // No receivers only happens once the session is already empty.
            let _ = handle.frames_tx.send(Utf8Bytes::from(txt));
        }
        Err(e) => error!(error = ?e, session_id = %handle.session_id, "failed to serialize frame"),
    }
}
