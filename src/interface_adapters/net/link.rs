// Peer-side connection to the relay: two pumps bridging the socket and the peer loop channels.

use crate::domain::PeerId;
use crate::interface_adapters::protocol::{EnvelopeDto, WireMessage};
use crate::use_cases::{Envelope, PeerMessage};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to connect to relay: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Channel ends handed to the peer loop.
pub struct PeerLink {
    pub inbound_rx: mpsc::Receiver<Envelope>,
    pub outbound_tx: mpsc::Sender<PeerMessage>,
}

pub async fn connect(
    relay_url: &str,
    session_id: &str,
    peer: PeerId,
    capacity: usize,
) -> Result<PeerLink, LinkError> {
    let url = format!("{relay_url}?session_id={session_id}&peer_id={}", peer.0);
    let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
    let (mut write, mut read) = stream.split();

    let (inbound_tx, inbound_rx) = mpsc::channel::<Envelope>(capacity);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<PeerMessage>(capacity);

    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let txt = match serde_json::to_string(&WireMessage::from(message)) {
                Ok(txt) => txt,
                Err(e) => {
                    error!(error = ?e, "failed to serialize outbound frame");
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(txt.into())).await {
                warn!(error = %e, "relay write failed; writer exiting");
                break;
            }
        }
        let _ = write.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<EnvelopeDto>(text.as_str()) {
                    Ok(envelope) => {
                        if inbound_tx.send(envelope.into()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "dropping malformed relay frame"),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "relay read failed");
                    break;
                }
            }
        }
        // Dropping `inbound_tx` tells the peer loop the link is gone.
        debug!("relay reader exiting");
    });

    Ok(PeerLink {
        inbound_rx,
        outbound_tx,
    })
}
