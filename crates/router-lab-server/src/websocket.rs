//! Bridges one WebSocket onto the streaming engine.
//!
//! Three futures run per connection: the reader forwards text frames to the
//! engine's inbound queue, the engine's command loop answers them, and the
//! writer drains the client's registry channel onto the socket. Whichever
//! finishes first ends the connection and drops the other two, which aborts
//! any command still emitting.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use router_lab_abstract::ServerEvent;
use router_lab_simulator::StreamingEngine;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn handle_socket(socket: WebSocket, client_id: String, engine: StreamingEngine) {
    let (mut outgoing, mut incoming) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (frame_tx, frame_rx) = mpsc::unbounded_channel::<String>();

    let generation = engine.registry().register(client_id.clone(), event_tx);

    let writer = async {
        while let Some(event) = event_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("[{}] failed to encode {}: {}", client_id, event.kind(), err);
                    continue;
                }
            };
            if let Err(err) = outgoing.send(Message::Text(frame)).await {
                warn!("[{}] send failed: {}", client_id, err);
                break;
            }
        }
    };

    let reader = async {
        while let Some(message) = incoming.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    debug!("[{}] <- {}", client_id, text);
                    if frame_tx.send(text).is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(data)) => {
                    warn!("[{}] ignoring {} byte binary frame", client_id, data.len());
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(frame)) => {
                    info!("[{}] closed by client: {:?}", client_id, frame);
                    break;
                }
                Err(err) => {
                    warn!("[{}] receive failed: {}", client_id, err);
                    break;
                }
            }
        }
    };

    let commands = engine.serve(&client_id, frame_rx);

    tokio::select! {
        _ = writer => debug!("[{}] writer finished", client_id),
        _ = reader => debug!("[{}] reader finished", client_id),
        _ = commands => debug!("[{}] command loop finished", client_id),
    }

    engine.registry().release(&client_id, generation);
}
