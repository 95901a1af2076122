// crates/relay-server/src/client.rs

//! Per-connection lifecycle: `Connecting -> Open -> Closed`.
//!
//! - Open: the connection's handle is registered and a writer task
//!   drains it onto the socket; the receive loop decodes each text frame
//!   and hands it to the router, in order.
//! - Closed: on peer close, stream end or transport error the client is
//!   unregistered and everyone left gets a fresh `presence_update`.

use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use relay_protocol::json_codec;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::router;
use crate::types::{AppState, ClientId, OutboundRx, OutboundTx};

/// How long the writer gets to flush queued frames after the client leaves.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Run the I/O loop for a single upgraded WebSocket connection.
pub async fn run_client(mut socket: WebSocket, state: AppState, client_id: ClientId) {
    // Create outbound channel for this client and register it.
    // Concurrent upgrades can all pass the handler's max_clients check,
    // so the cap is enforced again here under the write lock.
    let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();
    let admitted = {
        let mut guard = state.registry.write().await;
        guard.try_register(client_id.clone(), out_tx, state.config.max_clients)
    };

    match admitted {
        Ok(None) => {}
        Ok(Some(_)) => {
            warn!(
                client_id = %client_id,
                "duplicate client id, previous connection handle replaced"
            );
        }
        Err(_) => {
            warn!(
                client_id = %client_id,
                max_clients = state.config.max_clients,
                "closing upgraded connection, max_clients reached"
            );
            let frame = CloseFrame {
                code: close_code::AGAIN,
                reason: "max clients reached".into(),
            };
            if let Err(err) = socket.send(Message::Close(Some(frame))).await {
                debug!(client_id = %client_id, error = %err, "failed to send close frame");
            }
            return;
        }
    }
    info!(client_id = %client_id, "client connected");

    let (ws_sender, mut ws_receiver) = socket.split();
    let writer_handle = tokio::spawn(writer_task(client_id.clone(), ws_sender, out_rx));

    loop {
        match ws_receiver.next().await {
            Some(Ok(Message::Text(text))) => match json_codec::decode_inbound(&text) {
                Ok(msg) => router::route(&state, &client_id, msg).await,
                Err(err) => {
                    debug!(client_id = %client_id, error = %err, "dropping undecodable frame");
                }
            },
            Some(Ok(Message::Close(frame))) => {
                info!(client_id = %client_id, reason = ?frame, "client initiated close");
                break;
            }
            Some(Ok(_)) => {
                // Binary / ping / pong: nothing to route.
            }
            Some(Err(err)) => {
                warn!(client_id = %client_id, error = %err, "websocket receive error");
                break;
            }
            None => {
                debug!(client_id = %client_id, "websocket stream ended");
                break;
            }
        }
    }

    // Dropping the registry's handle lets the writer drain and stop.
    router::withdraw_client(&state.registry, &client_id).await;
    let abort = writer_handle.abort_handle();
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_handle).await.is_err() {
        debug!(client_id = %client_id, "writer still busy, aborting");
        abort.abort();
    }

    info!(client_id = %client_id, "client disconnected");
}

/// Writer task: encode outbound messages and write them as text frames.
async fn writer_task(
    client_id: ClientId,
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut out_rx: OutboundRx,
) {
    while let Some(msg) = out_rx.recv().await {
        let text = match json_codec::encode_outbound(&msg) {
            Ok(text) => text,
            Err(err) => {
                warn!(client_id = %client_id, kind = msg.kind(), error = %err, "encode error");
                continue;
            }
        };

        if let Err(err) = ws_sender.send(Message::Text(text)).await {
            debug!(client_id = %client_id, error = %err, "client write error");
            return;
        }
    }

    // Flushes any pending close handshake reply.
    if let Err(err) = ws_sender.close().await {
        debug!(client_id = %client_id, error = %err, "error closing websocket sink");
    }
}
