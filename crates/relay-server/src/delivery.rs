//! Delivery engine.
//!
//! Turns "send this to `id`" / "send this to everyone" into pushes onto
//! connection handles. Delivery is best effort:
//! - a target that is not registered is skipped,
//! - a handle whose writer task has already gone away is skipped,
//! and neither case is reported back to whoever triggered the send.
//! The closed connection's own receive loop is responsible for
//! unregistering it.

use relay_core::OutboundMessage;
use tracing::debug;

use crate::types::{ClientId, ClientRegistry, OutboundTx};

/// Unicast `msg` to `id` if it is registered.
///
/// Returns `true` if the message was handed to a live handle.
pub async fn send_to(registry: &ClientRegistry, id: &ClientId, msg: OutboundMessage) -> bool {
    // Clone the handle out so the lock is not held while sending.
    let handle = {
        let guard = registry.read().await;
        guard.lookup(id)
    };

    match handle {
        Some(tx) => transmit(id, &tx, msg),
        None => {
            debug!(client_id = %id, kind = msg.kind(), "dropping message for unregistered client");
            false
        }
    }
}

/// Send `msg` to every currently registered client.
///
/// Returns how many recipients accepted it.
pub async fn broadcast(registry: &ClientRegistry, msg: &OutboundMessage) -> usize {
    let recipients = {
        let guard = registry.read().await;
        guard.handles()
    };

    deliver(&recipients, msg)
}

/// Fan `msg` out to an already-taken snapshot of handles.
///
/// Each recipient is tried independently; one failure does not stop
/// the others. Never blocks, so it is safe to call with the registry
/// lock held.
pub fn deliver(recipients: &[(ClientId, OutboundTx)], msg: &OutboundMessage) -> usize {
    recipients
        .iter()
        .filter(|(id, tx)| transmit(id, tx, msg.clone()))
        .count()
}

fn transmit(id: &ClientId, tx: &OutboundTx, msg: OutboundMessage) -> bool {
    match tx.send(msg) {
        Ok(()) => true,
        Err(err) => {
            debug!(
                client_id = %id,
                kind = err.0.kind(),
                "connection handle closed, message dropped"
            );
            false
        }
    }
}
