//! Message router.
//!
//! Dispatches each decoded [`InboundMessage`] from a connection to one of
//! four delivery strategies:
//!
//! - `join`           => store profile, broadcast `presence_update` to **all**.
//! - `signal`         => unicast `signal{from, data}` to the target, if live.
//! - `chat_broadcast` => broadcast `new_message` to **all**.
//! - `ai_request`     => `typing` to the requester, then a spawned completion
//!                       whose `ai_response` goes to the requester only.
//!
//! Called from the sender's receive loop, so messages from one connection
//! are routed in the order they arrived.

use relay_core::{InboundMessage, OutboundMessage, Profile};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::delivery;
use crate::gateway::CompletionGateway;
use crate::types::{AppState, ClientId, ClientRegistry};

/// Route a single inbound message from `sender`.
pub async fn route(state: &AppState, sender: &ClientId, msg: InboundMessage) {
    debug!(client_id = %sender, kind = msg.kind(), "routing message");

    match msg {
        InboundMessage::Join(join) => {
            announce_profile(&state.registry, sender, join.profile).await;
        }
        InboundMessage::Signal(signal) => {
            let delivered = delivery::send_to(
                &state.registry,
                &signal.target_id,
                OutboundMessage::signal(sender.clone(), signal.data),
            )
            .await;

            if !delivered {
                debug!(
                    client_id = %sender,
                    target_id = %signal.target_id,
                    "signal target not connected, dropped"
                );
            }
        }
        InboundMessage::ChatBroadcast(chat) => {
            delivery::broadcast(&state.registry, &OutboundMessage::new_message(chat.message)).await;
        }
        InboundMessage::AiRequest(request) => {
            // Detached; the reply is unicast when the completion finishes.
            let _ = spawn_completion(state, sender.clone(), request.text).await;
        }
    }
}

/// Store `profile` for `id` and broadcast the resulting presence to all.
///
/// The profile write, the snapshot and the enqueue onto every handle
/// happen under one write lock, so concurrent joins and disconnects
/// reach each recipient in the order they were applied and the last
/// `presence_update` anyone sees matches the registry.
pub async fn announce_profile(registry: &ClientRegistry, id: &ClientId, profile: Profile) -> usize {
    let mut guard = registry.write().await;
    guard.set_profile(id.clone(), profile);

    let update = OutboundMessage::presence_update(guard.snapshot_profiles());
    delivery::deliver(&guard.handles(), &update)
}

/// Remove `id` and broadcast the post-removal presence to everyone left.
///
/// Same locking as [`announce_profile`].
pub async fn withdraw_client(registry: &ClientRegistry, id: &ClientId) -> usize {
    let mut guard = registry.write().await;
    if !guard.unregister(id) {
        debug!(client_id = %id, "client already gone from registry");
    }

    let update = OutboundMessage::presence_update(guard.snapshot_profiles());
    delivery::deliver(&guard.handles(), &update)
}

/// Send `typing` to the requester, then run the completion on its own task.
///
/// The task is detached from the connection: if the requester leaves
/// before it finishes, the reply is dropped by the delivery engine.
pub async fn spawn_completion(state: &AppState, requester: ClientId, prompt: String) -> JoinHandle<()> {
    delivery::send_to(&state.registry, &requester, OutboundMessage::typing(true)).await;

    let registry = state.registry.clone();
    let gateway = state.gateway.clone();

    tokio::spawn(async move {
        let reply = complete_or_error(gateway.as_ref(), &requester, &prompt).await;
        delivery::send_to(&registry, &requester, reply).await;
    })
}

/// Exactly one `ai_response` for one prompt; failures become the fixed
/// error text and are only logged here.
async fn complete_or_error(
    gateway: &dyn CompletionGateway,
    requester: &ClientId,
    prompt: &str,
) -> OutboundMessage {
    match gateway.complete(prompt).await {
        Ok(text) => {
            info!(client_id = %requester, reply_len = text.len(), "completion succeeded");
            OutboundMessage::ai_response(text)
        }
        Err(err) => {
            warn!(client_id = %requester, error = %err, "completion failed");
            OutboundMessage::ai_error()
        }
    }
}
