//! End-to-end tests: real WebSocket clients against a relay on an
//! ephemeral port.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedGateway, RECV_TIMEOUT, SILENCE};
use futures_util::{SinkExt, StreamExt};
use relay_server::config::Config;
use relay_server::gateway::CompletionGateway;
use relay_server::server::build_router;
use relay_server::types::{AppState, ClientId};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper: start the relay on a random port and return (addr, state).
async fn start_relay(gateway: Arc<dyn CompletionGateway>, max_clients: usize) -> (SocketAddr, AppState) {
    let config = Config {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        max_clients,
        ..Config::default()
    };
    let state = AppState::new(config, gateway);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Poll the registry until `check` holds (or panic after a while).
async fn wait_for<F>(state: &AppState, what: &str, check: F)
where
    F: Fn(&relay_core::Registry<relay_server::types::OutboundTx>) -> bool,
{
    for _ in 0..200 {
        if check(&*state.registry.read().await) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

struct TestClient {
    id: &'static str,
    ws: WsStream,
}

impl TestClient {
    /// Connect as `id` and wait until the relay has registered us.
    async fn connect(addr: SocketAddr, state: &AppState, id: &'static str) -> Self {
        let url = format!("ws://{}/ws/{}", addr, id);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect to WebSocket");

        wait_for(state, "client registration", |r| r.contains(&ClientId::from(id))).await;
        TestClient { id, ws }
    }

    async fn send(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string()))
            .await
            .expect("send failed");
    }

    /// Next text frame, parsed as JSON.
    async fn recv(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .unwrap_or_else(|_| panic!("{}: timed out waiting for a frame", self.id))
                .expect("stream ended")
                .expect("websocket error");

            if let Message::Text(text) = msg {
                return serde_json::from_str(&text).expect("relay sent invalid JSON");
            }
        }
    }

    /// Assert nothing arrives for a short while.
    async fn expect_silence(&mut self) {
        match tokio::time::timeout(SILENCE, self.ws.next()).await {
            Err(_) => {}
            Ok(Some(Ok(Message::Text(text)))) => {
                panic!("{}: expected silence, got {}", self.id, text)
            }
            Ok(other) => panic!("{}: expected silence, got {:?}", self.id, other),
        }
    }

    async fn close(mut self) {
        self.ws.close(None).await.expect("close failed");
    }
}

fn presence(names: &[&str]) -> Value {
    let users: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
    json!({ "type": "presence_update", "users": users })
}

fn join(name: &str) -> Value {
    json!({ "type": "join", "profile": { "name": name } })
}

#[tokio::test]
async fn status_endpoint_counts_live_connections() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;
    let http = reqwest::Client::new();
    let url = format!("http://{}/", addr);

    let body: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body, json!({ "status": "Aurora Engine Online", "active_users": 0 }));

    let _a = TestClient::connect(addr, &state, "a").await;
    let b = TestClient::connect(addr, &state, "b").await;

    let body: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["active_users"], 2);

    b.close().await;
    wait_for(&state, "b unregistered", |r| r.len() == 1).await;

    let body: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["active_users"], 1);
}

#[tokio::test]
async fn presence_follows_joins_and_disconnects() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;

    let mut a = TestClient::connect(addr, &state, "a").await;
    a.send(join("alice")).await;
    assert_eq!(a.recv().await, presence(&["alice"]));

    let mut b = TestClient::connect(addr, &state, "b").await;
    // Connecting alone announces nothing.
    a.expect_silence().await;

    b.send(join("bob")).await;
    assert_eq!(a.recv().await, presence(&["alice", "bob"]));
    assert_eq!(b.recv().await, presence(&["alice", "bob"]));

    b.close().await;
    assert_eq!(a.recv().await, presence(&["alice"]));
    wait_for(&state, "b unregistered", |r| !r.contains(&ClientId::from("b"))).await;
    assert_eq!(state.registry.read().await.client_ids(), vec![ClientId::from("a")]);
}

#[tokio::test]
async fn signal_is_relayed_point_to_point() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;
    let mut b = TestClient::connect(addr, &state, "b").await;
    let mut c = TestClient::connect(addr, &state, "c").await;

    let offer = json!({ "type": "offer", "sdp": "v=0\r\n" });
    a.send(json!({ "type": "signal", "targetId": "b", "data": offer })).await;

    assert_eq!(
        b.recv().await,
        json!({ "type": "signal", "from": "a", "data": offer })
    );
    a.expect_silence().await;
    c.expect_silence().await;

    a.send(json!({ "type": "signal", "targetId": "nobody", "data": offer })).await;
    a.expect_silence().await;
    b.expect_silence().await;
    c.expect_silence().await;
}

#[tokio::test]
async fn chat_broadcast_reaches_sender_and_peers() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;
    let mut b = TestClient::connect(addr, &state, "b").await;

    let message = json!({ "id": "m-1", "chatId": "global", "text": "hello" });
    b.send(json!({ "type": "chat_broadcast", "message": message })).await;

    let expected = json!({ "type": "new_message", "message": message });
    assert_eq!(a.recv().await, expected);
    assert_eq!(b.recv().await, expected);
    a.expect_silence().await;
    b.expect_silence().await;
}

#[tokio::test]
async fn malformed_frames_are_ignored() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;

    a.send_raw("this is not json").await;
    a.send(json!({ "no_type": true })).await;
    a.send(json!({ "type": "dance" })).await;
    a.send(json!({ "type": "ai_request" })).await;
    a.expect_silence().await;

    // Still open and still routed.
    a.send(json!({ "type": "chat_broadcast", "message": "ok" })).await;
    assert_eq!(a.recv().await, json!({ "type": "new_message", "message": "ok" }));
    assert!(state.registry.read().await.contains(&ClientId::from("a")));
}

#[tokio::test]
async fn ai_request_gets_typing_then_reply() {
    let gateway = Arc::new(ScriptedGateway::replying("Metaphors are bridges."));
    let (addr, state) = start_relay(gateway.clone(), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;
    let mut b = TestClient::connect(addr, &state, "b").await;

    a.send(json!({ "type": "ai_request", "text": "say something" })).await;

    assert_eq!(a.recv().await, json!({ "type": "typing", "status": true }));
    assert_eq!(
        a.recv().await,
        json!({ "type": "ai_response", "text": "Metaphors are bridges.", "senderId": "ai-gemini" })
    );
    a.expect_silence().await;
    b.expect_silence().await;
    assert_eq!(gateway.prompts(), vec!["say something".to_string()]);
}

#[tokio::test]
async fn ai_failure_gets_fixed_error_reply() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::failing()), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;

    a.send(json!({ "type": "ai_request", "text": "hello" })).await;

    assert_eq!(a.recv().await, json!({ "type": "typing", "status": true }));
    assert_eq!(
        a.recv().await,
        json!({ "type": "ai_response", "text": "AI connection error...", "senderId": "ai-gemini" })
    );
    a.expect_silence().await;

    // The failure did not close the connection.
    a.send(json!({ "type": "chat_broadcast", "message": 1 })).await;
    assert_eq!(a.recv().await, json!({ "type": "new_message", "message": 1 }));
}

#[tokio::test]
async fn connections_beyond_max_clients_are_refused() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 1).await;
    let _a = TestClient::connect(addr, &state, "a").await;

    let url = format!("ws://{}/ws/b", addr);
    match tokio_tungstenite::connect_async(&url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 503);
        }
        Err(other) => panic!("expected HTTP 503, got {other:?}"),
        Ok(_) => panic!("connection should have been refused"),
    }
    assert_eq!(state.active_connections().await, 1);
}

#[tokio::test]
async fn concurrent_upgrades_never_exceed_max_clients() {
    const MAX: usize = 2;
    const ATTEMPTS: usize = 12;
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), MAX).await;

    let attempts: Vec<_> = (0..ATTEMPTS)
        .map(|i| {
            let url = format!("ws://{}/ws/c{}", addr, i);
            tokio::spawn(async move { tokio_tungstenite::connect_async(url).await })
        })
        .collect();

    // Keep every accepted socket open while counting.
    let mut open = Vec::new();
    for attempt in attempts {
        match attempt.await.expect("connect task panicked") {
            Ok((ws, _)) => open.push(ws),
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                assert_eq!(response.status().as_u16(), 503);
            }
            Err(other) => panic!("unexpected connect error: {other:?}"),
        }
    }
    assert!(!open.is_empty());

    tokio::time::sleep(SILENCE).await;
    assert!(state.active_connections().await <= MAX);

    // Upgrades admitted past the handler check are closed with 1013.
    let mut still_open = 0;
    for ws in open.iter_mut() {
        match tokio::time::timeout(SILENCE, ws.next()).await {
            Ok(Some(Ok(Message::Close(Some(frame))))) => {
                assert_eq!(u16::from(frame.code), 1013);
            }
            Err(_) => still_open += 1,
            Ok(other) => panic!("unexpected frame: {other:?}"),
        }
    }
    assert_eq!(still_open, state.active_connections().await);
}

#[tokio::test]
async fn peer_close_is_answered_with_close_frame() {
    let (addr, state) = start_relay(Arc::new(ScriptedGateway::replying("x")), 16).await;
    let mut a = TestClient::connect(addr, &state, "a").await;

    a.ws.close(None).await.expect("close failed");

    let reply = tokio::time::timeout(RECV_TIMEOUT, a.ws.next())
        .await
        .expect("timed out waiting for close reply");
    assert!(
        matches!(reply, Some(Ok(Message::Close(_)))),
        "expected a close frame, got {reply:?}"
    );
    wait_for(&state, "a unregistered", |r| r.is_empty()).await;
}
