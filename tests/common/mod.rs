#![allow(dead_code)]

use futures::StreamExt;
use livemark::{
    capability::CapabilityCodec,
    config::Config,
    storage::{ContentStore, MemoryStore},
    topics::TopicDirectory,
    webserver::{ws::TopicHub, AppState},
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_state() -> Arc<AppState> {
    state_with_store(Arc::new(MemoryStore::new()))
}

pub fn state_with_store(store: Arc<dyn ContentStore>) -> Arc<AppState> {
    let config = Config::default();
    let directory = Arc::new(TopicDirectory::new(
        store,
        Arc::new(CapabilityCodec::ephemeral()),
        &config.topics,
    ));
    let hub = Arc::new(TopicHub::new(config.websocket.client_buffer_size));
    Arc::new(AppState::new(config, directory, hub))
}

/// Serve on an ephemeral port for the rest of the test
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(livemark::webserver::serve(listener, state));
    addr
}

pub async fn connect(addr: SocketAddr, topic_id: &str, secret: Option<&str>) -> WsClient {
    let url = match secret {
        Some(secret) => format!("ws://{}/topics/{}?secret={}", addr, topic_id, secret),
        None => format!("ws://{}/topics/{}", addr, topic_id),
    };
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

/// The server subscribes after the handshake; wait until it has
pub async fn wait_for_subscribers(state: &AppState, topic_id: &str, count: usize) {
    for _ in 0..200 {
        if state.hub.subscriber_count(topic_id) >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} subscribers on {}, found {}",
        count,
        topic_id,
        state.hub.subscriber_count(topic_id)
    );
}

/// Next text frame as JSON
pub async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Assert no text frame arrives within a short window
pub async fn expect_silence(ws: &mut WsClient) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(200);
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => panic!("unexpected frame: {}", text),
            Ok(Some(Ok(_))) => continue,
            Ok(other) => panic!("connection ended unexpectedly: {:?}", other),
        }
    }
}
