//! Shutdown flips a process-wide flag, so these tests live in their own binary.
mod common;

use common::{connect, test_state, wait_for_subscribers, WsClient};
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

async fn expect_closed(ws: &mut WsClient) {
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "connection stayed open after shutdown");
}

#[tokio::test]
async fn test_shutdown_closes_connections_opened_before_and_after_the_signal() {
    let state = test_state();
    let pair = state.directory.create_topic().await.unwrap();

    // No graceful shutdown on this listener: the router keeps accepting upgrades
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = livemark::webserver::build_app(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await });

    let mut early = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 1).await;

    livemark::webserver::shutdown();
    expect_closed(&mut early).await;

    // Waiting after the fact resolves at once
    tokio::time::timeout(
        Duration::from_secs(1),
        livemark::webserver::wait_for_shutdown(),
    )
    .await
    .expect("late waiter missed the shutdown signal");

    let mut late = connect(addr, &pair.topic_id, None).await;
    expect_closed(&mut late).await;

    for _ in 0..200 {
        if state.hub.subscriber_count(&pair.topic_id) == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("subscriptions were not released after shutdown");
}
