mod common;

use common::{connect, expect_silence, next_json, spawn_server, test_state, wait_for_subscribers};
use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::{self, Message};

async fn send(ws: &mut common::WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_subscriber_receives_existing_content_first() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();
    state
        .directory
        .update_content(&pair.topic_id, "# Hi")
        .await
        .unwrap();

    let mut viewer = connect(addr, &pair.topic_id, None).await;
    assert_eq!(next_json(&mut viewer).await, json!({"markdown": "# Hi"}));
}

#[tokio::test]
async fn test_empty_topic_sends_nothing_on_connect() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut viewer = connect(addr, &pair.topic_id, None).await;
    expect_silence(&mut viewer).await;
}

#[tokio::test]
async fn test_publisher_update_reaches_all_tabs_of_the_topic() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();
    let other = state.directory.create_topic().await.unwrap();

    let mut publisher = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut second_tab = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut viewer = connect(addr, &pair.topic_id, None).await;
    let mut bystander = connect(addr, &other.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 3).await;
    wait_for_subscribers(&state, &other.topic_id, 1).await;

    send(&mut publisher, json!({"markdown": "# New"})).await;

    for ws in [&mut publisher, &mut second_tab, &mut viewer] {
        assert_eq!(next_json(ws).await, json!({"markdown": "# New"}));
    }
    expect_silence(&mut bystander).await;

    let stored = state.directory.get_topic(&pair.topic_id).await.unwrap().unwrap();
    assert_eq!(stored.markdown, "# New");
}

#[tokio::test]
async fn test_subscriber_write_is_forbidden() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut publisher = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 2).await;

    send(&mut viewer, json!({"markdown": "# Hack"})).await;
    let reply = next_json(&mut viewer).await;
    assert_eq!(reply["code"], "FORBIDDEN");
    assert!(reply["error"].is_string());

    send(&mut viewer, json!({"currentPage": 3})).await;
    assert_eq!(next_json(&mut viewer).await["code"], "FORBIDDEN");

    expect_silence(&mut publisher).await;
    let stored = state.directory.get_topic(&pair.topic_id).await.unwrap().unwrap();
    assert_eq!(stored.markdown, "");

    // The connection stays usable after an error frame
    send(&mut publisher, json!({"currentSection": 1})).await;
    assert_eq!(next_json(&mut viewer).await, json!({"currentSection": 1}));
}

#[tokio::test]
async fn test_navigation_relays_supplied_fields() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut publisher = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 2).await;

    send(&mut publisher, json!({"currentPage": 2, "currentSection": 5})).await;
    assert_eq!(
        next_json(&mut viewer).await,
        json!({"currentPage": 2, "currentSection": 5})
    );

    send(&mut publisher, json!({"currentPage": 3})).await;
    assert_eq!(next_json(&mut viewer).await, json!({"currentPage": 3}));
}

#[tokio::test]
async fn test_reactions_from_viewers() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut publisher = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 2).await;

    let reaction = json!({"pub": {"reaction": {"emoji": "👏", "timestamp": 1718000000000u64}}});
    send(&mut viewer, reaction.clone()).await;

    // Delivered to everyone, the sender included
    assert_eq!(next_json(&mut publisher).await, reaction);
    assert_eq!(next_json(&mut viewer).await, reaction);
}

#[tokio::test]
async fn test_invalid_emoji_is_reported_to_sender_only() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut publisher = connect(addr, &pair.topic_id, Some(&pair.secret)).await;
    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 2).await;

    send(
        &mut viewer,
        json!({"pub": {"reaction": {"emoji": "way too long for an emoji", "timestamp": 1}}}),
    )
    .await;
    assert_eq!(next_json(&mut viewer).await["code"], "INVALID_EMOJI");
    expect_silence(&mut publisher).await;
}

#[tokio::test]
async fn test_unparseable_frames_keep_connection_open() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 1).await;

    viewer
        .send(Message::Text("{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut viewer).await["code"], "INVALID_MESSAGE");

    viewer.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    assert_eq!(next_json(&mut viewer).await["code"], "INVALID_MESSAGE");

    send(&mut viewer, json!({"pub": {"reaction": {"emoji": "🙂", "timestamp": 2}}})).await;
    assert_eq!(next_json(&mut viewer).await["pub"]["reaction"]["emoji"], "🙂");
}

#[tokio::test]
async fn test_http_publish_is_broadcast() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 1).await;

    // Minimal HTTP/1.1 client so no extra HTTP crate is needed
    let body = json!({"markdown": "# From HTTP"}).to_string();
    let request = format!(
        "POST /topics/{}?secret={} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        pair.topic_id,
        pair.secret,
        addr,
        body.len(),
        body
    );
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();
    assert!(response.starts_with("HTTP/1.1 201"), "{}", response);

    assert_eq!(next_json(&mut viewer).await, json!({"markdown": "# From HTTP"}));
}

#[tokio::test]
async fn test_upgrade_rejections() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();
    let missing = state.directory.codec().generate_topic();

    let status_of = |url: String| async move {
        match tokio_tungstenite::connect_async(url).await {
            Err(tungstenite::Error::Http(response)) => response.status().as_u16(),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => 101,
        }
    };

    assert_eq!(
        status_of(format!("ws://{}/topics/{}?secret=wrong", addr, pair.topic_id)).await,
        403
    );
    assert_eq!(
        status_of(format!("ws://{}/topics/{}", addr, missing.topic_id)).await,
        404
    );
    assert_eq!(status_of(format!("ws://{}/topics/nope", addr)).await, 400);
    assert_eq!(
        status_of(format!("ws://{}/topics/{}", addr, pair.topic_id)).await,
        101
    );
}

#[tokio::test]
async fn test_closing_releases_subscription() {
    let state = test_state();
    let addr = spawn_server(state.clone()).await;
    let pair = state.directory.create_topic().await.unwrap();

    let mut viewer = connect(addr, &pair.topic_id, None).await;
    wait_for_subscribers(&state, &pair.topic_id, 1).await;
    assert_eq!(state.active_connections(), 1);

    viewer.close(None).await.unwrap();
    drop(viewer);

    for _ in 0..200 {
        if state.hub.subscriber_count(&pair.topic_id) == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(state.hub.subscriber_count(&pair.topic_id), 0);
    assert_eq!(state.active_connections(), 0);
}
