/// WebSocket connection handler
///
/// One task per connection:
/// - subscribe to the topic, then send the current document
/// - forward hub frames to the client
/// - validate inbound frames against the connection's access level
/// - heartbeat and idle timeout
/// - release the subscription on the single teardown path
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::{
    arguments::is_debug_websocket_enabled,
    capability::AccessLevel,
    logger::{self, LogTag},
    topics::{validation::validate_emoji, TopicDirectory},
    webserver::{state::AppState, wait_for_shutdown},
};

use super::{
    health::{ConnectionHealth, HealthAction, HealthConfig},
    hub::Broadcaster,
    message::{ErrorFrame, InboundMessage, OutboundMessage},
    metrics::ConnectionMetrics,
};

type WsSender = SplitSink<WebSocket, Message>;

/// Immutable facts about one connection, fixed at upgrade time
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub topic_id: String,
    pub access: AccessLevel,
}

/// Drive a WebSocket connection until it closes
pub async fn handle_connection(socket: WebSocket, state: Arc<AppState>, ctx: ConnectionContext) {
    // Subscribe before reading content so no update can slip between the two
    let mut subscription = state.hub.subscribe(&ctx.topic_id);

    let (mut ws_tx, mut ws_rx) = socket.split();
    let metrics = ConnectionMetrics::new();
    let health_config = HealthConfig::from_config(&state.config.websocket);
    let mut ticker = tokio::time::interval(health_config.check_interval());
    let mut health = ConnectionHealth::new(health_config);
    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    logger::info(
        LogTag::Websocket,
        &format!(
            "WebSocket connected: topic={}, access={}",
            ctx.topic_id, ctx.access
        ),
    );

    match state.directory.get_topic(&ctx.topic_id).await {
        Ok(Some(topic)) if !topic.markdown.is_empty() => {
            let initial = OutboundMessage::content(topic.markdown);
            if let Err(e) = send_outbound(&mut ws_tx, &initial, &metrics).await {
                logger::warning(
                    LogTag::Websocket,
                    &format!("Topic {}: failed to send initial content: {}", ctx.topic_id, e),
                );
            }
        }
        Ok(_) => {}
        Err(e) => logger::error(
            LogTag::Websocket,
            &format!("Topic {}: failed to load initial content: {}", ctx.topic_id, e),
        ),
    }

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            // Frames from the hub (broadcasts for this topic)
            frame = subscription.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = ws_tx.send(Message::Text(frame.to_string())).await {
                    logger::warning(
                        LogTag::Websocket,
                        &format!("Topic {}: failed to forward frame: {}", ctx.topic_id, e),
                    );
                    break;
                }
                metrics.inc_sent();
            }

            // Frames from the client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        health.record_activity();
                        metrics.inc_received();

                        let replies = process_inbound(
                            &text,
                            &ctx,
                            &state.directory,
                            state.hub.as_ref(),
                        )
                        .await;

                        let mut failed = false;
                        for reply in replies {
                            if let Err(e) = send_error(&mut ws_tx, &reply, &metrics).await {
                                logger::warning(
                                    LogTag::Websocket,
                                    &format!("Topic {}: failed to send error frame: {}", ctx.topic_id, e),
                                );
                                failed = true;
                                break;
                            }
                        }
                        if failed {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        health.record_activity();
                        metrics.inc_received();
                        if send_error(&mut ws_tx, &ErrorFrame::invalid_message(), &metrics)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        health.record_activity();
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        if is_debug_websocket_enabled() {
                            logger::debug(
                                LogTag::Websocket,
                                &format!("Topic {}: client closed", ctx.topic_id),
                            );
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Websocket,
                            &format!("Topic {}: websocket error: {}", ctx.topic_id, e),
                        );
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                match health.check() {
                    HealthAction::Nothing => {}
                    HealthAction::SendPing => {
                        if is_debug_websocket_enabled() {
                            logger::debug(
                                LogTag::Websocket,
                                &format!("Topic {}: sending ping", ctx.topic_id),
                            );
                        }
                        if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                        health.record_ping();
                    }
                    HealthAction::Close => {
                        logger::warning(
                            LogTag::Websocket,
                            &format!(
                                "Topic {}: heartbeat failed ({}s since last activity)",
                                ctx.topic_id,
                                health.seconds_since_activity()
                            ),
                        );
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    // Teardown: the only place the subscription is released
    subscription.unsubscribe();

    let snapshot = metrics.snapshot();
    logger::info(
        LogTag::Websocket,
        &format!("WebSocket disconnected: topic={}", ctx.topic_id),
    );
    if is_debug_websocket_enabled() {
        logger::debug(
            LogTag::Websocket,
            &format!(
                "Topic {}: connection stats (sent={}, received={}, errors={})",
                ctx.topic_id, snapshot.frames_sent, snapshot.frames_received, snapshot.errors_sent
            ),
        );
    }
}

/// Apply one inbound text frame
///
/// Each field is handled on its own: a rejected field does not stop the
/// others. Returns the error frames owed to the sender; successful writes
/// reach every subscriber (the sender included) through the hub.
pub async fn process_inbound(
    text: &str,
    ctx: &ConnectionContext,
    directory: &TopicDirectory,
    hub: &dyn Broadcaster,
) -> Vec<ErrorFrame> {
    let msg = match InboundMessage::parse(text) {
        Ok(msg) => msg,
        Err(e) => {
            if is_debug_websocket_enabled() {
                logger::debug(
                    LogTag::Websocket,
                    &format!("Topic {}: invalid message: {}", ctx.topic_id, e),
                );
            }
            return vec![ErrorFrame::invalid_message()];
        }
    };

    let mut replies = Vec::new();
    let mut forbidden = false;
    let mut malformed = false;

    if msg.markdown.is_some() {
        if !ctx.access.is_writable() {
            forbidden = true;
        } else if let Some(markdown) = msg.content() {
            match directory.update_content(&ctx.topic_id, markdown).await {
                Ok(_) => {
                    hub.broadcast(&ctx.topic_id, &OutboundMessage::content(markdown));
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Websocket,
                        &format!("Topic {}: content update rejected: {}", ctx.topic_id, e),
                    );
                    replies.push(ErrorFrame::from_topic_error(&e));
                }
            }
        } else {
            malformed = true;
        }
    }

    if msg.has_navigation() {
        if !ctx.access.is_writable() {
            forbidden = true;
        } else if msg.has_null_navigation() {
            malformed = true;
        } else {
            hub.broadcast(
                &ctx.topic_id,
                &OutboundMessage::navigation(
                    msg.current_page.clone().flatten(),
                    msg.current_section.clone().flatten(),
                ),
            );
        }
    }

    // Writers sending `null` for a write field
    if malformed {
        replies.push(ErrorFrame::invalid_message());
    }

    // One FORBIDDEN per frame, however many write fields it carried
    if forbidden {
        if is_debug_websocket_enabled() {
            logger::debug(
                LogTag::Websocket,
                &format!(
                    "Topic {}: write attempted at access level {}",
                    ctx.topic_id, ctx.access
                ),
            );
        }
        replies.push(ErrorFrame::forbidden());
    }

    if let Some(reaction) = msg.reaction() {
        if validate_emoji(&reaction.emoji) {
            hub.broadcast(&ctx.topic_id, &OutboundMessage::reaction(reaction.clone()));
        } else {
            replies.push(ErrorFrame::invalid_emoji());
        }
    }

    replies
}

async fn send_outbound(
    ws_tx: &mut WsSender,
    message: &OutboundMessage,
    metrics: &Arc<ConnectionMetrics>,
) -> Result<(), String> {
    let json = message
        .to_json()
        .map_err(|e| format!("Serialization error: {}", e))?;
    ws_tx
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("Send error: {}", e))?;
    metrics.inc_sent();
    Ok(())
}

async fn send_error(
    ws_tx: &mut WsSender,
    frame: &ErrorFrame,
    metrics: &Arc<ConnectionMetrics>,
) -> Result<(), String> {
    let json = frame
        .to_json()
        .map_err(|e| format!("Serialization error: {}", e))?;
    ws_tx
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("Send error: {}", e))?;
    metrics.inc_sent();
    metrics.inc_errors();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityCodec, TopicPair};
    use crate::config::TopicsConfig;
    use crate::storage::MemoryStore;
    use crate::webserver::ws::hub::{Subscription, TopicHub};

    struct Fixture {
        directory: TopicDirectory,
        hub: TopicHub,
        pair: TopicPair,
    }

    async fn fixture() -> Fixture {
        let directory = TopicDirectory::new(
            Arc::new(MemoryStore::new()),
            Arc::new(CapabilityCodec::ephemeral()),
            &TopicsConfig::default(),
        );
        let pair = directory.create_topic().await.unwrap();
        Fixture {
            directory,
            hub: TopicHub::new(16),
            pair,
        }
    }

    fn ctx(pair: &TopicPair, access: AccessLevel) -> ConnectionContext {
        ConnectionContext {
            topic_id: pair.topic_id.clone(),
            access,
        }
    }

    fn drain(sub: &mut Subscription) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Some(frame) = sub.try_recv() {
            frames.push(serde_json::from_str(&frame).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn test_writer_content_is_persisted_and_broadcast() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let writer = ctx(&f.pair, AccessLevel::Writable);

        let replies =
            process_inbound(r##"{"markdown":"# New"}"##, &writer, &f.directory, &f.hub).await;
        assert!(replies.is_empty());

        assert_eq!(drain(&mut viewer), vec![serde_json::json!({"markdown": "# New"})]);
        let topic = f.directory.get_topic(&f.pair.topic_id).await.unwrap().unwrap();
        assert_eq!(topic.markdown, "# New");
    }

    #[tokio::test]
    async fn test_reader_write_is_forbidden_without_broadcast() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let reader = ctx(&f.pair, AccessLevel::Readable);

        let replies = process_inbound(
            r##"{"markdown":"# Hack","currentPage":2}"##,
            &reader,
            &f.directory,
            &f.hub,
        )
        .await;
        assert_eq!(replies, vec![ErrorFrame::forbidden()]);

        assert!(drain(&mut viewer).is_empty());
        let topic = f.directory.get_topic(&f.pair.topic_id).await.unwrap().unwrap();
        assert_eq!(topic.markdown, "");
    }

    #[tokio::test]
    async fn test_navigation_carries_supplied_fields_only() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let writer = ctx(&f.pair, AccessLevel::Writable);

        process_inbound(r#"{"currentSection":4}"#, &writer, &f.directory, &f.hub).await;
        process_inbound(r#"{"currentPage":1,"currentSection":0}"#, &writer, &f.directory, &f.hub)
            .await;

        assert_eq!(
            drain(&mut viewer),
            vec![
                serde_json::json!({"currentSection": 4}),
                serde_json::json!({"currentPage": 1, "currentSection": 0}),
            ]
        );
    }

    #[tokio::test]
    async fn test_reactions_open_to_readers() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let reader = ctx(&f.pair, AccessLevel::Readable);

        let replies = process_inbound(
            r#"{"pub":{"reaction":{"emoji":"🎉","timestamp":1700000000000}}}"#,
            &reader,
            &f.directory,
            &f.hub,
        )
        .await;
        assert!(replies.is_empty());
        assert_eq!(
            drain(&mut viewer),
            vec![serde_json::json!({"pub": {"reaction": {"emoji": "🎉", "timestamp": 1700000000000u64}}})]
        );
    }

    #[tokio::test]
    async fn test_invalid_emoji_goes_to_sender_only() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let reader = ctx(&f.pair, AccessLevel::Readable);

        for emoji in ["", "this is far too long"] {
            let frame = serde_json::json!({"pub": {"reaction": {"emoji": emoji, "timestamp": 1}}});
            let replies =
                process_inbound(&frame.to_string(), &reader, &f.directory, &f.hub).await;
            assert_eq!(replies, vec![ErrorFrame::invalid_emoji()]);
        }
        assert!(drain(&mut viewer).is_empty());
    }

    #[tokio::test]
    async fn test_fields_handled_independently() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let reader = ctx(&f.pair, AccessLevel::Readable);

        // Forbidden content does not swallow the reaction
        let replies = process_inbound(
            r#"{"markdown":"x","pub":{"reaction":{"emoji":"👍","timestamp":5}}}"#,
            &reader,
            &f.directory,
            &f.hub,
        )
        .await;
        assert_eq!(replies, vec![ErrorFrame::forbidden()]);
        assert_eq!(drain(&mut viewer).len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_frames() {
        let f = fixture().await;
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let writer = ctx(&f.pair, AccessLevel::Writable);

        for text in ["{", "null", r#"{"markdown":42}"#, r#"{"currentPage":"1"}"#] {
            let replies = process_inbound(text, &writer, &f.directory, &f.hub).await;
            assert_eq!(replies, vec![ErrorFrame::invalid_message()]);
        }
        assert!(drain(&mut viewer).is_empty());
    }

    #[tokio::test]
    async fn test_null_write_fields_are_not_ignored() {
        let f = fixture().await;
        f.directory.update_content(&f.pair.topic_id, "# Keep").await.unwrap();
        let mut viewer = f.hub.subscribe(&f.pair.topic_id);
        let reader = ctx(&f.pair, AccessLevel::Readable);
        let writer = ctx(&f.pair, AccessLevel::Writable);

        for text in [r#"{"markdown":null}"#, r#"{"currentPage":null}"#] {
            let replies = process_inbound(text, &reader, &f.directory, &f.hub).await;
            assert_eq!(replies, vec![ErrorFrame::forbidden()], "reader sent {}", text);

            let replies = process_inbound(text, &writer, &f.directory, &f.hub).await;
            assert_eq!(replies, vec![ErrorFrame::invalid_message()], "writer sent {}", text);
        }

        // A null sibling spoils the whole navigation update
        let replies = process_inbound(
            r#"{"currentPage":3,"currentSection":null}"#,
            &writer,
            &f.directory,
            &f.hub,
        )
        .await;
        assert_eq!(replies, vec![ErrorFrame::invalid_message()]);

        assert!(drain(&mut viewer).is_empty());
        let topic = f.directory.get_topic(&f.pair.topic_id).await.unwrap().unwrap();
        assert_eq!(topic.markdown, "# Keep");
    }

    #[tokio::test]
    async fn test_oversized_content_reports_too_large() {
        let f = fixture().await;
        let writer = ctx(&f.pair, AccessLevel::Writable);
        let body = serde_json::json!({"markdown": "x".repeat(1_048_577)}).to_string();

        let replies = process_inbound(&body, &writer, &f.directory, &f.hub).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].code, "TOO_LARGE");
    }

    #[tokio::test]
    async fn test_other_topic_receives_nothing() {
        let f = fixture().await;
        let other = f.directory.create_topic().await.unwrap();
        let mut bystander = f.hub.subscribe(&other.topic_id);
        let writer = ctx(&f.pair, AccessLevel::Writable);

        process_inbound(r##"{"markdown":"# New"}"##, &writer, &f.directory, &f.hub).await;
        assert!(drain(&mut bystander).is_empty());
    }
}
