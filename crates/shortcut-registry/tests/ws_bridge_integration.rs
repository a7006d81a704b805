//! Registry over a real WebSocket connection to a fake host.
//!
//! The fake host speaks the same frames as a real one: it tracks
//! registrations, answers `query` on the per-call channel, and broadcasts
//! `fired` when told to press a key.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use shortcut_core::{Accelerator, BridgeFrame, HostEvent, HostRequest};
use shortcut_registry::infrastructure::bridge::WsBridge;
use shortcut_registry::{QueryError, ShortcutRegistry};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Commands the test sends to the fake host.
enum HostCommand {
    Press(Accelerator),
}

/// Starts a single-connection fake host and returns its URL, a command
/// sender, and a receiver of every request it parsed.
async fn spawn_fake_host() -> (
    String,
    mpsc::UnboundedSender<HostCommand>,
    mpsc::UnboundedReceiver<HostRequest>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<HostCommand>();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel::<HostRequest>();

    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        let mut registered: HashSet<Accelerator> = HashSet::new();

        loop {
            let reply = tokio::select! {
                message = ws.next() => {
                    let Some(Ok(Message::Text(text))) = message else { break };
                    let frame = BridgeFrame::from_json(&text).expect("controller frame");
                    let request = HostRequest::from_frame(&frame).expect("known request");
                    let reply = match &request {
                        HostRequest::Register(acc) => {
                            registered.insert(acc.clone());
                            None
                        }
                        HostRequest::Unregister(acc) => {
                            registered.remove(acc);
                            None
                        }
                        HostRequest::UnregisterAll => {
                            registered.clear();
                            None
                        }
                        HostRequest::Query { accelerator, correlation } => {
                            Some(HostEvent::QueryCompleted {
                                correlation: *correlation,
                                registered: registered.contains(accelerator),
                            })
                        }
                    };
                    let _ = seen_tx.send(request);
                    reply
                }
                command = cmd_rx.recv() => match command {
                    Some(HostCommand::Press(acc)) if registered.contains(&acc) => {
                        Some(HostEvent::Fired(acc))
                    }
                    Some(HostCommand::Press(_)) => None,
                    None => break,
                },
            };

            if let Some(event) = reply {
                let text = event.to_frame().to_json().expect("encode");
                if ws.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    (url, cmd_tx, seen_rx)
}

async fn next_request(seen: &mut mpsc::UnboundedReceiver<HostRequest>) -> HostRequest {
    tokio::time::timeout(Duration::from_secs(5), seen.recv())
        .await
        .expect("host saw a request in time")
        .expect("host still running")
}

#[tokio::test]
async fn test_register_query_fire_over_websocket() {
    // Arrange
    let (url, host, mut seen) = spawn_fake_host().await;
    let bridge = WsBridge::connect(&url, Duration::from_secs(5))
        .await
        .expect("connect");
    let registry = ShortcutRegistry::new(Arc::new(bridge));
    let (fired_tx, mut fired_rx) = mpsc::unbounded_channel();

    // Act: register, and wait for the host to record it.
    registry
        .register("CmdOrCtrl+X", move || {
            let _ = fired_tx.send(());
        })
        .expect("register");
    assert!(matches!(next_request(&mut seen).await, HostRequest::Register(_)));

    // Assert: the host reports it as registered.
    let held = registry
        .is_registered("CmdOrCtrl+X")
        .expect("query")
        .with_timeout(Duration::from_secs(5))
        .await;
    assert_eq!(held, Ok(true));

    // Assert: a key press reaches the callback.
    host.send(HostCommand::Press("CmdOrCtrl+X".parse().expect("accelerator")))
        .expect("host alive");
    tokio::time::timeout(Duration::from_secs(5), fired_rx.recv())
        .await
        .expect("callback ran in time")
        .expect("callback sender alive");
}

#[tokio::test]
async fn test_unregister_then_query_reports_false() {
    // Arrange
    let (url, _host, mut seen) = spawn_fake_host().await;
    let bridge = WsBridge::connect(&url, Duration::from_secs(5))
        .await
        .expect("connect");
    let registry = ShortcutRegistry::new(Arc::new(bridge));

    // Act
    registry.register("CmdOrCtrl+Y", || {}).expect("register");
    registry.unregister("CmdOrCtrl+Y").expect("unregister");
    let answer = registry
        .is_registered("CmdOrCtrl+Y")
        .expect("query")
        .with_timeout(Duration::from_secs(5))
        .await;

    // Assert: requests arrived in call order and the host says "free".
    assert!(matches!(next_request(&mut seen).await, HostRequest::Register(_)));
    assert!(matches!(next_request(&mut seen).await, HostRequest::Unregister(_)));
    assert!(matches!(next_request(&mut seen).await, HostRequest::Query { .. }));
    assert_eq!(answer, Ok(false));
}

#[tokio::test]
async fn test_pending_query_fails_when_host_disconnects() {
    // Arrange: a host that reads one query and hangs up without answering.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("ws://{}", listener.local_addr().expect("addr"));
    let host = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = accept_async(tcp).await.expect("handshake");
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected a query frame");
        };
        let frame = BridgeFrame::from_json(&text).expect("controller frame");
        assert!(matches!(
            HostRequest::from_frame(&frame),
            Ok(HostRequest::Query { .. })
        ));
        ws.close(None).await.expect("close");
    });
    let bridge = Arc::new(
        WsBridge::connect(&url, Duration::from_secs(5))
            .await
            .expect("connect"),
    );
    let registry = ShortcutRegistry::new(bridge.clone());

    // Act
    let query = registry.is_registered("F1").expect("query");
    let answer = tokio::time::timeout(Duration::from_secs(5), query)
        .await
        .expect("query resolved after disconnect");

    // Assert
    host.await.expect("host task");
    assert_eq!(answer, Err(QueryError::ChannelClosed));
    assert!(!bridge.is_connected());

    // A query started after the disconnect cannot be sent and fails at once.
    let late = registry.is_registered("F2").expect("query").await;
    assert_eq!(late, Err(QueryError::ChannelClosed));
}
