//! WebSocket bridge to the host process.
//!
//! Each emission is wrapped in a [`BridgeFrame`] and sent as one JSON text
//! message; each inbound text message is parsed as a frame and routed to the
//! handler subscribed to its event name.
//!
//! # Task layout
//!
//! ```text
//! emit() ──► unbounded mpsc ──► writer task ──► WebSocket sink ──► host
//! host ──► WebSocket stream ──► reader task ──► handlers[event](args[0])
//! ```
//!
//! - **Ordering**: every `emit` goes through one FIFO queue drained by one
//!   task, so emissions from a single caller reach the socket in call order.
//! - **Non-blocking emit**: `emit` only encodes and enqueues; it never waits
//!   on the network.
//! - **Delivery context**: handlers run on the reader task, independent of
//!   whichever thread called `emit`, `on`, or `off`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Context};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use shortcut_core::protocol::events::QUERY_COMPLETED_PREFIX;
use shortcut_core::BridgeFrame;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage, WebSocketStream};
use tracing::{debug, info, warn};

use super::{Bridge, BridgeError, EventHandler};
use crate::domain::RegistryConfig;

type HandlerTable = Arc<Mutex<HashMap<String, EventHandler>>>;

/// A [`Bridge`] over a WebSocket connection.
///
/// Must be created inside a Tokio runtime; the reader and writer tasks are
/// spawned on it.  Dropping the bridge stops the reader immediately and lets
/// the writer flush any queued frames before closing the socket.
pub struct WsBridge {
    handlers: HandlerTable,
    outbound: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl WsBridge {
    /// Connects to the host's bridge endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake does not complete within
    /// `connect_timeout`, or if the connection or upgrade fails (host not
    /// running, wrong URL, refused upgrade).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use shortcut_registry::infrastructure::bridge::WsBridge;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let bridge = WsBridge::connect("ws://127.0.0.1:8000/shortcut-bridge", Duration::from_secs(5)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str, connect_timeout: Duration) -> anyhow::Result<Self> {
        let (stream, _response) = tokio::time::timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| anyhow!("timed out after {connect_timeout:?} connecting to shortcut host at {url}"))?
            .with_context(|| format!("failed to connect to shortcut host at {url}"))?;

        info!("connected to shortcut host at {url}");
        Ok(Self::from_stream(stream))
    }

    /// Connects using the `[bridge]` section of `config`.
    ///
    /// # Errors
    ///
    /// See [`WsBridge::connect`].
    pub async fn connect_with_config(config: &RegistryConfig) -> anyhow::Result<Self> {
        Self::connect(&config.bridge.url, config.connect_timeout()).await
    }

    /// Wraps an already-established WebSocket stream.
    ///
    /// Useful when the caller performs its own handshake, or in tests that
    /// pair a client and server stream directly.
    pub fn from_stream<S>(stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let handlers: HandlerTable = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (sink, source) = stream.split();

        tokio::spawn(write_frames(sink, outbound_rx, Arc::clone(&connected)));
        let reader = tokio::spawn(read_frames(
            source,
            Arc::clone(&handlers),
            Arc::clone(&connected),
        ));

        Self {
            handlers,
            outbound,
            connected,
            reader,
        }
    }

    /// Returns `false` once either direction of the socket has failed or closed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Bridge for WsBridge {
    fn emit(&self, event: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        if !self.is_connected() {
            return Err(BridgeError::Disconnected);
        }
        let text = BridgeFrame::new(event, args)
            .to_json()
            .map_err(|e| BridgeError::Encode(e.to_string()))?;
        self.outbound
            .send(text)
            .map_err(|_| BridgeError::Disconnected)
    }

    fn on(&self, event: &str, handler: EventHandler) {
        lock(&self.handlers).insert(event.to_string(), handler);
    }

    fn off(&self, event: &str) {
        lock(&self.handlers).remove(event);
    }
}

impl Drop for WsBridge {
    fn drop(&mut self) {
        // The writer exits on its own once `outbound` is dropped and the
        // queue is drained.
        self.reader.abort();
    }
}

// ── Socket tasks ──────────────────────────────────────────────────────────────

async fn write_frames<S>(
    mut sink: futures_util::stream::SplitSink<WebSocketStream<S>, WsMessage>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    connected: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(text) = outbound_rx.recv().await {
        if let Err(e) = sink.send(WsMessage::Text(text)).await {
            warn!("write to shortcut host failed: {e}");
            connected.store(false, Ordering::Release);
            return;
        }
    }

    debug!("bridge dropped; closing shortcut host connection");
    if let Err(e) = sink.close().await {
        debug!("close handshake with shortcut host failed: {e}");
    }
}

async fn read_frames<S>(
    mut source: futures_util::stream::SplitStream<WebSocketStream<S>>,
    handlers: HandlerTable,
    connected: Arc<AtomicBool>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(message) = source.next().await {
        match message {
            Ok(WsMessage::Text(text)) => dispatch_text(&handlers, &text),
            Ok(WsMessage::Close(_)) => {
                debug!("shortcut host sent close frame");
                break;
            }
            // Ping/pong are answered by tungstenite; binary frames are not
            // part of the protocol.
            Ok(_) => {}
            Err(e) => {
                warn!("read from shortcut host failed: {e}");
                break;
            }
        }
    }

    connected.store(false, Ordering::Release);
    let abandoned = drop_query_handlers(&handlers);
    info!("shortcut host connection closed; abandoned {abandoned} pending query channel(s)");
}

/// Removes every query-completed subscription, since no answer can arrive on
/// a closed socket.  Dropping a handler closes its query's oneshot.  The
/// `fired` subscription stays for the registry's lifetime.
fn drop_query_handlers(handlers: &HandlerTable) -> usize {
    let removed: Vec<EventHandler> = {
        let mut table = lock(handlers);
        let channels: Vec<String> = table
            .keys()
            .filter(|event| event.starts_with(QUERY_COMPLETED_PREFIX))
            .cloned()
            .collect();
        channels
            .iter()
            .filter_map(|channel| table.remove(channel))
            .collect()
    };
    // Handlers are dropped here, after the table lock is released.
    removed.len()
}

/// Parses one text message and runs the matching handler.
fn dispatch_text(handlers: &HandlerTable, text: &str) {
    let frame = match BridgeFrame::from_json(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("ignoring malformed frame from shortcut host: {e}");
            return;
        }
    };

    // Clone the handler out so the table lock is released before it runs.
    let handler = lock(handlers).get(&frame.event).cloned();
    match handler {
        Some(handler) => handler(frame.first_arg()),
        None => debug!("no handler for '{}'; dropped", frame.event),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Binds a loopback listener and returns it with its `ws://` URL.
    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("ws://{}", listener.local_addr().expect("local addr"));
        (listener, url)
    }

    #[tokio::test]
    async fn test_emit_reaches_host_as_json_frame() {
        // Arrange
        let (listener, url) = listen().await;
        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            match ws.next().await {
                Some(Ok(WsMessage::Text(text))) => BridgeFrame::from_json(&text).expect("frame"),
                other => panic!("unexpected message: {other:?}"),
            }
        });
        let bridge = WsBridge::connect(&url, Duration::from_secs(5)).await.expect("connect");

        // Act
        bridge.emit("register", vec![json!("CmdOrCtrl+X")]).expect("emit");

        // Assert
        let frame = host.await.expect("host task");
        assert_eq!(frame, BridgeFrame::new("register", vec![json!("CmdOrCtrl+X")]));
    }

    #[tokio::test]
    async fn test_inbound_frame_runs_subscribed_handler() {
        // Arrange
        let (listener, url) = listen().await;
        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            // Wait for the controller's go-ahead so the handler is installed.
            let _ = ws.next().await;
            let frame = BridgeFrame::new("fired", vec![json!("Alt+Space")]);
            ws.send(WsMessage::Text(frame.to_json().unwrap())).await.expect("send");
            ws
        });
        let bridge = WsBridge::connect(&url, Duration::from_secs(5)).await.expect("connect");
        let (tx, mut rx) = mpsc::unbounded_channel();
        bridge.on("fired", Arc::new(move |payload| {
            let _ = tx.send(payload);
        }));

        // Act
        bridge.emit("ready", Vec::new()).expect("emit");

        // Assert
        let payload = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("handler ran in time")
            .expect("payload");
        assert_eq!(payload, json!("Alt+Space"));
        drop(host.await);
    }

    #[tokio::test]
    async fn test_emit_fails_after_host_closes() {
        // Arrange
        let (listener, url) = listen().await;
        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            ws.close(None).await.expect("close");
        });
        let bridge = WsBridge::connect(&url, Duration::from_secs(5)).await.expect("connect");
        host.await.expect("host task");

        // Act: wait for the reader task to observe the close.
        for _ in 0..100 {
            if !bridge.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Assert
        assert!(!bridge.is_connected());
        assert!(matches!(
            bridge.emit("register", vec![json!("A")]),
            Err(BridgeError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_connect_with_config_uses_bridge_section() {
        // Arrange
        let (listener, url) = listen().await;
        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            accept_async(tcp).await.expect("handshake")
        });
        let mut config = RegistryConfig::default();
        config.bridge.url = url;

        // Act
        let bridge = WsBridge::connect_with_config(&config).await.expect("connect");

        // Assert
        assert!(bridge.is_connected());
        drop(host.await);
    }

    #[tokio::test]
    async fn test_host_close_drops_query_channels_but_keeps_fired() {
        // Arrange
        let (listener, url) = listen().await;
        let host = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.expect("accept");
            let mut ws = accept_async(tcp).await.expect("handshake");
            // Close only after the controller has subscribed.
            let _ = ws.next().await;
            ws.close(None).await.expect("close");
        });
        let bridge = WsBridge::connect(&url, Duration::from_secs(5)).await.expect("connect");
        let channel = format!("{QUERY_COMPLETED_PREFIX}session-7");
        bridge.on("fired", Arc::new(|_| {}));
        bridge.on(&channel, Arc::new(|_| {}));

        // Act
        bridge.emit("ready", Vec::new()).expect("emit");
        host.await.expect("host task");
        for _ in 0..100 {
            if !lock(&bridge.handlers).contains_key(&channel) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Assert
        let table = lock(&bridge.handlers);
        assert!(!table.contains_key(&channel));
        assert!(table.contains_key("fired"));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        // Bind then drop to obtain a port with nothing listening.
        let (listener, url) = listen().await;
        drop(listener);

        let result = WsBridge::connect(&url, Duration::from_secs(2)).await;
        assert!(result.is_err());
    }
}
