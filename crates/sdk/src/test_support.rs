//! In-process fake gateway for end-to-end SDK tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{accept_async, WebSocketStream};

use crate::{BotSdk, ConnectionState, SdkConfig};

pub(crate) const STEP: Duration = Duration::from_secs(2);

pub(crate) struct FakeGateway {
    addr: SocketAddr,
    incoming: mpsc::UnboundedReceiver<GatewayClient>,
    accepted: Arc<AtomicUsize>,
    acceptor: JoinHandle<()>,
}

impl FakeGateway {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, incoming) = mpsc::unbounded_channel();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        let acceptor = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                if tx.send(GatewayClient { ws }).is_err() {
                    break;
                }
            }
        });

        Self {
            addr,
            incoming,
            accepted,
            acceptor,
        }
    }

    /// Config pointed at this gateway with test-sized timeouts.
    pub(crate) fn config(&self, username: &str) -> SdkConfig {
        SdkConfig::new(username)
            .with_gateway_url(format!("ws://{}", self.addr))
            .with_connect_timeout(Duration::from_millis(500))
            .with_action_timeout(Duration::from_secs(1))
            .with_reconnect_backoff(Duration::from_millis(20), Duration::from_millis(100), None)
    }

    pub(crate) async fn next_client(&mut self) -> GatewayClient {
        tokio::time::timeout(STEP, self.incoming.recv())
            .await
            .expect("no client connected in time")
            .expect("acceptor stopped")
    }

    /// TCP connections seen so far, handshaken or not.
    pub(crate) fn connection_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Drop the listener; later dials are refused.
    pub(crate) async fn stop_accepting(&self) {
        self.acceptor.abort();
        tokio::task::yield_now().await;
    }
}

impl Drop for FakeGateway {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

/// Server side of one SDK connection.
pub(crate) struct GatewayClient {
    ws: WebSocketStream<TcpStream>,
}

impl GatewayClient {
    /// Next JSON frame from the SDK.
    pub(crate) async fn recv(&mut self) -> Value {
        let next = tokio::time::timeout(STEP, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(WsMessage::Text(text))) => {
                        return Some(serde_json::from_str::<Value>(&text).unwrap())
                    }
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return None,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await
        .expect("no frame from SDK in time");
        next.expect("SDK closed the connection")
    }

    pub(crate) async fn expect_type(&mut self, kind: &str) -> Value {
        let frame = self.recv().await;
        assert_eq!(frame["type"], kind, "unexpected frame: {frame}");
        frame
    }

    pub(crate) async fn send(&mut self, value: Value) {
        self.ws.send(WsMessage::Text(value.to_string())).await.unwrap();
    }

    pub(crate) async fn send_raw(&mut self, text: &str) {
        self.ws.send(WsMessage::Text(text.to_string())).await.unwrap();
    }

    /// Read `sdk_connect` and acknowledge it.
    pub(crate) async fn accept_handshake(&mut self) -> Value {
        let hello = self.expect_type("sdk_connect").await;
        self.send(json!({ "type": "sdk_connected", "success": true })).await;
        hello
    }

    pub(crate) async fn ack(&mut self, action_id: &Value, success: bool, message: &str) {
        self.send(json!({
            "type": "sdk_action_result",
            "actionId": action_id,
            "result": { "success": success, "message": message }
        }))
        .await;
    }

    pub(crate) async fn send_state(&mut self, state: Value) {
        self.send(json!({ "type": "sdk_state", "state": state })).await;
    }

    /// Resolve once the SDK has closed its side.
    pub(crate) async fn expect_closed(&mut self) {
        tokio::time::timeout(STEP, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await
        .expect("SDK did not close the connection");
    }

    pub(crate) async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

/// Connect a fresh SDK and complete its handshake.
pub(crate) async fn connected_sdk(
    gateway: &mut FakeGateway,
    config: SdkConfig,
) -> (BotSdk, GatewayClient) {
    let sdk = BotSdk::new(config).unwrap();
    let connect = tokio::spawn({
        let sdk = sdk.clone();
        async move { sdk.connect().await }
    });
    let mut client = gateway.next_client().await;
    client.accept_handshake().await;
    connect.await.unwrap().unwrap();
    (sdk, client)
}

pub(crate) async fn connect_bot(gateway: &mut FakeGateway) -> (BotSdk, GatewayClient) {
    let config = gateway.config("bot1");
    connected_sdk(gateway, config).await
}

/// Record every connection-state event for later assertions.
pub(crate) fn record_states(sdk: &BotSdk) -> Arc<Mutex<Vec<(ConnectionState, u32)>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let _subscription = sdk.on_connection_state_change(move |state, attempt| {
        sink.lock().unwrap().push((state, attempt));
    });
    events
}

pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(STEP, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
