//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The TCP session: handshake, framed traffic, buffering and reconnect.
//!
//! A connection moves through the states
//! `Discovering → Connecting → Handshaking → Ready → Closed`, with
//! `Reconnecting` reachable from any established state on close. The whole
//! lifecycle runs on one cooperative task owned by
//! [`Bridge::connect`](crate::Bridge::connect); a second task drains the
//! outbound write queue so slow writes never stall the read side.
//!
//! # Handshake
//!
//! On connect the client transmits
//! `CONNECT {session: [client_id|null, secret|null], api_key}` and starts
//! reading frames. The first inbound payload that splits on `|` into
//! exactly two parts is the assigned `client_id|secret` pair: a bare
//! string, not a JSON envelope. This irregularity is load-bearing wire
//! compatibility and is preserved exactly, including the raw split. Any
//! other first payload is processed as a normal protocol message while the
//! identity frame is still awaited.
//!
//! Once the identity is known the connection flips to `Ready`, rewrites
//! queued placeholder self-references with the assigned client id, flushes
//! the queue in FIFO order, and raises `ready` (first session) or
//! `reconnect` (any later session).

pub mod backoff;
pub mod discovery;
pub mod framing;

mod error;
mod pending;

pub use error::{ProtocolError, TransportError};

use crate::bridge::Bridge;
use crate::marshal;
use crate::reference::Reference;
use crate::store::dispatch;
use backoff::Backoff;
use pending::PendingQueue;
use serde_json::{json, Value as Json};
use std::fmt;
use std::time::Duration;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Lifecycle state of the TCP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Resolving the gateway endpoint through the redirector.
    Discovering,
    /// Opening the TCP stream.
    Connecting,
    /// Stream open, awaiting the session identity frame.
    Handshaking,
    /// Identity assigned; traffic flows.
    Ready,
    /// No live stream.
    Closed,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovering => "discovering",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Ready => "ready",
            Self::Closed => "closed",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}

/// Connection bookkeeping owned by the bridge interior.
pub(crate) struct Connection {
    pub(crate) state: SessionState,
    pub(crate) client_id: Option<String>,
    pub(crate) secret: Option<String>,
    ever_ready: bool,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    pending: PendingQueue,
    backoff: Backoff,
}

impl Connection {
    pub(crate) fn new(reconnect_interval: Duration) -> Self {
        Self {
            state: SessionState::Closed,
            client_id: None,
            secret: None,
            ever_ready: false,
            outbound: None,
            pending: PendingQueue::new(),
            backoff: Backoff::new(reconnect_interval),
        }
    }

    pub(crate) fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub(crate) fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Sends a message envelope, or queues it while the session is not
    /// ready.
    pub(crate) fn send(&mut self, message: Json) {
        if self.is_ready() {
            self.transmit(&message);
        } else {
            self.pending.push(message);
            debug!(queued = self.pending.len(), "connection not ready, message queued");
        }
    }

    /// Encodes and hands a message to the write task, regardless of state.
    fn transmit(&self, message: &Json) {
        let Some(outbound) = &self.outbound else {
            warn!("no live stream to transmit on, message dropped");
            return;
        };
        match serde_json::to_vec(message) {
            Ok(payload) => {
                let _ = outbound.send(payload);
            }
            Err(err) => warn!(error = %err, "failed to encode outbound message"),
        }
    }

    /// Rewrites placeholder self-references and flushes the pending queue
    /// in FIFO order. Requires the session identity to be known.
    fn flush_pending(&mut self) {
        let Some(client_id) = self.client_id.clone() else {
            return;
        };
        let queued = self.pending.drain();
        if queued.is_empty() {
            return;
        }
        info!(count = queued.len(), "flushing queued messages");
        for mut message in queued {
            pending::rewrite_client_id(&mut message, &client_id);
            self.transmit(&message);
        }
    }
}

/// Drives the connection until it closes for good.
///
/// Loops over connect attempts, running one [`session`] per established
/// stream and sleeping out the backoff delay between attempts while
/// reconnection is enabled.
pub(crate) async fn run(bridge: &Bridge) {
    loop {
        let endpoint = {
            let mut inner = bridge.inner.borrow_mut();
            inner.conn.state = SessionState::Connecting;
            (inner.config.host.clone(), inner.config.port)
        };
        let (Some(host), Some(port)) = endpoint else {
            error!("no gateway endpoint configured");
            return;
        };

        info!(%host, port, "starting TCP connection");
        match TcpStream::connect((host.as_str(), port)).await {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                session(bridge, stream).await;
            }
            Err(source) => {
                let err = TransportError::ConnectionFailed {
                    address: format!("{host}:{port}"),
                    source,
                };
                error!(error = %err, "connect attempt failed");
                bridge.inner.borrow_mut().conn.state = SessionState::Closed;
            }
        }

        if !bridge.inner.borrow().config.reconnect {
            break;
        }
        let delay = {
            let mut inner = bridge.inner.borrow_mut();
            inner.conn.state = SessionState::Reconnecting;
            inner.conn.backoff.next_delay()
        };
        info!(delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        tokio::time::sleep(delay).await;
    }
}

/// Runs one established stream until it fails or closes.
async fn session(bridge: &Bridge, stream: TcpStream) {
    let (mut reader, writer) = stream.into_split();
    let (outbound, outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    let connect = {
        let mut inner = bridge.inner.borrow_mut();
        inner.conn.outbound = Some(outbound);
        inner.conn.state = SessionState::Handshaking;
        json!({
            "command": "CONNECT",
            "data": {
                "session": [inner.conn.client_id.clone(), inner.conn.secret.clone()],
                "api_key": inner.config.api_key.clone(),
            },
        })
    };

    info!("beginning handshake");
    bridge.inner.borrow().conn.transmit(&connect);
    tokio::spawn(write_loop(writer, outbound_rx));

    loop {
        match framing::read_frame(&mut reader).await {
            Ok(payload) => handle_frame(bridge, payload),
            Err(TransportError::Closed) => {
                info!("gateway closed the stream");
                break;
            }
            Err(err) => {
                error!(error = %err, "transport failure");
                break;
            }
        }
    }

    on_close(bridge);
}

/// Drains the outbound queue onto the write half.
///
/// Ends when the queue sender is dropped at session teardown or when a
/// write fails; the read side observes the broken stream independently.
async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(payload) = outbound.recv().await {
        if let Err(err) = framing::write_frame(&mut writer, &payload).await {
            warn!(error = %err, "write failed");
            break;
        }
    }
}

/// Handles one inbound frame.
///
/// Processes the message fully before the caller reads the next frame, so
/// handler invocations are serialized in arrival order.
fn handle_frame(bridge: &Bridge, payload: Vec<u8>) {
    let text = match String::from_utf8(payload) {
        Ok(text) => text,
        Err(source) => {
            warn!(error = %ProtocolError::InvalidUtf8 { source }, "dropping frame");
            return;
        }
    };

    let handshaking = bridge.inner.borrow().conn.state == SessionState::Handshaking;
    if handshaking {
        // The identity frame is a bare `client_id|secret` string. The raw
        // two-part split is the wire contract, quirks and all.
        let parts: Vec<&str> = text.split('|').collect();
        if parts.len() == 2 {
            let first_session = {
                let mut inner = bridge.inner.borrow_mut();
                let conn = &mut inner.conn;
                conn.client_id = Some(parts[0].to_string());
                conn.secret = Some(parts[1].to_string());
                conn.state = SessionState::Ready;
                conn.backoff.reset();
                let first = !conn.ever_ready;
                conn.ever_ready = true;
                conn.flush_pending();
                first
            };
            info!("client id and secret received");
            if first_session {
                bridge.emit("ready", &[]);
            } else {
                bridge.emit("reconnect", &[]);
            }
            return;
        }
        debug!("frame arrived before session identity, processing as protocol message");
    }

    process_message(bridge, &text);
}

/// Decodes, deserializes and dispatches one protocol message.
fn process_message(bridge: &Bridge, text: &str) {
    let envelope: Json = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(source) => {
            warn!(error = %ProtocolError::InvalidJson { source }, "message parsing failed");
            return;
        }
    };
    debug!(message = %text, "received");

    let Some(destination) = envelope.get("destination") else {
        warn!("no destination in message");
        return;
    };
    let destination = match destination
        .as_object()
        .ok_or_else(|| ProtocolError::malformed("destination is not an object"))
        .and_then(Reference::from_wire)
    {
        Ok(reference) => reference,
        Err(err) => {
            warn!(error = %err, "dropping message with malformed destination");
            return;
        }
    };

    let args_wire = envelope
        .get("args")
        .cloned()
        .unwrap_or_else(|| Json::Array(Vec::new()));
    let args = {
        let mut inner = bridge.inner.borrow_mut();
        match marshal::deserialize_args(&mut inner.store, &args_wire) {
            Ok(args) => args,
            Err(err) => {
                warn!(error = %err, "dropping message with malformed arguments");
                return;
            }
        }
    };

    // The interior borrow is released above; dispatch runs user code.
    dispatch(bridge, destination.chain(), args);
}

/// Tears down session state and raises `disconnect`.
fn on_close(bridge: &Bridge) {
    {
        let mut inner = bridge.inner.borrow_mut();
        inner.conn.outbound = None;
        inner.conn.state = SessionState::Closed;
    }
    error!("connection closed");
    bridge.emit("disconnect", &[]);
}
