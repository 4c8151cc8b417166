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

//! End-to-end session tests against an in-process fake gateway.
//!
//! Each test binds a real TCP listener, drives the client through its
//! handshake and asserts on the frames crossing the wire.

use serde_json::{json, Value as Json};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tether::connection::framing::{read_frame, write_frame};
use tether::{AddressChain, Bridge, Config, DispatchError, Reference, Service, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::LocalSet;
use tokio::time::{sleep, timeout};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn read_json(stream: &mut TcpStream) -> Json {
    let payload = read_frame(stream).await.unwrap();
    serde_json::from_slice(&payload).unwrap()
}

async fn write_json(stream: &mut TcpStream, value: &Json) {
    write_frame(stream, &serde_json::to_vec(value).unwrap())
        .await
        .unwrap();
}

async fn write_raw(stream: &mut TcpStream, payload: &[u8]) {
    write_frame(stream, payload).await.unwrap();
}

/// Builds a client pointed at the listener, with reconnection configured
/// by the caller.
fn test_bridge(listener: &TcpListener, reconnect: bool) -> Bridge {
    let addr = listener.local_addr().unwrap();
    Bridge::new(Config {
        api_key: Some("abcdefgh".into()),
        host: Some("127.0.0.1".into()),
        port: Some(addr.port()),
        reconnect,
        reconnect_interval: Duration::from_millis(25),
        ..Config::default()
    })
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn queued_messages_flush_in_order_after_handshake() {
    let local = LocalSet::new();
    let test = local.run_until(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bridge = test_bridge(&listener, false);

        let ready_count = Rc::new(Cell::new(0u32));
        {
            let ready_count = ready_count.clone();
            bridge.on("ready", move |_, _| ready_count.set(ready_count.get() + 1));
        }

        // Everything below is composed before the connection exists and
        // must be buffered, then flushed in this order.
        let _lobby = bridge.get_channel("lobby");
        bridge.join_channel("lobby", &Value::callback(|_, _| {}), None);
        bridge
            .publish_service("echo", Rc::new(NullService), None)
            .unwrap();

        {
            let bridge = bridge.clone();
            tokio::task::spawn_local(async move {
                let _ = bridge.connect().await;
            });
        }

        let (mut stream, _) = listener.accept().await.unwrap();

        let connect = read_json(&mut stream).await;
        assert_eq!(connect["command"], json!("CONNECT"));
        assert_eq!(connect["data"]["session"], json!([null, null]));
        assert_eq!(connect["data"]["api_key"], json!("abcdefgh"));

        // Nothing else is on the wire before the identity is assigned.
        write_raw(&mut stream, b"session-1|topsecret").await;

        let first = read_json(&mut stream).await;
        assert_eq!(first["command"], json!("GETCHANNEL"));
        assert_eq!(first["data"]["name"], json!("lobby"));

        let second = read_json(&mut stream).await;
        assert_eq!(second["command"], json!("JOINCHANNEL"));
        let handler_chain = second["data"]["handler"]["ref"].as_array().unwrap();
        // The placeholder self-reference was rewritten with the assigned id.
        assert_eq!(handler_chain[0], json!("client"));
        assert_eq!(handler_chain[1], json!("session-1"));
        assert_eq!(handler_chain[3], json!("callback"));

        let third = read_json(&mut stream).await;
        assert_eq!(third["command"], json!("JOINWORKERPOOL"));
        assert_eq!(third["data"]["name"], json!("echo"));

        wait_until(|| ready_count.get() == 1).await;
        assert!(bridge.is_ready());
        assert_eq!(bridge.client_id().as_deref(), Some("session-1"));
    });
    timeout(TEST_TIMEOUT, test).await.unwrap();
}

struct NullService;

impl Service for NullService {
    fn call(&self, _: &Bridge, _: &str, _: Vec<Value>) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// The chat service from the protocol's canonical scenario: `join`
/// forwards the caller's handler into the lobby channel.
struct ChatServer {
    joined: Rc<RefCell<Vec<String>>>,
}

impl Service for ChatServer {
    fn call(&self, bridge: &Bridge, member: &str, mut args: Vec<Value>) -> Result<(), DispatchError> {
        match member {
            "join" => {
                let callback = args.pop();
                let handler = args.pop().ok_or(DispatchError::NotCallable)?;
                let name = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or(DispatchError::InvalidArgument { expected: "name" })?;
                self.joined.borrow_mut().push(name.to_string());
                bridge.join_channel("lobby", &handler, callback);
                Ok(())
            }
            other => Err(DispatchError::UnknownMember {
                object: "chatty".into(),
                member: other.into(),
            }),
        }
    }

    fn members(&self) -> Vec<String> {
        vec!["join".into()]
    }
}

#[tokio::test]
async fn inbound_join_produces_joinchannel_with_original_chains() {
    let local = LocalSet::new();
    let test = local.run_until(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bridge = test_bridge(&listener, false);

        let joined = Rc::new(RefCell::new(Vec::new()));
        bridge
            .publish_service(
                "chatty",
                Rc::new(ChatServer {
                    joined: joined.clone(),
                }),
                None,
            )
            .unwrap();

        {
            let bridge = bridge.clone();
            tokio::task::spawn_local(async move {
                let _ = bridge.connect().await;
            });
        }

        let (mut stream, _) = listener.accept().await.unwrap();
        let connect = read_json(&mut stream).await;
        assert_eq!(connect["command"], json!("CONNECT"));
        write_raw(&mut stream, b"srv-7|sec").await;

        let publish = read_json(&mut stream).await;
        assert_eq!(publish["command"], json!("JOINWORKERPOOL"));

        // A peer invokes chatty.join with its own handler and callback refs.
        write_json(
            &mut stream,
            &json!({
                "destination": {"ref": ["named", "chatty", "chatty", "join"]},
                "args": [
                    "Vedant",
                    {"ref": ["client", "peer-1", "handlerA"], "operations": ["msg"]},
                    {"ref": ["client", "peer-1", "cbB", "callback"], "operations": ["callback"]},
                ],
            }),
        )
        .await;

        let join = read_json(&mut stream).await;
        assert_eq!(join["command"], json!("JOINCHANNEL"));
        assert_eq!(join["data"]["name"], json!("lobby"));
        // The peer's proxies re-serialize under their original chains, not
        // freshly generated local names.
        assert_eq!(
            join["data"]["handler"]["ref"],
            json!(["client", "peer-1", "handlerA"])
        );
        assert_eq!(
            join["data"]["callback"]["ref"],
            json!(["client", "peer-1", "cbB", "callback"])
        );

        assert_eq!(*joined.borrow(), ["Vedant"]);
    });
    timeout(TEST_TIMEOUT, test).await.unwrap();
}

#[tokio::test]
async fn frame_before_identity_is_processed_without_crashing() {
    let local = LocalSet::new();
    let test = local.run_until(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bridge = test_bridge(&listener, false);

        let errors = Rc::new(RefCell::new(Vec::new()));
        let ready = Rc::new(Cell::new(false));
        {
            let errors = errors.clone();
            bridge.on("remote_error", move |_, args| {
                errors.borrow_mut().push(args[0].as_str().unwrap().to_string());
            });
        }
        {
            let ready = ready.clone();
            bridge.on("ready", move |_, _| ready.set(true));
        }

        {
            let bridge = bridge.clone();
            tokio::task::spawn_local(async move {
                let _ = bridge.connect().await;
            });
        }

        let (mut stream, _) = listener.accept().await.unwrap();
        let _connect = read_json(&mut stream).await;

        // A protocol message arrives before the identity frame. The client
        // must process it and keep awaiting the identity.
        write_json(
            &mut stream,
            &json!({
                "destination": {"ref": ["client", "srv-1", "system", "remoteError"]},
                "args": ["early boom"],
            }),
        )
        .await;

        wait_until(|| !errors.borrow().is_empty()).await;
        assert!(!ready.get());
        assert!(!bridge.is_ready());

        write_raw(&mut stream, b"srv-1|sec").await;
        wait_until(|| ready.get()).await;
        assert!(bridge.is_ready());
        assert_eq!(*errors.borrow(), ["early boom"]);
    });
    timeout(TEST_TIMEOUT, test).await.unwrap();
}

#[tokio::test]
async fn disconnect_reconnect_replays_queued_messages() {
    let local = LocalSet::new();
    let test = local.run_until(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bridge = test_bridge(&listener, true);

        let disconnects = Rc::new(Cell::new(0u32));
        let reconnects = Rc::new(Cell::new(0u32));
        let readies = Rc::new(Cell::new(0u32));
        {
            let disconnects = disconnects.clone();
            bridge.on("disconnect", move |_, _| disconnects.set(disconnects.get() + 1));
        }
        {
            let reconnects = reconnects.clone();
            bridge.on("reconnect", move |_, _| reconnects.set(reconnects.get() + 1));
        }
        {
            let readies = readies.clone();
            bridge.on("ready", move |_, _| readies.set(readies.get() + 1));
        }

        {
            let bridge = bridge.clone();
            tokio::task::spawn_local(async move {
                let _ = bridge.connect().await;
            });
        }

        let (mut stream, _) = listener.accept().await.unwrap();
        let connect = read_json(&mut stream).await;
        assert_eq!(connect["data"]["session"], json!([null, null]));
        write_raw(&mut stream, b"id-1|sec-1").await;
        wait_until(|| bridge.is_ready()).await;

        // Kill the session mid-flight.
        drop(stream);
        wait_until(|| disconnects.get() == 1).await;
        assert!(!bridge.is_ready());

        // Composed while disconnected: buffered for replay.
        let echo = bridge.get_service("echo");
        bridge.send(vec![Value::from("hello")], &echo.method("poke"));

        // The client resumes its session on the next attempt.
        let (mut stream, _) = listener.accept().await.unwrap();
        let connect = read_json(&mut stream).await;
        assert_eq!(connect["data"]["session"], json!(["id-1", "sec-1"]));
        write_raw(&mut stream, b"id-1|sec-1").await;

        let replayed = read_json(&mut stream).await;
        assert_eq!(replayed["command"], json!("SEND"));
        assert_eq!(replayed["data"]["args"], json!(["hello"]));
        assert_eq!(
            replayed["data"]["destination"]["ref"],
            json!(["named", "echo", "echo", "poke"])
        );

        wait_until(|| reconnects.get() == 1).await;
        assert_eq!(disconnects.get(), 1);
        assert_eq!(readies.get(), 1);
        assert!(bridge.is_ready());
    });
    timeout(TEST_TIMEOUT, test).await.unwrap();
}

#[tokio::test]
async fn unroutable_command_leaves_connection_ready() {
    let local = LocalSet::new();
    let test = local.run_until(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bridge = test_bridge(&listener, false);

        let errors = Rc::new(Cell::new(0u32));
        {
            let errors = errors.clone();
            bridge.on("remote_error", move |_, _| errors.set(errors.get() + 1));
        }

        {
            let bridge = bridge.clone();
            tokio::task::spawn_local(async move {
                let _ = bridge.connect().await;
            });
        }

        let (mut stream, _) = listener.accept().await.unwrap();
        let _connect = read_json(&mut stream).await;
        write_raw(&mut stream, b"id-9|sec").await;
        wait_until(|| bridge.is_ready()).await;

        // Unknown object, then unknown member, then garbage JSON: all
        // dropped without tearing the session down.
        write_json(
            &mut stream,
            &json!({
                "destination": {"ref": ["named", "ghost", "ghost", "poke"]},
                "args": [],
            }),
        )
        .await;
        write_json(
            &mut stream,
            &json!({
                "destination": {"ref": ["client", "id-9", "system", "mystery"]},
                "args": [],
            }),
        )
        .await;
        write_raw(&mut stream, b"{not json").await;

        // A well-formed message still dispatches afterwards.
        write_json(
            &mut stream,
            &json!({
                "destination": {"ref": ["client", "id-9", "system", "remoteError"]},
                "args": ["still alive"],
            }),
        )
        .await;

        wait_until(|| errors.get() == 1).await;
        assert!(bridge.is_ready());
    });
    timeout(TEST_TIMEOUT, test).await.unwrap();
}

#[tokio::test]
async fn get_service_reference_addresses_named_scope() {
    // Pure reference construction needs no connection.
    let bridge = Bridge::new(Config::default());
    let reference: Reference = bridge.get_service("chatty");
    assert_eq!(
        reference.chain(),
        &AddressChain::named("chatty")
    );
}
