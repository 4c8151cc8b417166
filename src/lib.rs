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

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # Tether - Distributed-Object RPC Client
//!
//! Tether is a client-side runtime for the Bridge distributed-object RPC
//! protocol. A process exposes local objects as remotely callable
//! services, obtains references to services published by other processes,
//! and passes arbitrary argument trees (including callables and object
//! references) across a length-prefixed TCP transport as if everything
//! lived in one address space.
//!
//! - **Location-transparent references**: services and callables embedded
//!   in arguments are rewritten into references on the way out and
//!   resolved into callable proxies on the way in
//! - **Resilient transport**: messages composed before the session is
//!   ready are buffered and replayed in order after the identity
//!   handshake; lost connections reconnect with capped exponential backoff
//! - **Fire-and-forget commands**: callback references are the only
//!   completion signal; there are no per-call timeouts to tune
//! - **Contained failures**: malformed messages and unroutable commands
//!   are logged and dropped, never crashing the dispatch loop
//!
//! ## Architecture
//!
//! The crate is organized into layers, leaves first:
//!
//! - [`reference`]: address chains, reference descriptors, remote proxies
//! - [`value`]: the dynamic argument tree crossing the marshaling boundary
//! - [`marshal`]: rewriting between live values and wire JSON
//! - [`store`]: the process-local object store and command dispatcher
//! - [`connection`]: framing, discovery, backoff, buffering, the session
//!   state machine
//! - [`bridge`]: the public façade composing all of the above
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether::{Bridge, Config, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), tether::BridgeError> {
//!     let bridge = Bridge::new(Config {
//!         api_key: Some("abcdefgh".into()),
//!         ..Config::default()
//!     });
//!
//!     bridge.on("ready", |bridge, _| {
//!         let chat = bridge.get_service("chatty");
//!         chat.invoke(bridge, "join", vec![
//!             Value::from("Vedant"),
//!             Value::callback(|_, args| println!("joined: {args:?}")),
//!         ]);
//!     });
//!
//!     // Runs the event loop; handlers above do the rest.
//!     bridge.connect().await
//! }
//! ```
//!
//! Publishing a service is the mirror image:
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use tether::{Bridge, Config, DispatchError, Service, Value};
//!
//! struct ChatServer;
//!
//! impl Service for ChatServer {
//!     fn call(&self, bridge: &Bridge, member: &str, mut args: Vec<Value>) -> Result<(), DispatchError> {
//!         match member {
//!             "join" => {
//!                 let callback = args.pop();
//!                 let handler = args.pop().ok_or(DispatchError::NotCallable)?;
//!                 bridge.join_channel("lobby", &handler, callback);
//!                 Ok(())
//!             }
//!             other => Err(DispatchError::UnknownMember {
//!                 object: "chatty".into(),
//!                 member: other.into(),
//!             }),
//!         }
//!     }
//! }
//!
//! # async fn example() -> Result<(), tether::BridgeError> {
//! let bridge = Bridge::new(Config::default());
//! bridge.publish_service("chatty", Rc::new(ChatServer), None)?;
//! bridge.connect().await
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! The runtime is single-threaded and cooperative: one task owns the
//! socket, the store and the queues, and processes each inbound message
//! fully before reading the next frame. Run it on a current-thread tokio
//! runtime. [`Bridge`] handles are `Clone` but not `Send`; services use
//! `RefCell` for mutable state and never need locks.
//!
//! ## Error Handling
//!
//! Runtime faults are contained where they occur: transport failures feed
//! the reconnect loop and the `disconnect` event, malformed messages are
//! dropped with a warning, unroutable commands are dropped with a warning,
//! and errors signalled by the far end surface through the `remote_error`
//! event. Only startup preconditions (missing credential, failed
//! discovery) surface as [`BridgeError`] results.

pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod marshal;
pub mod reference;
pub mod service;
pub mod store;
pub mod value;

mod events;

pub use bridge::Bridge;
pub use config::Config;
pub use connection::SessionState;
pub use error::{BridgeError, ConfigError};
pub use reference::{AddressChain, Reference, RemoteProxy, Scope};
pub use service::{Callback, CallbackService, Service};
pub use store::{DispatchError, ObjectStore};
pub use value::Value;
