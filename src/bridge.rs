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

//! The public client façade.
//!
//! A [`Bridge`] owns the object store, the event registry and the
//! connection, and is the entry point for publishing services, obtaining
//! references and joining channels. Handles are cheap to clone and all
//! clones share one interior; the runtime is single-threaded and handles
//! are neither `Send` nor `Sync` by design.

use crate::config::Config;
use crate::connection::{self, discovery, Connection, SessionState};
use crate::error::{BridgeError, ConfigError};
use crate::events::EventRegistry;
use crate::marshal;
use crate::reference::{AddressChain, Reference};
use crate::service::Service;
use crate::store::{ObjectStore, SYSTEM_SERVICE};
use crate::value::Value;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::error;

/// Handle to the client runtime.
///
/// # Lifecycle
///
/// Construct with [`Bridge::new`], register services and event handlers,
/// then drive the runtime with [`Bridge::connect`]. `connect` resolves the
/// gateway endpoint (through the redirector unless `host`/`port` are
/// configured), then runs the connection loop. It does not return while
/// the session lives, so embedding code reacts through event handlers and
/// service members rather than awaiting replies.
///
/// # Examples
///
/// ```rust,no_run
/// use tether::{Bridge, Config, Value};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), tether::BridgeError> {
///     let bridge = Bridge::new(Config {
///         api_key: Some("abcdefgh".into()),
///         ..Config::default()
///     });
///
///     bridge.on("ready", |bridge, _| {
///         let chat = bridge.get_service("chatty");
///         chat.invoke(bridge, "join", vec![
///             Value::from("Vedant"),
///             Value::callback(|_, args| println!("{args:?}")),
///         ]);
///     });
///
///     bridge.connect().await
/// }
/// ```
#[derive(Clone)]
pub struct Bridge {
    pub(crate) inner: Rc<RefCell<Inner>>,
}

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) store: ObjectStore,
    pub(crate) events: EventRegistry,
    pub(crate) conn: Connection,
}

impl Bridge {
    /// Creates a client with the given configuration.
    ///
    /// The store starts out holding only the built-in `system` service.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let conn = Connection::new(config.reconnect_interval);
        Self {
            inner: Rc::new(RefCell::new(Inner {
                store: ObjectStore::new(),
                events: EventRegistry::new(),
                conn,
                config,
            })),
        }
    }

    /// Resolves the gateway endpoint and drives the connection loop.
    ///
    /// Does not return while the session lives. With reconnection enabled
    /// (the default) it returns only on a startup precondition failure;
    /// with reconnection disabled it additionally returns once the session
    /// ends.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] when discovery is required but no
    /// `api_key` is configured, or when the one-shot redirector lookup
    /// fails. Runtime faults after startup never surface here; they become
    /// log lines and lifecycle events.
    pub async fn connect(&self) -> Result<(), BridgeError> {
        let (log, needs_discovery, redirector, api_key) = {
            let inner = self.inner.borrow();
            (
                inner.config.log.clone(),
                !inner.config.has_endpoint(),
                inner.config.redirector.clone(),
                inner.config.api_key.clone(),
            )
        };

        if let Some(directive) = log {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(&directive))
                .try_init();
        }

        if needs_discovery {
            let api_key = api_key.ok_or(ConfigError::MissingApiKey)?;
            self.inner.borrow_mut().conn.state = SessionState::Discovering;
            match discovery::lookup(&redirector, &api_key).await {
                Ok((host, port)) => {
                    let mut inner = self.inner.borrow_mut();
                    inner.config.host = Some(host);
                    inner.config.port = Some(port);
                }
                Err(err) => {
                    error!(error = %err, "discovery failed");
                    self.inner.borrow_mut().conn.state = SessionState::Closed;
                    return Err(err.into());
                }
            }
        }

        connection::run(self).await;
        Ok(())
    }

    /// Registers a callback for a lifecycle event.
    ///
    /// Event names and arity: `ready/0`, `disconnect/0`, `reconnect/0`,
    /// `remote_error/1` (message text). Callbacks fire in registration
    /// order and receive the bridge handle plus the event arguments.
    pub fn on(&self, event: &str, handler: impl Fn(&Bridge, &[Value]) + 'static) {
        self.inner.borrow_mut().events.on(event, Rc::new(handler));
    }

    /// Triggers an event, invoking its callbacks in registration order.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let handlers = self.inner.borrow().events.handlers(event);
        for handler in handlers {
            handler(self, args);
        }
    }

    /// Removes every callback registered for an event.
    pub fn clear_event(&self, event: &str) {
        self.inner.borrow_mut().events.clear(event);
    }

    /// Runs `handler` once the client is ready, immediately if it already
    /// is.
    pub fn ready(&self, handler: impl Fn(&Bridge, &[Value]) + 'static) {
        if self.is_ready() {
            handler(self, &[]);
        } else {
            self.on("ready", handler);
        }
    }

    /// True while the session identity is assigned and traffic flows.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.borrow().conn.is_ready()
    }

    /// The session identifier assigned during handshake, if known.
    #[must_use]
    pub fn client_id(&self) -> Option<String> {
        self.inner.borrow().conn.client_id().map(str::to_string)
    }

    /// Current lifecycle state of the connection.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.inner.borrow().conn.state
    }

    /// Publishes a service under a well-known name.
    ///
    /// The service becomes addressable as `named.<name>` once the gateway
    /// acknowledges the worker-pool join; the optional callback is invoked
    /// by the gateway at that point.
    ///
    /// # Errors
    ///
    /// Rejects the reserved name `system`.
    pub fn publish_service(
        &self,
        name: &str,
        service: Rc<dyn Service>,
        callback: Option<Value>,
    ) -> Result<(), BridgeError> {
        if name == SYSTEM_SERVICE {
            let err = ConfigError::ReservedServiceName { name: name.into() };
            error!(error = %err, "refusing to publish service");
            return Err(err.into());
        }

        let mut inner = self.inner.borrow_mut();
        let Inner { store, conn, .. } = &mut *inner;
        store.insert(name, service);

        let mut data = json!({ "name": name });
        if let Some(callback) = callback {
            data["callback"] = marshal::serialize(store, conn.client_id(), &callback);
        }
        conn.send(json!({ "command": "JOINWORKERPOOL", "data": data }));
        Ok(())
    }

    /// Removes a published or generated registration from the store.
    ///
    /// This is a local eviction; the wire protocol has no unpublish
    /// command. Commands subsequently addressed to the name are dropped
    /// with a handler-not-found warning.
    ///
    /// # Errors
    ///
    /// Rejects the reserved name `system`.
    pub fn unpublish_service(&self, name: &str) -> Result<(), BridgeError> {
        if name == SYSTEM_SERVICE {
            let err = ConfigError::ReservedServiceName { name: name.into() };
            error!(error = %err, "refusing to unpublish service");
            return Err(err.into());
        }
        self.inner.borrow_mut().store.remove(name);
        Ok(())
    }

    /// Returns a reference to a service published somewhere on the
    /// network.
    ///
    /// No round trip is performed; the reference is a deterministic
    /// function of the name.
    #[must_use]
    pub fn get_service(&self, name: &str) -> Reference {
        Reference::new(AddressChain::named(name))
    }

    /// Requests a channel from the gateway and returns a reference to it.
    ///
    /// Messages sent through the reference fan out to every handler joined
    /// to the channel.
    #[must_use]
    pub fn get_channel(&self, name: &str) -> Reference {
        self.inner
            .borrow_mut()
            .conn
            .send(json!({ "command": "GETCHANNEL", "data": { "name": name } }));
        Reference::new(AddressChain::channel(name))
    }

    /// Attaches a handler to a channel.
    ///
    /// `handler` is any value the marshaler can turn into a reference: a
    /// live service, a callable or an existing reference. The optional
    /// callback is invoked by the gateway once the handler is attached.
    pub fn join_channel(&self, name: &str, handler: &Value, callback: Option<Value>) {
        self.channel_command("JOINCHANNEL", name, handler, callback);
    }

    /// Detaches a handler from a channel.
    pub fn leave_channel(&self, name: &str, handler: &Value, callback: Option<Value>) {
        self.channel_command("LEAVECHANNEL", name, handler, callback);
    }

    /// Sends a fire-and-forget command to a destination reference.
    ///
    /// Arguments are marshaled positionally; embedded services and
    /// callables are registered and replaced by references. While the
    /// session is not ready the encoded message is queued and flushed
    /// after the identity handshake.
    pub fn send(&self, args: Vec<Value>, destination: &Reference) {
        let mut inner = self.inner.borrow_mut();
        let Inner { store, conn, .. } = &mut *inner;
        let wire_args = marshal::serialize_args(store, conn.client_id(), &args);
        conn.send(json!({
            "command": "SEND",
            "data": { "args": wire_args, "destination": destination.to_wire() },
        }));
    }

    fn channel_command(&self, command: &str, name: &str, handler: &Value, callback: Option<Value>) {
        let mut inner = self.inner.borrow_mut();
        let Inner { store, conn, .. } = &mut *inner;
        let session = conn.client_id();
        let mut data = json!({
            "name": name,
            "handler": marshal::serialize(store, session, handler),
        });
        if let Some(callback) = callback {
            data["callback"] = marshal::serialize(store, session, &callback);
        }
        conn.send(json!({ "command": command, "data": data }));
    }

    /// Looks up a stored object by name.
    pub(crate) fn lookup(&self, name: &str) -> Option<Rc<dyn Service>> {
        self.inner.borrow().store.get(name)
    }

    /// Registers an object, shadowing any previous registration.
    pub(crate) fn store_insert(&self, name: String, service: Rc<dyn Service>) {
        self.inner.borrow_mut().store.insert(name, service);
    }
}
