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

//! The marshaling engine.
//!
//! [`serialize`] walks an argument tree depth-first and rewrites every live
//! node (an explicit reference, a service object, a callable) into a wire
//! reference descriptor, registering local objects in the store as a side
//! effect. [`deserialize`] performs the inverse walk, resolving descriptors
//! against the store and minting deduplicated [`RemoteProxy`] stand-ins for
//! chains that do not resolve locally.
//!
//! Both directions are deliberately stateful: serialization may create
//! registrations (so inbound invocations can find the object later) and
//! deserialization always registers new proxies (so replies addressed to
//! them can be dispatched). Serializing a service twice reuses its stamped
//! reference; serializing the same *callable* twice wraps it twice and
//! yields two distinct handler names.

use crate::connection::ProtocolError;
use crate::reference::{generate_name, AddressChain, Reference, RemoteProxy};
use crate::service::{CallbackService, Service};
use crate::store::ObjectStore;
use crate::value::Value;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Rewrites an argument tree into its wire form.
///
/// `session` is the client identifier assigned during handshake; while it
/// is unknown, references to local objects carry a `null` qualifier that
/// the pending-queue flush later rewrites.
pub fn serialize(store: &mut ObjectStore, session: Option<&str>, value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => Json::Number(n.clone()),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(|item| serialize(store, session, item))
                .collect(),
        ),
        Value::Map(map) => {
            let mut object = Map::new();
            for (key, item) in map {
                object.insert(key.clone(), serialize(store, session, item));
            }
            Json::Object(object)
        }
        Value::Ref(reference) => reference.to_wire(),
        Value::Service(service) => serialize_service(store, session, service).to_wire(),
        Value::Callback(callback) => {
            let handler: Rc<dyn Service> = Rc::new(CallbackService::new(callback.clone()));
            let name = generate_name();
            let chain =
                AddressChain::client(session.map(str::to_string), name.clone()).with_member("callback");
            let reference = Reference::new(chain).with_operations(handler.members());
            store.insert(name, handler.clone());
            store.stamp(&handler, reference.clone());
            reference.to_wire()
        }
    }
}

/// Serializes a sequence of positional arguments.
pub fn serialize_args(store: &mut ObjectStore, session: Option<&str>, args: &[Value]) -> Json {
    Json::Array(
        args.iter()
            .map(|arg| serialize(store, session, arg))
            .collect(),
    )
}

/// Registers a service under a generated name, or reuses its stamped
/// reference if it has been serialized before.
fn serialize_service(
    store: &mut ObjectStore,
    session: Option<&str>,
    service: &Rc<dyn Service>,
) -> Reference {
    if let Some(reference) = store.reference_for(service) {
        return reference.clone();
    }

    let name = generate_name();
    let chain = AddressChain::client(session.map(str::to_string), name.clone());
    let reference = Reference::new(chain).with_operations(service.members());
    store.insert(name, service.clone());
    store.stamp(service, reference.clone());
    reference
}

/// Resolves a wire tree into live values.
///
/// Every reference descriptor is replaced by a live service: the locally
/// stored object when the chain's object token resolves, otherwise a
/// [`RemoteProxy`] deduplicated by chain and registered in the store.
///
/// # Errors
///
/// Returns a [`ProtocolError`] when a descriptor carries a malformed
/// chain. The error aborts marshaling of this message only.
pub fn deserialize(store: &mut ObjectStore, wire: &Json) -> Result<Value, ProtocolError> {
    match wire {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(Value::Number(n.clone())),
        Json::String(s) => Ok(Value::String(s.clone())),
        Json::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(deserialize(store, item)?);
            }
            Ok(Value::List(list))
        }
        Json::Object(object) if object.contains_key("ref") => {
            let reference = Reference::from_wire(object)?;
            Ok(Value::Service(resolve_reference(store, reference)))
        }
        Json::Object(object) => {
            let mut map = BTreeMap::new();
            for (key, item) in object {
                map.insert(key.clone(), deserialize(store, item)?);
            }
            Ok(Value::Map(map))
        }
    }
}

/// Deserializes a positional argument sequence.
///
/// A non-array wire value yields a single-argument list, mirroring the
/// tolerance of the wire protocol toward sloppy senders.
pub fn deserialize_args(store: &mut ObjectStore, wire: &Json) -> Result<Vec<Value>, ProtocolError> {
    match deserialize(store, wire)? {
        Value::List(args) => Ok(args),
        other => Ok(vec![other]),
    }
}

/// Looks up the live object a reference denotes, minting and registering a
/// proxy when the chain does not resolve locally.
fn resolve_reference(store: &mut ObjectStore, reference: Reference) -> Rc<dyn Service> {
    if let Some(local) = store.get(reference.chain().object()) {
        return local;
    }

    let name = reference.chain().object().to_string();
    let proxy: Rc<dyn Service> = Rc::new(RemoteProxy::new(reference.clone()));
    store.insert(name, proxy.clone());
    store.stamp(&proxy, reference);
    proxy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Callback;
    use serde_json::json;

    fn plain_tree() -> Value {
        let mut map = BTreeMap::new();
        map.insert("text".to_string(), Value::from("hello"));
        map.insert("count".to_string(), Value::from(3i64));
        map.insert(
            "nested".to_string(),
            Value::List(vec![Value::Null, Value::from(true), Value::from(2.5)]),
        );
        Value::Map(map)
    }

    #[test]
    fn test_round_trip_without_live_nodes() {
        let mut store = ObjectStore::new();
        let tree = plain_tree();

        let wire = serialize(&mut store, Some("me"), &tree);
        let back = deserialize(&mut store, &wire).unwrap();

        assert_eq!(back, tree);
        // No registrations happen for plain trees.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sequence_order_preserved() {
        let mut store = ObjectStore::new();
        let tree = Value::List(vec![Value::from(1i64), Value::from(2i64), Value::from(3i64)]);

        let wire = serialize(&mut store, None, &tree);
        assert_eq!(wire, json!([1, 2, 3]));
    }

    #[test]
    fn test_service_reference_is_stable() {
        let mut store = ObjectStore::new();
        let service = Value::service(CallbackService::new(Callback::new(|_, _| {})));

        let first = serialize(&mut store, Some("me"), &service);
        let second = serialize(&mut store, Some("me"), &service);

        assert_eq!(first["ref"], second["ref"]);
        assert_eq!(first["ref"][0], json!("client"));
        assert_eq!(first["ref"][1], json!("me"));
        // One registration, reused on the second pass.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_callback_serialization_is_not_idempotent() {
        let mut store = ObjectStore::new();
        let callback = Value::callback(|_, _| {});

        let first = serialize(&mut store, Some("me"), &callback);
        let second = serialize(&mut store, Some("me"), &callback);

        // Each pass wraps the callable in a fresh disposable handler.
        assert_ne!(first["ref"][2], second["ref"][2]);
        assert_eq!(first["ref"][3], json!("callback"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_callback_chain_pending_without_session() {
        let mut store = ObjectStore::new();
        let callback = Value::callback(|_, _| {});

        let wire = serialize(&mut store, None, &callback);
        assert_eq!(wire["ref"][0], json!("client"));
        assert_eq!(wire["ref"][1], json!(null));
        assert_eq!(wire["operations"], json!(["callback"]));
    }

    #[test]
    fn test_deserialize_dedups_proxies() {
        let mut store = ObjectStore::new();
        let wire = json!({"ref": ["client", "peer", "objAbc"], "operations": ["msg"]});

        let first = deserialize(&mut store, &wire).unwrap();
        let second = deserialize(&mut store, &wire).unwrap();

        // Same proxy instance both times, registered exactly once.
        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
        assert!(store.contains("objAbc"));
    }

    #[test]
    fn test_deserialize_resolves_local_objects() {
        let mut store = ObjectStore::new();
        let service = Value::service(CallbackService::new(Callback::new(|_, _| {})));
        let wire = serialize(&mut store, Some("me"), &service);

        let resolved = deserialize(&mut store, &wire).unwrap();
        let original = service.as_service().unwrap();
        assert!(Rc::ptr_eq(resolved.as_service().unwrap(), original));
    }

    #[test]
    fn test_reserialized_proxy_keeps_remote_chain() {
        let mut store = ObjectStore::new();
        let wire = json!({"ref": ["client", "peer", "objAbc"], "operations": []});

        let proxy = deserialize(&mut store, &wire).unwrap();
        let back = serialize(&mut store, Some("me"), &proxy);

        assert_eq!(back["ref"], json!(["client", "peer", "objAbc"]));
    }

    #[test]
    fn test_malformed_descriptor_aborts_message() {
        let mut store = ObjectStore::new();
        let wire = json!([1, {"ref": "not-an-array"}]);

        let result = deserialize(&mut store, &wire);
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedReference { .. })
        ));
    }

    #[test]
    fn test_deserialize_args_tolerates_non_array() {
        let mut store = ObjectStore::new();
        let args = deserialize_args(&mut store, &json!("lone")).unwrap();
        assert_eq!(args, vec![Value::from("lone")]);
    }
}
