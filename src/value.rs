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

//! The dynamic argument tree crossing the marshaling boundary.
//!
//! Command arguments are arbitrary trees of atoms, sequences and mappings
//! that may additionally embed live [`Service`] objects, [`Callback`]s and
//! [`Reference`]s. The marshaling engine rewrites the live variants into
//! wire references on the way out and resolves wire references back into
//! live services on the way in.

use crate::bridge::Bridge;
use crate::reference::Reference;
use crate::service::{Callback, Service};
use crate::store::DispatchError;
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A node in an argument tree.
///
/// Atoms pass through marshaling unchanged; [`Value::List`] and
/// [`Value::Map`] are traversed depth-first; [`Value::Ref`],
/// [`Value::Service`] and [`Value::Callback`] are replaced by wire
/// reference descriptors during serialization.
#[derive(Clone)]
pub enum Value {
    /// The null atom.
    Null,
    /// A boolean atom.
    Bool(bool),
    /// A numeric atom.
    Number(Number),
    /// A text atom.
    String(String),
    /// An ordered sequence. Insertion order is preserved on the wire.
    List(Vec<Value>),
    /// A key/value mapping. No sibling-key ordering is guaranteed.
    Map(BTreeMap<String, Value>),
    /// An explicit reference to a local or remote object.
    Ref(Reference),
    /// A live service object: either a local handler or a remote proxy.
    Service(Rc<dyn Service>),
    /// A callable, marshaled as a disposable one-member handler.
    Callback(Callback),
}

impl Value {
    /// Wraps a closure as a callable argument.
    ///
    /// On serialization the closure is registered as a disposable handler
    /// service whose sole member is `callback`; the far side invokes it by
    /// reference.
    pub fn callback(f: impl Fn(&Bridge, Vec<Value>) + 'static) -> Self {
        Self::Callback(Callback::new(f))
    }

    /// Wraps a service implementation as an argument.
    pub fn service(service: impl Service + 'static) -> Self {
        Self::Service(Rc::new(service))
    }

    /// Returns the text atom, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean atom, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the sequence, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping, if this is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the live service, if this is one.
    #[must_use]
    pub fn as_service(&self) -> Option<&Rc<dyn Service>> {
        match self {
            Self::Service(service) => Some(service),
            _ => None,
        }
    }

    /// True for the null atom.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Invokes this value as a completion callback with positional
    /// arguments.
    ///
    /// Callables run directly; services and references are invoked through
    /// their `callback` member, which for a remote proxy forwards the
    /// invocation over the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotCallable`] when the value is an atom or
    /// container.
    pub fn invoke(&self, bridge: &Bridge, args: Vec<Value>) -> Result<(), DispatchError> {
        match self {
            Self::Callback(callback) => {
                callback.invoke(bridge, args);
                Ok(())
            }
            Self::Service(service) => service.call(bridge, "callback", args),
            Self::Ref(reference) => {
                reference.invoke(bridge, "callback", args);
                Ok(())
            }
            _ => Err(DispatchError::NotCallable),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Ref(reference) => f.debug_tuple("Ref").field(reference).finish(),
            Self::Service(_) => f.write_str("Service(..)"),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            // Live objects compare by identity, not structure.
            (Self::Service(a), Self::Service(b)) => Rc::ptr_eq(a, b),
            (Self::Callback(a), Self::Callback(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        // Non-finite floats have no JSON representation.
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Self::Ref(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_equality() {
        assert_eq!(Value::from(42i64), Value::from(42i64));
        assert_eq!(Value::from("hi"), Value::from("hi".to_string()));
        assert_ne!(Value::from(true), Value::Null);
    }

    #[test]
    fn test_service_identity_equality() {
        let value = Value::service(crate::service::CallbackService::new(Callback::new(|_, _| {})));
        let clone = value.clone();
        assert_eq!(value, clone);

        let other = Value::service(crate::service::CallbackService::new(Callback::new(|_, _| {})));
        assert_ne!(value, other);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5), Value::Number(Number::from_f64(1.5).unwrap()));
    }

    #[test]
    fn test_accessors() {
        let value = Value::List(vec![Value::from("a")]);
        assert_eq!(value.as_list().unwrap().len(), 1);
        assert!(value.as_map().is_none());
        assert!(value.as_str().is_none());
    }
}
