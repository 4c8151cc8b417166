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

//! The capability seam for dispatchable objects.
//!
//! Every object the dispatcher can target implements [`Service`]: a mapping
//! from member-name strings to invocable handlers. An unknown member is a
//! defined [`DispatchError::UnknownMember`] result, never a crash of the
//! dispatch loop.

use crate::bridge::Bridge;
use crate::store::DispatchError;
use crate::value::Value;
use std::rc::Rc;

/// A dispatchable object exposing named members.
///
/// Implementations match on the member name and invoke the corresponding
/// handler with positional arguments. Services needing mutable state use
/// interior mutability (`RefCell`); the runtime is single-threaded, so no
/// synchronization is required.
///
/// # Examples
///
/// ```rust
/// use tether::{Bridge, DispatchError, Service, Value};
///
/// struct ChatServer;
///
/// impl Service for ChatServer {
///     fn call(&self, bridge: &Bridge, member: &str, mut args: Vec<Value>) -> Result<(), DispatchError> {
///         match member {
///             "join" => {
///                 let callback = args.pop();
///                 let handler = args.pop().ok_or(DispatchError::NotCallable)?;
///                 bridge.join_channel("lobby", &handler, callback);
///                 Ok(())
///             }
///             other => Err(DispatchError::UnknownMember {
///                 object: "chatty".into(),
///                 member: other.into(),
///             }),
///         }
///     }
///
///     fn members(&self) -> Vec<String> {
///         vec!["join".into()]
///     }
/// }
/// ```
pub trait Service {
    /// Invokes the named member with positional arguments.
    ///
    /// The bridge handle is passed in rather than captured so services can
    /// issue commands without holding a reference cycle back into the
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] for an unknown member or unusable
    /// arguments; the dispatcher logs it and drops the command.
    fn call(&self, bridge: &Bridge, member: &str, args: Vec<Value>) -> Result<(), DispatchError>;

    /// The member names advertised in references to this object.
    ///
    /// Used to build remote proxies on the far side without a round trip.
    /// Defaults to advertising nothing.
    fn members(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A callable captured for marshaling across the network.
///
/// Cheap to clone; clones share the underlying closure.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Bridge, Vec<Value>)>);

impl Callback {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&Bridge, Vec<Value>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the closure with positional arguments.
    pub fn invoke(&self, bridge: &Bridge, args: Vec<Value>) {
        (self.0)(bridge, args);
    }

    /// True when both callbacks share one underlying closure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// The disposable one-member handler a callable is wrapped in for
/// marshaling.
///
/// Its sole member is `callback`; the far side invokes the closure through
/// a reference whose chain ends in that member token.
pub struct CallbackService {
    func: Callback,
}

impl CallbackService {
    /// Wraps a captured callable.
    #[must_use]
    pub fn new(func: Callback) -> Self {
        Self { func }
    }
}

impl Service for CallbackService {
    fn call(&self, bridge: &Bridge, member: &str, args: Vec<Value>) -> Result<(), DispatchError> {
        match member {
            "callback" => {
                self.func.invoke(bridge, args);
                Ok(())
            }
            other => Err(DispatchError::UnknownMember {
                object: "callback handler".into(),
                member: other.into(),
            }),
        }
    }

    fn members(&self) -> Vec<String> {
        vec!["callback".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_clone_shares_closure() {
        let callback = Callback::new(|_, _| {});
        let clone = callback.clone();
        assert!(callback.ptr_eq(&clone));
        assert!(!callback.ptr_eq(&Callback::new(|_, _| {})));
    }

    #[test]
    fn test_callback_service_members() {
        let service = CallbackService::new(Callback::new(|_, _| {}));
        assert_eq!(service.members(), ["callback"]);
    }
}
