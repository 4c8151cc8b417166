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

//! The built-in `system` service.
//!
//! Every store carries one instance under the reserved name `system`. The
//! gateway drives channel plumbing and error signalling through it.

use crate::bridge::Bridge;
use crate::service::Service;
use crate::store::DispatchError;
use crate::value::Value;
use tracing::warn;

/// Gateway-facing control surface.
///
/// Members:
///
/// - `hookChannelHandler(name, handler, callback?)`: rebinds the local
///   `channel:<name>` registration to the service embedded in `handler`;
///   the optional callback receives the resolved service and the name.
///   Also answers to `hook_channel_handler`, a spelling older gateways
///   used during a transition.
/// - `getService(name, callback)`: looks up a locally stored object and
///   passes it (or null) to the callback along with the name.
/// - `remoteError(message)`: logs the message and raises the
///   `remote_error` lifecycle event.
pub(crate) struct SystemService;

impl Service for SystemService {
    fn call(&self, bridge: &Bridge, member: &str, args: Vec<Value>) -> Result<(), DispatchError> {
        match member {
            "hookChannelHandler" | "hook_channel_handler" => hook_channel_handler(bridge, args),
            "getService" => get_service(bridge, args),
            "remoteError" => remote_error(bridge, args),
            other => Err(DispatchError::UnknownMember {
                object: "system".into(),
                member: other.into(),
            }),
        }
    }

    fn members(&self) -> Vec<String> {
        vec![
            "hookChannelHandler".into(),
            "getService".into(),
            "remoteError".into(),
        ]
    }
}

fn hook_channel_handler(bridge: &Bridge, args: Vec<Value>) -> Result<(), DispatchError> {
    let mut args = args.into_iter();

    let name = args
        .next()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or(DispatchError::InvalidArgument {
            expected: "channel name string",
        })?;
    let handler = args
        .next()
        .and_then(|v| v.as_service().cloned())
        .ok_or(DispatchError::InvalidArgument {
            expected: "handler service",
        })?;

    bridge.store_insert(format!("channel:{name}"), handler.clone());

    if let Some(callback) = args.next() {
        callback.invoke(bridge, vec![Value::Service(handler), Value::String(name)])?;
    }
    Ok(())
}

fn get_service(bridge: &Bridge, args: Vec<Value>) -> Result<(), DispatchError> {
    let mut args = args.into_iter();

    let name = args
        .next()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or(DispatchError::InvalidArgument {
            expected: "service name string",
        })?;
    let callback = args.next().ok_or(DispatchError::NotCallable)?;

    let found = bridge
        .lookup(&name)
        .map_or(Value::Null, Value::Service);
    callback.invoke(bridge, vec![found, Value::String(name)])
}

fn remote_error(bridge: &Bridge, args: Vec<Value>) -> Result<(), DispatchError> {
    let message = args
        .first()
        .and_then(Value::as_str)
        .unwrap_or("unspecified remote error")
        .to_string();

    warn!(%message, "remote error reported by gateway");
    bridge.emit("remote_error", &[Value::String(message)]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_member() {
        let system = SystemService;
        assert_eq!(system.members().len(), 3);
    }
}
