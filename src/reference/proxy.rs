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

//! Proxies for objects living on the far end of the connection.

use crate::bridge::Bridge;
use crate::reference::Reference;
use crate::service::Service;
use crate::store::DispatchError;
use crate::value::Value;

/// A local stand-in for a remote object.
///
/// A proxy owns no remote state. Invoking a member forwards a `SEND`
/// command over the connection addressed to the proxy's chain; completion
/// is signalled only through callback arguments the caller chose to pass.
///
/// Proxies are created by deserialization when a wire reference does not
/// resolve to a locally stored object, and are deduplicated by address
/// chain: two messages referencing the same remote object yield the same
/// proxy instance.
pub struct RemoteProxy {
    reference: Reference,
}

impl RemoteProxy {
    /// Creates a proxy forwarding to the given reference.
    #[must_use]
    pub fn new(reference: Reference) -> Self {
        Self { reference }
    }

    /// Returns the reference this proxy forwards to.
    #[must_use]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl Service for RemoteProxy {
    fn call(&self, bridge: &Bridge, member: &str, args: Vec<Value>) -> Result<(), DispatchError> {
        self.reference.invoke(bridge, member, args);
        Ok(())
    }

    fn members(&self) -> Vec<String> {
        self.reference.operations().to_vec()
    }
}
