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

//! Serializable reference descriptors.

use crate::bridge::Bridge;
use crate::connection::ProtocolError;
use crate::reference::AddressChain;
use crate::value::Value;
use serde_json::{json, Map, Value as Json};

/// A location descriptor for a local or remote object.
///
/// A reference owns no object; it names one. Two references with identical
/// address chains denote the same object. On the wire a reference travels
/// as `{"ref": [...], "operations": [...]}` where `operations` lists the
/// member names the far side is expected to expose, letting the receiver
/// build a proxy without a round trip.
///
/// # Examples
///
/// ```rust,no_run
/// use tether::Value;
///
/// # fn example(bridge: &tether::Bridge) {
/// let chat = bridge.get_service("chatty");
/// chat.invoke(bridge, "join", vec![Value::from("Vedant")]);
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    chain: AddressChain,
    operations: Vec<String>,
}

impl Reference {
    /// Creates a reference for the given chain with no declared operations.
    #[must_use]
    pub fn new(chain: AddressChain) -> Self {
        Self {
            chain,
            operations: Vec::new(),
        }
    }

    /// Declares the member names the referenced object exposes.
    #[must_use]
    pub fn with_operations(mut self, operations: Vec<String>) -> Self {
        self.operations = operations;
        self
    }

    /// Returns the address chain this reference denotes.
    #[must_use]
    pub fn chain(&self) -> &AddressChain {
        &self.chain
    }

    /// Returns the declared member names.
    #[must_use]
    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    /// Returns a reference addressing the given member of this object.
    #[must_use]
    pub fn method(&self, member: &str) -> Self {
        Self {
            chain: self.chain.with_member(member),
            operations: self.operations.clone(),
        }
    }

    /// Sends a fire-and-forget command invoking `member` on the referenced
    /// object with the given positional arguments.
    ///
    /// There is no reply channel; pass a [`Value::callback`] argument if the
    /// far side is expected to signal completion.
    pub fn invoke(&self, bridge: &Bridge, member: &str, args: Vec<Value>) {
        bridge.send(args, &self.method(member));
    }

    /// Encodes this reference as its wire-form descriptor object.
    #[must_use]
    pub fn to_wire(&self) -> Json {
        json!({
            "ref": self.chain.to_wire(),
            "operations": self.operations,
        })
    }

    /// Decodes a reference from a wire-form descriptor object.
    ///
    /// Unknown keys are ignored; non-string entries in `operations` are
    /// skipped. A missing or malformed `ref` entry is a [`ProtocolError`].
    pub fn from_wire(descriptor: &Map<String, Json>) -> Result<Self, ProtocolError> {
        let chain_value = descriptor
            .get("ref")
            .ok_or_else(|| ProtocolError::malformed("descriptor is missing the ref field"))?;
        let chain = AddressChain::from_wire(chain_value)?;

        let operations = descriptor
            .get("operations")
            .and_then(Json::as_array)
            .map(|ops| {
                ops.iter()
                    .filter_map(Json::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { chain, operations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        let reference = Reference::new(AddressChain::named("chatty"))
            .with_operations(vec!["join".into(), "leave".into()]);
        let wire = reference.to_wire();
        let decoded = Reference::from_wire(wire.as_object().unwrap()).unwrap();
        assert_eq!(decoded, reference);
    }

    #[test]
    fn test_identical_chains_are_equal() {
        let a = Reference::new(AddressChain::named("svc"));
        let b = Reference::new(AddressChain::named("svc"));
        assert_eq!(a.chain(), b.chain());
    }

    #[test]
    fn test_missing_ref_field() {
        let descriptor = json!({"operations": []});
        let result = Reference::from_wire(descriptor.as_object().unwrap());
        assert!(matches!(
            result,
            Err(ProtocolError::MalformedReference { .. })
        ));
    }

    #[test]
    fn test_non_string_operations_skipped() {
        let descriptor = json!({
            "ref": ["named", "svc", "svc"],
            "operations": ["join", 7, null, "leave"],
        });
        let reference = Reference::from_wire(descriptor.as_object().unwrap()).unwrap();
        assert_eq!(reference.operations(), ["join", "leave"]);
    }

    #[test]
    fn test_method_addresses_member() {
        let reference = Reference::new(AddressChain::named("chatty"));
        assert_eq!(reference.method("join").chain().member(), Some("join"));
    }
}
