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

//! Routing of inbound commands to stored objects.
//!
//! Dispatch failures are non-fatal by contract: an unknown object or
//! member is logged as a warning and the command is dropped. Nothing here
//! unwinds into the connection loop.

use crate::bridge::Bridge;
use crate::reference::AddressChain;
use crate::value::Value;
use thiserror::Error;
use tracing::warn;

/// Errors produced while resolving or invoking a command target.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No object is registered under the chain's object-name token.
    #[error("could not find object to handle {chain}")]
    UnknownObject {
        /// The unresolvable chain, rendered for logging.
        chain: String,
    },

    /// The resolved object does not expose the requested member.
    #[error("{object} has no member {member:?}")]
    UnknownMember {
        /// Name of the resolved object.
        object: String,
        /// The member that was requested.
        member: String,
    },

    /// An argument expected to be callable was not.
    #[error("value is not callable")]
    NotCallable,

    /// An argument had the wrong shape for the invoked member.
    #[error("invalid argument: expected {expected}")]
    InvalidArgument {
        /// Description of what the member required.
        expected: &'static str,
    },
}

/// Resolves an address chain to a stored object and member and invokes it
/// with positional arguments.
///
/// Runs user code, so the caller must not hold a borrow of the bridge
/// interior when calling this.
pub(crate) fn dispatch(bridge: &Bridge, chain: &AddressChain, args: Vec<Value>) {
    let Some(member) = chain.member() else {
        warn!(%chain, "command has no member token, dropping");
        return;
    };

    let Some(service) = bridge.lookup(chain.object()) else {
        warn!(
            "{}",
            DispatchError::UnknownObject {
                chain: chain.to_string(),
            }
        );
        return;
    };

    if let Err(error) = service.call(bridge, member, args) {
        warn!(%chain, %error, "command dropped");
    }
}
