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

//! Top-level error types.
//!
//! Runtime faults are handled where they occur and converted to a log
//! line, a dropped message or a lifecycle event; none of them unwind past
//! the connection or dispatcher boundary into caller code. The variants
//! composed here surface only through the public API: configuration
//! precondition failures and the one-shot discovery step from
//! [`connect`](crate::Bridge::connect), and reserved-name rejection from
//! [`publish_service`](crate::Bridge::publish_service).

use crate::connection::discovery::DiscoveryError;
use crate::connection::{ProtocolError, TransportError};
use crate::store::DispatchError;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Configuration precondition failures.
///
/// These are the only startup-fatal conditions in the client; everything
/// after startup degrades to logging and lifecycle events.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Discovery requires a credential and none was configured.
    #[error("api_key is required when host and port are not configured")]
    MissingApiKey,

    /// The service name collides with the built-in system service.
    #[error("invalid service name: {name:?} is reserved")]
    ReservedServiceName {
        /// The rejected name.
        name: String,
    },
}

/// Composite error type for the client.
#[derive(Debug)]
pub enum BridgeError {
    /// A configuration precondition failed.
    Config(ConfigError),
    /// The redirector lookup failed; no connection was attempted.
    Discovery(DiscoveryError),
    /// The TCP session failed.
    Transport(TransportError),
    /// A single wire message was malformed.
    Protocol(ProtocolError),
    /// A command could not be routed to a handler.
    Dispatch(DispatchError),
}

impl BridgeError {
    /// True for configuration precondition failures.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// True when the redirector lookup failed.
    #[must_use]
    pub const fn is_discovery_error(&self) -> bool {
        matches!(self, Self::Discovery(_))
    }

    /// True for socket-level failures.
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// True for malformed-message failures.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// True for routing failures.
    #[must_use]
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Discovery(e) => write!(f, "discovery error: {e}"),
            Self::Transport(e) => write!(f, "transport error: {e}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Dispatch(e) => write!(f, "dispatch error: {e}"),
        }
    }
}

impl StdError for BridgeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Dispatch(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BridgeError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<DiscoveryError> for BridgeError {
    fn from(error: DiscoveryError) -> Self {
        Self::Discovery(error)
    }
}

impl From<TransportError> for BridgeError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ProtocolError> for BridgeError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

impl From<DispatchError> for BridgeError {
    fn from(error: DispatchError) -> Self {
        Self::Dispatch(error)
    }
}
