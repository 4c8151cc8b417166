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

//! Connection layer error types.
//!
//! Two classes of failure live here, with different blast radii:
//!
//! - [`TransportError`]: the socket itself failed (or the stream is
//!   desynchronized beyond recovery). The connection transitions to
//!   `Closed`, the `disconnect` event fires, and reconnection is scheduled
//!   if enabled. Never fatal to the process.
//! - [`ProtocolError`]: one inbound message was malformed. The offending
//!   message is logged and dropped; the connection stays up.

use std::io;
use thiserror::Error;

/// Errors affecting the whole TCP session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the gateway.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to read from the stream mid-frame.
    #[error("read failed: {source}")]
    ReadFailed {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write to the stream.
    #[error("write failed: {source}")]
    WriteFailed {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A frame exceeded the maximum allowed size.
    ///
    /// An oversized length prefix cannot be skipped over in a
    /// length-prefixed stream, so this closes the connection rather than
    /// dropping one message.
    #[error("frame size {size} exceeds maximum allowed size {max}")]
    FrameTooLarge {
        /// Observed payload size in bytes.
        size: usize,
        /// The configured ceiling.
        max: usize,
    },

    /// The peer closed the stream at a frame boundary.
    #[error("connection closed by peer")]
    Closed,
}

/// Errors confined to a single inbound message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame payload was not valid UTF-8.
    #[error("frame payload is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// The underlying decoding error.
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Frame payload was not parsable as JSON.
    #[error("message parsing failed: {source}")]
    InvalidJson {
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A wire reference descriptor was structurally invalid.
    #[error("malformed reference descriptor: {reason}")]
    MalformedReference {
        /// What was wrong with the descriptor.
        reason: String,
    },
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::MalformedReference`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            reason: reason.into(),
        }
    }
}
