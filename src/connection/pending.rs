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

//! Buffering of outbound messages while the connection is not ready.
//!
//! Messages composed before the identity handshake completes are held here
//! in FIFO order. References serialized before the session identifier was
//! known carry a `null` qualifier placeholder; the flush rewrites those in
//! place with the assigned client id before transmission.
//!
//! No depth cap is imposed; an embedder concerned about unbounded growth
//! while disconnected should throttle at the application layer.

use serde_json::Value as Json;
use std::collections::VecDeque;

/// FIFO queue of decoded message envelopes awaiting transmission.
#[derive(Default)]
pub(crate) struct PendingQueue {
    queue: VecDeque<Json>,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the back of the queue.
    pub(crate) fn push(&mut self, message: Json) {
        self.queue.push_back(message);
    }

    /// Takes every queued message, oldest first.
    pub(crate) fn drain(&mut self) -> VecDeque<Json> {
        std::mem::take(&mut self.queue)
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Rewrites pending self-reference placeholders with the assigned client
/// identifier.
///
/// Walks the envelope looking for `ref` chains of the shape
/// `["client", null, ...]` and substitutes the id into the qualifier slot.
pub(crate) fn rewrite_client_id(message: &mut Json, client_id: &str) {
    match message {
        Json::Object(object) => {
            for (key, value) in object.iter_mut() {
                if key == "ref" {
                    if let Json::Array(tokens) = value {
                        if tokens.len() >= 3
                            && tokens[0].as_str() == Some("client")
                            && tokens[1].is_null()
                        {
                            tokens[1] = Json::String(client_id.to_string());
                        }
                    }
                }
                rewrite_client_id(value, client_id);
            }
        }
        Json::Array(items) => {
            for item in items {
                rewrite_client_id(item, client_id);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fifo_order() {
        let mut queue = PendingQueue::new();
        queue.push(json!({"n": 1}));
        queue.push(json!({"n": 2}));
        queue.push(json!({"n": 3}));

        let drained: Vec<_> = queue.drain().into_iter().collect();
        assert_eq!(drained, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_rewrite_substitutes_placeholder() {
        let mut message = json!({
            "command": "JOINCHANNEL",
            "data": {
                "name": "lobby",
                "handler": {"ref": ["client", null, "objAbc"], "operations": []},
                "callback": {"ref": ["client", null, "cbXyz", "callback"], "operations": ["callback"]},
            },
        });

        rewrite_client_id(&mut message, "session-1");

        assert_eq!(
            message["data"]["handler"]["ref"],
            json!(["client", "session-1", "objAbc"])
        );
        assert_eq!(
            message["data"]["callback"]["ref"],
            json!(["client", "session-1", "cbXyz", "callback"])
        );
    }

    #[test]
    fn test_rewrite_leaves_resolved_chains_alone() {
        let mut message = json!({
            "data": {
                "handler": {"ref": ["client", "peer-7", "objAbc"]},
                "service": {"ref": ["named", "chatty", "chatty"]},
            },
        });
        let before = message.clone();

        rewrite_client_id(&mut message, "session-1");
        assert_eq!(message, before);
    }
}
