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

//! Lifecycle event registry.
//!
//! An ordinary mapping from event name to an ordered callback list.
//! Registration is append-only; the only removal is an explicit clear of a
//! whole event. Callbacks fire in registration order.

use crate::bridge::Bridge;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A registered lifecycle callback.
pub(crate) type EventHandler = Rc<dyn Fn(&Bridge, &[Value])>;

/// Mapping from event name to its ordered callback list.
#[derive(Default)]
pub(crate) struct EventRegistry {
    handlers: HashMap<String, Vec<EventHandler>>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a callback to the event's list.
    pub(crate) fn on(&mut self, event: &str, handler: EventHandler) {
        self.handlers.entry(event.to_string()).or_default().push(handler);
    }

    /// Removes every callback registered for the event.
    pub(crate) fn clear(&mut self, event: &str) {
        self.handlers.remove(event);
    }

    /// Returns a snapshot of the event's callbacks, in registration order.
    ///
    /// Snapshotting lets the caller drop its borrow of the registry before
    /// running user code.
    pub(crate) fn handlers(&self, event: &str) -> Vec<EventHandler> {
        self.handlers.get(event).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_handlers_fire_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry.on(
                "ready",
                Rc::new(move |_, _| order.borrow_mut().push(tag)),
            );
        }

        let bridge = crate::bridge::Bridge::new(crate::config::Config::default());
        for handler in registry.handlers("ready") {
            handler(&bridge, &[]);
        }
        assert_eq!(*order.borrow(), ["first", "second", "third"]);
    }

    #[test]
    fn test_clear_removes_all() {
        let mut registry = EventRegistry::new();
        registry.on("ready", Rc::new(|_, _| {}));
        registry.on("ready", Rc::new(|_, _| {}));
        registry.clear("ready");
        assert!(registry.handlers("ready").is_empty());
    }

    #[test]
    fn test_unknown_event_is_empty() {
        let registry = EventRegistry::new();
        assert!(registry.handlers("missing").is_empty());
    }
}
