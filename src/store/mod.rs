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

//! Process-local object store and command dispatcher.

mod dispatch;
pub(crate) mod system;

pub use dispatch::DispatchError;
pub(crate) use dispatch::dispatch;

use crate::reference::Reference;
use crate::service::Service;
use crate::store::system::SystemService;
use std::collections::HashMap;
use std::rc::Rc;

/// Reserved name of the built-in system service.
pub const SYSTEM_SERVICE: &str = "system";

/// The process-local mapping from names to live objects.
///
/// Names are either well-known (explicitly published services, `channel:`
/// bindings) or generated during marshaling. The store exclusively owns
/// each object for its registered lifetime; entries are removed only by
/// explicit unpublish or teardown of the owning bridge.
///
/// Alongside the name table the store keeps a stamp table, keyed by object
/// identity, recording the reference each object was first serialized
/// under. Stamping is what makes reference chains stable: serializing the
/// same object twice reuses the first chain instead of generating a new
/// name.
pub struct ObjectStore {
    objects: HashMap<String, Rc<dyn Service>>,
    stamps: HashMap<usize, Reference>,
}

impl ObjectStore {
    /// Creates a store holding only the built-in `system` service.
    #[must_use]
    pub fn new() -> Self {
        let mut objects: HashMap<String, Rc<dyn Service>> = HashMap::new();
        objects.insert(SYSTEM_SERVICE.to_string(), Rc::new(SystemService));
        Self {
            objects,
            stamps: HashMap::new(),
        }
    }

    /// Registers an object under the given name.
    ///
    /// A colliding name silently shadows the previous registration.
    pub fn insert(&mut self, name: impl Into<String>, service: Rc<dyn Service>) {
        self.objects.insert(name.into(), service);
    }

    /// Looks up an object by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<dyn Service>> {
        self.objects.get(name).cloned()
    }

    /// True when an object is registered under the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Removes a registration, along with its stamp.
    pub fn remove(&mut self, name: &str) -> Option<Rc<dyn Service>> {
        let service = self.objects.remove(name)?;
        self.stamps.remove(&identity(&service));
        Some(service)
    }

    /// Records the reference an object is serialized under.
    pub fn stamp(&mut self, service: &Rc<dyn Service>, reference: Reference) {
        self.stamps.insert(identity(service), reference);
    }

    /// Returns the reference an object was previously serialized under.
    #[must_use]
    pub fn reference_for(&self, service: &Rc<dyn Service>) -> Option<&Reference> {
        self.stamps.get(&identity(service))
    }

    /// Number of registered objects, including the system service.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing is registered (never the case in practice, since
    /// the system service is always present).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity key for the stamp table.
///
/// The store keeps every registered object alive, so its allocation address
/// is unique for as long as the stamp exists.
fn identity(service: &Rc<dyn Service>) -> usize {
    Rc::as_ptr(service) as *const () as usize
}
