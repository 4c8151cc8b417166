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

//! The address and reference model.
//!
//! Everything remotely addressable is named by an [`AddressChain`] and
//! described on the wire by a [`Reference`]. References to objects that do
//! not live in this process are resolved to [`RemoteProxy`] stand-ins.

mod address;
mod proxy;
#[allow(clippy::module_inception)]
mod reference;

pub use address::{AddressChain, Scope};
pub use proxy::RemoteProxy;
pub use reference::Reference;

use rand::Rng;

/// Alphabet used for generated object names.
const NAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of generated object names.
///
/// 32 tokens drawn from a 52-letter alphabet is roughly 182 bits of
/// entropy, making collisions within one process lifetime negligible.
/// Collisions are tolerated, not detected: a colliding registration would
/// silently shadow the older one.
const NAME_LENGTH: usize = 32;

/// Generates a fresh random object name.
///
/// # Examples
///
/// ```rust
/// let name = tether::reference::generate_name();
/// assert_eq!(name.len(), 32);
/// assert!(name.bytes().all(|b| b.is_ascii_alphabetic()));
/// ```
#[must_use]
pub fn generate_name() -> String {
    let mut rng = rand::thread_rng();
    (0..NAME_LENGTH)
        .map(|_| NAME_ALPHABET[rng.gen_range(0..NAME_ALPHABET.len())] as char)
        .collect()
}
