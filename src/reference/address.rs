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

//! Address chains: how exposed objects are named on the wire.
//!
//! An address chain is an ordered token sequence identifying a scope, an
//! owner, an object and optionally a member:
//!
//! ```text
//! [scope, scope-qualifier, object-name, member-name?]
//! ```
//!
//! On the wire it travels as a JSON array. A `client` chain whose qualifier
//! is unknown (the session identity has not been assigned yet) serializes
//! the qualifier as `null`; the pending-queue flush rewrites these
//! placeholders once the gateway assigns an identity.

use crate::connection::ProtocolError;
use serde_json::{json, Value as Json};
use std::fmt;

/// The ownership scope of an address chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// An object owned by a specific connected process, qualified by that
    /// process's session identifier.
    Client,
    /// A globally registered service name.
    Named,
    /// A named pub/sub channel.
    Channel,
}

impl Scope {
    /// Returns the wire token for this scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Named => "named",
            Self::Channel => "channel",
        }
    }

    /// Parses a wire token into a scope.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "client" => Some(Self::Client),
            "named" => Some(Self::Named),
            "channel" => Some(Self::Channel),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered token sequence identifying a remotely addressable object.
///
/// Chains are stable for the lifetime of the object they name: serializing
/// the same local object twice yields identical chains.
///
/// # Examples
///
/// ```rust
/// use tether::reference::AddressChain;
///
/// let chain = AddressChain::named("chatty").with_member("join");
/// assert_eq!(chain.object(), "chatty");
/// assert_eq!(chain.member(), Some("join"));
/// assert_eq!(chain.to_string(), "named.chatty.chatty.join");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressChain {
    scope: Scope,
    qualifier: Option<String>,
    object: String,
    member: Option<String>,
}

impl AddressChain {
    /// Creates a `client`-scoped chain for an object owned by this process.
    ///
    /// `session` is the client identifier assigned during handshake; `None`
    /// produces a pending self-reference placeholder.
    pub fn client(session: Option<String>, object: impl Into<String>) -> Self {
        Self {
            scope: Scope::Client,
            qualifier: session,
            object: object.into(),
            member: None,
        }
    }

    /// Creates a `named`-scoped chain for a globally registered service.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            scope: Scope::Named,
            qualifier: Some(name.clone()),
            object: name,
            member: None,
        }
    }

    /// Creates a `channel`-scoped chain for a pub/sub channel.
    pub fn channel(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            scope: Scope::Channel,
            object: format!("channel:{name}"),
            qualifier: Some(name),
            member: None,
        }
    }

    /// Returns the scope token.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the scope qualifier (session id, service name or channel
    /// name), if known.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Returns the object-name token. This is the key objects are stored
    /// and deduplicated under.
    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Returns the member-name token, if present.
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.member.as_deref()
    }

    /// Returns a copy of this chain addressing the given member, replacing
    /// any member already present.
    #[must_use]
    pub fn with_member(&self, member: impl Into<String>) -> Self {
        Self {
            member: Some(member.into()),
            ..self.clone()
        }
    }

    /// True for a `client` chain whose session identifier is not yet known.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.scope == Scope::Client && self.qualifier.is_none()
    }

    /// Encodes this chain as its wire-form JSON array.
    #[must_use]
    pub fn to_wire(&self) -> Json {
        let mut tokens = vec![json!(self.scope.as_str()), json!(self.qualifier), json!(self.object)];
        if let Some(member) = &self.member {
            tokens.push(json!(member));
        }
        Json::Array(tokens)
    }

    /// Decodes a chain from its wire-form JSON array.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] when the value is not an array of three
    /// or four tokens, the scope token is unknown, or a token has the wrong
    /// type.
    pub fn from_wire(value: &Json) -> Result<Self, ProtocolError> {
        let tokens = value
            .as_array()
            .ok_or_else(|| ProtocolError::malformed("address chain is not an array"))?;
        if tokens.len() < 3 || tokens.len() > 4 {
            return Err(ProtocolError::malformed(format!(
                "address chain has {} tokens, expected 3 or 4",
                tokens.len()
            )));
        }

        let scope_token = tokens[0]
            .as_str()
            .ok_or_else(|| ProtocolError::malformed("scope token is not a string"))?;
        let scope = Scope::parse(scope_token).ok_or_else(|| {
            ProtocolError::malformed(format!("unknown scope token {scope_token:?}"))
        })?;

        let qualifier = match &tokens[1] {
            Json::Null => None,
            Json::String(s) => Some(s.clone()),
            _ => return Err(ProtocolError::malformed("qualifier token is not a string")),
        };

        let object = tokens[2]
            .as_str()
            .ok_or_else(|| ProtocolError::malformed("object token is not a string"))?
            .to_string();

        let member = match tokens.get(3) {
            None => None,
            Some(Json::String(s)) => Some(s.clone()),
            Some(_) => return Err(ProtocolError::malformed("member token is not a string")),
        };

        Ok(Self {
            scope,
            qualifier,
            object,
            member,
        })
    }
}

impl fmt::Display for AddressChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.scope,
            self.qualifier.as_deref().unwrap_or("null"),
            self.object
        )?;
        if let Some(member) = &self.member {
            write!(f, ".{member}")?;
        }
        Ok(())
    }
}
