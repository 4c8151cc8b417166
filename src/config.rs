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

//! Client configuration.

use std::time::Duration;

/// Default redirector base URL used for discovery.
pub const DEFAULT_REDIRECTOR: &str = "http://redirector.flotype.com";

/// Default initial reconnect interval.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(400);

/// Configuration for a [`Bridge`](crate::Bridge).
///
/// When `host` and `port` are both set, the redirector discovery step is
/// bypassed entirely; otherwise `api_key` is required and the endpoint is
/// resolved with one HTTP lookup before the connection loop starts.
///
/// # Examples
///
/// ```rust
/// use tether::Config;
///
/// let config = Config {
///     api_key: Some("abcdefgh".into()),
///     ..Config::default()
/// };
/// assert!(config.reconnect);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Opaque credential passed to the redirector and during handshake.
    ///
    /// The client forwards it; it neither verifies nor enforces identity.
    pub api_key: Option<String>,

    /// Gateway host. Set together with `port` to bypass discovery.
    pub host: Option<String>,

    /// Gateway port. Set together with `host` to bypass discovery.
    pub port: Option<u16>,

    /// Redirector base URL for discovery.
    ///
    /// Default: `http://redirector.flotype.com`
    pub redirector: String,

    /// Whether to reconnect after a lost connection.
    ///
    /// Default: true
    pub reconnect: bool,

    /// Initial reconnect interval; successive attempts double it up to the
    /// backoff ceiling.
    ///
    /// Default: 400 ms
    pub reconnect_interval: Duration,

    /// Log verbosity directive, applied through `tracing-subscriber`'s
    /// env-filter syntax (e.g. `"tether=debug"`) when the client connects.
    /// Leave unset to let the embedding application own subscriber setup.
    pub log: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            host: None,
            port: None,
            redirector: DEFAULT_REDIRECTOR.to_string(),
            reconnect: true,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            log: None,
        }
    }
}

impl Config {
    /// True when discovery can be skipped.
    #[must_use]
    pub fn has_endpoint(&self) -> bool {
        self.host.is_some() && self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.redirector, DEFAULT_REDIRECTOR);
        assert!(config.reconnect);
        assert_eq!(config.reconnect_interval, Duration::from_millis(400));
        assert!(!config.has_endpoint());
    }

    #[test]
    fn test_has_endpoint_requires_both() {
        let mut config = Config {
            host: Some("127.0.0.1".into()),
            ..Config::default()
        };
        assert!(!config.has_endpoint());
        config.port = Some(8090);
        assert!(config.has_endpoint());
    }
}
