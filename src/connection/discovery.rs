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

//! Redirector-based endpoint discovery.
//!
//! When no explicit host/port pair is configured, the client performs one
//! HTTP lookup against the redirector before entering the connection loop:
//! `GET <redirector>/redirect/<api_key>` returning
//! `{"data": {"bridge_host": ..., "bridge_port": ...}}`. Discovery is a
//! one-shot step; on failure the error is logged and no connection is
//! attempted.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors aborting the discovery step.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The redirector could not be reached.
    #[error("unable to contact redirector at {url}: {source}")]
    Unreachable {
        /// The URL that was requested.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The redirector response body was not parsable.
    #[error("unable to parse redirector response: {source}")]
    InvalidResponse {
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The response parsed but did not carry a usable endpoint.
    #[error("redirector response is missing bridge host and port")]
    MissingEndpoint,

    /// The advertised port was not a valid TCP port.
    #[error("redirector returned an invalid port: {value:?}")]
    InvalidPort {
        /// The offending port field, rendered as text.
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct RedirectorBody {
    data: Option<RedirectorData>,
}

#[derive(Debug, Deserialize)]
struct RedirectorData {
    bridge_host: Option<String>,
    bridge_port: Option<PortField>,
}

/// Gateways have been observed advertising the port as either a number or
/// a decimal string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortField {
    Number(u16),
    Text(String),
}

impl PortField {
    fn parse(self) -> Result<u16, DiscoveryError> {
        match self {
            Self::Number(port) => Ok(port),
            Self::Text(text) => text
                .parse()
                .map_err(|_| DiscoveryError::InvalidPort { value: text }),
        }
    }
}

/// Resolves the gateway endpoint for the given credential.
///
/// # Errors
///
/// Returns a [`DiscoveryError`] when the redirector is unreachable, the
/// body is unparsable, or the endpoint fields are missing or invalid.
pub async fn lookup(redirector: &str, api_key: &str) -> Result<(String, u16), DiscoveryError> {
    let url = format!("{}/redirect/{}", redirector.trim_end_matches('/'), api_key);
    info!(%url, "resolving gateway endpoint");

    let response = reqwest::get(&url)
        .await
        .map_err(|source| DiscoveryError::Unreachable {
            url: url.clone(),
            source,
        })?;

    let body: RedirectorBody = response
        .json()
        .await
        .map_err(|source| DiscoveryError::InvalidResponse { source })?;

    let data = body.data.ok_or(DiscoveryError::MissingEndpoint)?;
    let host = data.bridge_host.ok_or(DiscoveryError::MissingEndpoint)?;
    let port = data
        .bridge_port
        .ok_or(DiscoveryError::MissingEndpoint)?
        .parse()?;

    info!(%host, port, "gateway endpoint resolved");
    Ok((host, port))
}
