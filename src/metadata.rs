//! Execution metadata decoding.
//!
//! When an image is staged, the upstream inspector records its exposed ports
//! and configured user as a JSON blob. This module decodes that blob and
//! derives the port set and run-as user the recipe needs.
//!
//! ```json
//! {"cmd": ["/server"], "user": "app", "ports": [{"Port": 8080, "Protocol": "tcp"}]}
//! ```

use crate::constants::{DEFAULT_PORT, DEFAULT_USER, SUPPORTED_PROTOCOL};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::error;

/// A port the image declares as exposed.
///
/// A missing protocol decodes as empty, which no supported protocol matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedPort {
    #[serde(rename = "Port", alias = "port", default, deserialize_with = "null_as_default")]
    pub port: u32,
    #[serde(
        rename = "Protocol",
        alias = "protocol",
        default,
        deserialize_with = "null_as_default"
    )]
    pub protocol: String,
}

/// Decoded image-inspection data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub workdir: String,
    #[serde(
        default,
        rename = "ports",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exposed_ports: Vec<ExposedPort>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub user: String,
}

/// Decodes an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExecutionMetadata {
    /// Decodes a metadata blob. An empty blob or a bare `null` decodes to
    /// empty metadata.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedMetadata`] if the blob is not a JSON object of the
    /// expected shape. Unknown fields are ignored.
    pub fn parse(blob: &str) -> Result<Self> {
        if blob.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str::<Option<Self>>(blob)
            .map(Option::unwrap_or_default)
            .map_err(|e| {
                error!(metadata = %blob, "parsing-execution-metadata-failed: {}", e);
                Error::MalformedMetadata {
                    reason: e.to_string(),
                }
            })
    }
}

/// Non-empty, ordered list of container ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortSet(Vec<u32>);

impl PortSet {
    /// Creates a set holding one port.
    pub fn single(port: u32) -> Self {
        Self(vec![port])
    }

    /// Creates a set from a list, returning `None` if the list is empty.
    pub fn from_vec(ports: Vec<u32>) -> Option<Self> {
        (!ports.is_empty()).then_some(Self(ports))
    }

    /// The primary port (used for `PORT` and route targets).
    pub fn first(&self) -> u32 {
        self.0[0]
    }

    pub fn push(&mut self, port: u32) {
        self.0.push(port);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u32> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PortSet {
    type Item = &'a u32;
    type IntoIter = std::slice::Iter<'a, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collects the tcp ports the image exposes, in declaration order.
///
/// Images that declare nothing get [`DEFAULT_PORT`].
///
/// # Errors
///
/// [`Error::NoSupportedPortsFound`] if ports are declared but none is tcp.
pub fn extract_exposed_ports(metadata: &ExecutionMetadata) -> Result<PortSet> {
    if metadata.exposed_ports.is_empty() {
        return Ok(PortSet::single(DEFAULT_PORT));
    }

    let ports: Vec<u32> = metadata
        .exposed_ports
        .iter()
        .filter(|p| p.protocol == SUPPORTED_PROTOCOL)
        .map(|p| p.port)
        .collect();

    PortSet::from_vec(ports).ok_or_else(|| {
        let protocols: Vec<String> = metadata
            .exposed_ports
            .iter()
            .map(|p| p.protocol.clone())
            .collect();
        error!(?protocols, "parsing-exposed-ports-failed");
        Error::NoSupportedPortsFound { protocols }
    })
}

/// Returns the image's user, or `root` if it names none.
pub fn extract_user(metadata: &ExecutionMetadata) -> String {
    if metadata.user.is_empty() {
        DEFAULT_USER.to_string()
    } else {
        metadata.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_set_from_empty_vec_is_none() {
        assert!(PortSet::from_vec(vec![]).is_none());
    }

    #[test]
    fn port_set_first_is_declaration_order() {
        let ports = PortSet::from_vec(vec![9090, 8080]).unwrap();
        assert_eq!(ports.first(), 9090);
        assert_eq!(ports.len(), 2);
    }
}
