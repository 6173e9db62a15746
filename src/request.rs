//! Desire-app requests and their validation.
//!
//! A [`DesireRequest`] arrives from the upstream API-translation layer as
//! JSON. It describes one app backed by a container image. Before anything is
//! built, [`validate_request`] checks that the image source is unambiguous and
//! that the container lifecycle is available.

use crate::config::Config;
use crate::constants::DOCKER_LIFECYCLE;
use crate::error::{Error, Result};
use crate::metadata::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

/// Generic routing metadata keyed by route kind (e.g. `http_routes`).
pub type RoutingInfo = BTreeMap<String, serde_json::Value>;

/// A name/value environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

impl EnvironmentVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How the executor decides an instance is healthy.
///
/// Kinds this builder does not know decode as [`HealthCheckType::Other`] and
/// get no monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HealthCheckType {
    /// Not specified; treated like `Port`.
    #[default]
    Unspecified,
    /// Probe every exposed port.
    Port,
    /// Healthy as long as the process runs.
    Process,
    /// No health checking.
    None,
    /// Any other kind, kept verbatim.
    Other(String),
}

impl HealthCheckType {
    /// Returns true if a port-probe monitor should be built.
    pub fn wants_port_monitor(&self) -> bool {
        matches!(self, Self::Unspecified | Self::Port)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Unspecified => "",
            Self::Port => "port",
            Self::Process => "process",
            Self::None => "none",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for HealthCheckType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "" => Self::Unspecified,
            "port" => Self::Port,
            "process" => Self::Process,
            "none" => Self::None,
            _ => Self::Other(kind),
        }
    }
}

impl From<HealthCheckType> for String {
    fn from(kind: HealthCheckType) -> Self {
        kind.as_str().to_string()
    }
}

/// Inclusive port range of an egress rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u32,
    pub end: u32,
}

/// ICMP type/code selector of an egress rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpInfo {
    #[serde(rename = "type")]
    pub icmp_type: i32,
    pub code: i32,
}

/// An egress (security group) rule, passed through to the run-spec untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub protocol: String,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp_info: Option<IcmpInfo>,
    #[serde(default)]
    pub log: bool,
}

/// Request to run an app backed by a container image.
///
/// Missing fields and explicit `null`s take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesireRequest {
    /// Unique process identifier.
    #[serde(deserialize_with = "null_as_default")]
    pub process_guid: String,
    /// Container image reference (e.g. `nginx:1.25`).
    #[serde(rename = "docker_image", deserialize_with = "null_as_default")]
    pub docker_image_url: String,
    /// Alternate, non-container source. Must be empty for image apps.
    #[serde(deserialize_with = "null_as_default")]
    pub droplet_uri: String,
    #[serde(rename = "instances", deserialize_with = "null_as_default")]
    pub num_instances: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub memory_mb: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub disk_mb: u32,
    /// File-descriptor ceiling; zero selects the platform default.
    #[serde(deserialize_with = "null_as_default")]
    pub file_descriptors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub environment: Vec<EnvironmentVariable>,
    #[serde(deserialize_with = "null_as_default")]
    pub start_command: String,
    /// Opaque JSON produced when the image was inspected.
    #[serde(deserialize_with = "null_as_default")]
    pub execution_metadata: String,
    #[serde(rename = "routes", deserialize_with = "null_as_default")]
    pub routing_info: RoutingInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub health_check_type: HealthCheckType,
    #[serde(deserialize_with = "null_as_default")]
    pub health_check_timeout_in_seconds: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub allow_ssh: bool,
    /// Change token echoed into the run-spec annotation.
    #[serde(deserialize_with = "null_as_default")]
    pub etag: String,
    #[serde(deserialize_with = "null_as_default")]
    pub log_guid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub egress_rules: Vec<SecurityGroupRule>,
}

/// Validates a request before building.
///
/// Rules, in order:
/// 1. The container image reference must be non-empty.
/// 2. No droplet may be given alongside it.
/// 3. The container lifecycle must be configured.
///
/// Returns the configured lifecycle path.
///
/// # Errors
///
/// - [`Error::MissingImageSource`]
/// - [`Error::ConflictingSources`]
/// - [`Error::UnknownLifecycle`]
pub fn validate_request<'c>(
    request: &DesireRequest,
    config: &'c Config,
) -> Result<&'c str> {
    if request.docker_image_url.is_empty() {
        let err = Error::MissingImageSource {
            process_guid: request.process_guid.clone(),
        };
        error!(
            process_guid = %request.process_guid,
            droplet_uri = %request.droplet_uri,
            "desired-app-invalid: {}", err
        );
        return Err(err);
    }

    if !request.droplet_uri.is_empty() {
        let err = Error::ConflictingSources {
            process_guid: request.process_guid.clone(),
            droplet_uri: request.droplet_uri.clone(),
        };
        error!(
            process_guid = %request.process_guid,
            docker_image = %request.docker_image_url,
            "desired-app-invalid: {}", err
        );
        return Err(err);
    }

    config
        .lifecycles
        .get(DOCKER_LIFECYCLE)
        .map(String::as_str)
        .ok_or_else(|| {
            error!(lifecycle = DOCKER_LIFECYCLE, "unknown-lifecycle");
            Error::UnknownLifecycle {
                lifecycle: DOCKER_LIFECYCLE.to_string(),
            }
        })
}
