//! # Recipe Builder Constants
//!
//! Defines the fixed ports, container paths, log sources, and limits that
//! every generated run-spec shares. These constants are the **single source
//! of truth** for values the downstream executor and router depend on.
//!
//! ## Modification Guidelines
//!
//! Most of these values are wire-visible: the in-container lifecycle binaries
//! expect the paths below, the router expects the route keys, and the log
//! aggregator expects the log sources. Changing one is a protocol change.
//!
//! ## Cross-References
//!
//! - [`crate::image`]: Uses the scheme and default index constants
//! - [`crate::metadata`]: Uses the default port and protocol
//! - [`crate::action`]: Uses the lifecycle paths and limits
//! - [`crate::routes`]: Uses the route keys
//! - [`crate::recipe`]: Uses the domain, log sources, and CPU bounds

use std::time::Duration;

// =============================================================================
// Image References
// =============================================================================

/// URI scheme of canonical image references in generated run-specs.
pub const DOCKER_SCHEME: &str = "docker";

/// Hostname of the default (official) image index.
pub const DOCKER_INDEX_SERVER: &str = "docker.io";

/// Namespace prepended to single-segment repositories on the official index.
pub const DEFAULT_NAMESPACE: &str = "library";

/// Maximum accepted image reference length in bytes.
pub const MAX_IMAGE_REF_LEN: usize = 512;

// =============================================================================
// Ports
// =============================================================================

/// Port assumed when the image declares no exposed ports.
pub const DEFAULT_PORT: u32 = 8080;

/// Container-side port the ssh daemon listens on.
pub const DEFAULT_SSH_PORT: u32 = 2222;

/// The only transport protocol routed to applications.
pub const SUPPORTED_PROTOCOL: &str = "tcp";

// =============================================================================
// Lifecycle
// =============================================================================
//
// The lifecycle tarball is downloaded into LIFECYCLE_DIR during setup; the
// binaries below are the entries the run and monitor actions invoke.
// =============================================================================

/// Lifecycle table key for container-image apps.
pub const DOCKER_LIFECYCLE: &str = "docker";

/// Path inside the container the lifecycle is downloaded to.
pub const LIFECYCLE_DIR: &str = "/tmp/lifecycle";

/// Launcher binary that starts the app process.
pub const LAUNCHER_PATH: &str = "/tmp/lifecycle/launcher";

/// Secure-shell daemon binary.
pub const SSHD_PATH: &str = "/tmp/lifecycle/diego-sshd";

/// Port probe binary used by the monitor action.
pub const HEALTHCHECK_PATH: &str = "/tmp/lifecycle/healthcheck";

/// Path on the file server under which lifecycles are served.
pub const FILE_SERVER_STATIC_PATH: &str = "/v1/static/";

/// User the app runs as when the image names none.
pub const DEFAULT_USER: &str = "root";

// =============================================================================
// Limits
// =============================================================================

/// File-descriptor ceiling when the request supplies none.
pub const DEFAULT_FILE_DESCRIPTOR_LIMIT: u64 = 1024;

/// File-descriptor ceiling for health probes.
pub const HEALTHCHECK_FILE_DESCRIPTOR_LIMIT: u64 = 1024;

/// Bound on each monitor probe round.
pub const MONITOR_TIMEOUT: Duration = Duration::from_secs(30);

/// RSA modulus size for ssh host and user keys.
pub const SSH_KEY_BITS: usize = 1024;

/// Memory (MB) at or below which an app gets the minimum CPU weight.
pub const MIN_CPU_PROXY: u32 = 256;

/// Memory (MB) above which an app gets the maximum CPU weight.
pub const MAX_CPU_PROXY: u32 = 8192;

/// Maximum configuration file size (1 MiB).
pub const MAX_CONFIG_SIZE: usize = 1024 * 1024;

// =============================================================================
// Run-Spec Tags
// =============================================================================

/// Scheduler domain all app run-specs belong to.
pub const APP_LRP_DOMAIN: &str = "cf-apps";

/// Log source of the app process.
pub const APP_LOG_SOURCE: &str = "APP";

/// Log source of the run-spec as a whole.
pub const LRP_LOG_SOURCE: &str = "CELL";

/// Log source of health probes.
pub const HEALTH_LOG_SOURCE: &str = "HEALTH";

/// Environment variable carrying the app's primary port.
pub const PORT_ENV_VAR: &str = "PORT";

// =============================================================================
// Route Keys
// =============================================================================

/// Route table key for http routes.
pub const CF_ROUTER: &str = "cf-router";

/// Route table key for tcp routes.
pub const TCP_ROUTER: &str = "tcp-router";

/// Route table key for the ssh side-channel.
pub const DIEGO_SSH: &str = "diego-ssh";

/// Incoming routing-info key for http routes.
pub const CC_HTTP_ROUTES: &str = "http_routes";

/// Incoming routing-info key for tcp routes.
pub const CC_TCP_ROUTES: &str = "tcp_routes";
