//! # recipebuilder
//!
//! **Container Run-Spec Builder for Desired Apps**
//!
//! This crate turns a platform-level "desire this app" request for an app
//! backed by a container image into a declarative run-spec for the
//! scheduling layer: canonical image reference, resource quotas, ports, a
//! route table, and the setup/run/monitor action trees the executor runs.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          RecipeBuilder                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────┐     │
//! │  │  validation    │  │ image          │  │ metadata           │     │
//! │  │  one source,   │  │ ubuntu →       │  │ ports (tcp only),  │     │
//! │  │  lifecycle set │  │ docker:///...  │  │ run-as user        │     │
//! │  └────────────────┘  └────────────────┘  └─────────┬──────────┘     │
//! │                                                     │               │
//! │  ┌──────────────────────────────────────────────────┼──────────┐    │
//! │  │                   ActionGraphBuilder             ▼          │    │
//! │  │  setup: Sequential(Download lifecycle)                      │    │
//! │  │  action: Concurrent(Run launcher [, Run sshd])              │    │
//! │  │  monitor: BoundedWait(30s, Parallel(healthcheck per port))  │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                         Collaborators                               │
//! │  ┌──────────────┐  ┌────────────────┐  ┌───────────────────┐        │
//! │  │    Config    │  │   KeyFactory   │  │  RouteTranslator  │        │
//! │  │  lifecycles  │  │   RSA 1024     │  │  http/tcp routes  │        │
//! │  └──────────────┘  └────────────────┘  └───────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The build is synchronous and keeps no state between calls. Apart from
//! generating ssh keys it has no side effects.
//!
//! # Example
//!
//! ```rust,ignore
//! use recipebuilder::{Config, DesireRequest, RecipeBuilder};
//!
//! let config = Config::from_file("recipebuilder.yml".as_ref())?;
//! let request: DesireRequest = serde_json::from_str(&body)?;
//! let run_spec = RecipeBuilder::new(config).build(&request)?;
//! assert_eq!(run_spec.root_fs, "docker:///library/nginx#1.25");
//! ```

pub mod action;
pub mod config;
pub mod constants;
pub mod error;
pub mod image;
pub mod keys;
pub mod metadata;
pub mod recipe;
pub mod request;
pub mod routes;

// Re-exports
pub use action::{Action, ActionGraph, ActionGraphBuilder, DownloadAction, ResourceLimits, RunAction};
pub use config::{lifecycle_download_url, Config};
pub use error::{Error, ErrorKind, Result};
pub use image::{normalize_image_reference, ImageReference};
pub use keys::{FingerprintFormat, KeyFactory, KeyPair, RsaKeyFactory};
pub use metadata::{extract_exposed_ports, extract_user, ExecutionMetadata, ExposedPort, PortSet};
pub use recipe::{cpu_weight, RecipeBuilder, RunSpec};
pub use request::{
    validate_request, DesireRequest, EnvironmentVariable, HealthCheckType, RoutingInfo,
    SecurityGroupRule,
};
pub use routes::{CcRouteTranslator, RouteTable, RouteTranslator, SshRoute};
