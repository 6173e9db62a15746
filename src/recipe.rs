//! # Recipe Assembly
//!
//! [`RecipeBuilder`] is the entry point of the crate. It runs one request
//! through every stage and stitches the results into a [`RunSpec`]:
//!
//! ```text
//! DesireRequest
//!   │ validate_request ──────────────► MissingImageSource / ConflictingSources / UnknownLifecycle
//!   │ normalize_image_reference ─────► root_fs            (UnexpectedScheme / MalformedImageReference)
//!   │ ExecutionMetadata::parse ──────► user, ports        (MalformedMetadata / NoSupportedPortsFound)
//!   │ RouteTranslator::translate ────► routes             (RouteTranslationFailed)
//!   │ ActionGraphBuilder::build ─────► setup/action/monitor, ssh route + port
//!   ▼                                                     (KeyGenerationFailed)
//! RunSpec
//! ```
//!
//! Errors from any stage are returned unchanged; the build is a pure
//! function of the request apart from key generation.

use crate::action::{Action, ActionGraphBuilder};
use crate::config::{lifecycle_download_url, Config};
use crate::constants::{APP_LRP_DOMAIN, LRP_LOG_SOURCE, MAX_CPU_PROXY, MIN_CPU_PROXY};
use crate::error::Result;
use crate::image::ImageReference;
use crate::keys::{KeyFactory, RsaKeyFactory};
use crate::metadata::{extract_exposed_ports, extract_user, ExecutionMetadata, PortSet};
use crate::request::{validate_request, DesireRequest, EnvironmentVariable, SecurityGroupRule};
use crate::routes::{CcRouteTranslator, RouteTable, RouteTranslator};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span};

/// Executable container specification handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSpec {
    pub process_guid: String,
    pub domain: String,
    pub instances: u32,
    pub routes: RouteTable,
    /// Echo of the request's change token.
    pub annotation: String,
    pub cpu_weight: u32,
    pub memory_mb: u32,
    pub disk_mb: u32,
    pub ports: Vec<u32>,
    /// Canonical `docker://` image URI.
    pub root_fs: String,
    pub privileged: bool,
    pub log_guid: String,
    pub log_source: String,
    pub metrics_guid: String,
    pub environment_variables: Vec<EnvironmentVariable>,
    pub setup: Option<Action>,
    pub action: Option<Action>,
    pub monitor: Option<Action>,
    /// Seconds the executor waits for the monitor to first pass.
    pub start_timeout: u32,
    pub egress_rules: Vec<SecurityGroupRule>,
}

/// Builds run-specs for container-image apps.
pub struct RecipeBuilder {
    config: Config,
    key_factory: Arc<dyn KeyFactory>,
    route_translator: Arc<dyn RouteTranslator>,
}

impl RecipeBuilder {
    /// Creates a builder with RSA key generation and cloud-controller route
    /// translation.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            key_factory: Arc::new(RsaKeyFactory::default()),
            route_translator: Arc::new(CcRouteTranslator),
        }
    }

    pub fn with_key_factory(mut self, key_factory: Arc<dyn KeyFactory>) -> Self {
        self.key_factory = key_factory;
        self
    }

    pub fn with_route_translator(mut self, route_translator: Arc<dyn RouteTranslator>) -> Self {
        self.route_translator = route_translator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the run-spec for a request.
    ///
    /// # Errors
    ///
    /// Any [`Error`](crate::Error) raised by a stage, unchanged.
    pub fn build(&self, request: &DesireRequest) -> Result<RunSpec> {
        let span = info_span!("message-builder", process_guid = %request.process_guid);
        let _guard = span.enter();

        let lifecycle_path = validate_request(request, &self.config)?;
        let lifecycle_url = lifecycle_download_url(lifecycle_path, &self.config.file_server_url);

        let root_fs = ImageReference::parse(&request.docker_image_url)
            .inspect_err(|e| error!(docker_image = %request.docker_image_url, "invalid-docker-image: {}", e))?
            .to_uri();
        debug!("Resolved root filesystem {}", root_fs);

        let metadata = ExecutionMetadata::parse(&request.execution_metadata)?;
        let user = extract_user(&metadata);
        let ports = extract_exposed_ports(&metadata)?;

        let mut routes = self
            .route_translator
            .translate(&request.routing_info, &ports)
            .inspect_err(|e| error!("marshaling-cc-route-info-failed: {}", e))?;

        let graph = ActionGraphBuilder::new(&lifecycle_url, self.key_factory.as_ref())
            .build(request, &user, ports, &mut routes)?;

        info!(
            ports = ?graph.ports.as_slice(),
            ssh = request.allow_ssh,
            "Built run-spec for {}", request.process_guid
        );

        Ok(RunSpec {
            process_guid: request.process_guid.clone(),
            domain: APP_LRP_DOMAIN.to_string(),
            instances: request.num_instances,
            routes,
            annotation: request.etag.clone(),
            cpu_weight: cpu_weight(request.memory_mb),
            memory_mb: request.memory_mb,
            disk_mb: request.disk_mb,
            ports: graph.ports.into_vec(),
            root_fs,
            privileged: false,
            log_guid: request.log_guid.clone(),
            log_source: LRP_LOG_SOURCE.to_string(),
            metrics_guid: request.log_guid.clone(),
            environment_variables: Vec::new(),
            setup: Some(graph.setup),
            action: Some(graph.action),
            monitor: graph.monitor,
            start_timeout: request.health_check_timeout_in_seconds,
            egress_rules: request.egress_rules.clone(),
        })
    }

    /// Returns the ports a request's image exposes, without building.
    pub fn extract_exposed_ports(&self, request: &DesireRequest) -> Result<PortSet> {
        let metadata = ExecutionMetadata::parse(&request.execution_metadata)?;
        extract_exposed_ports(&metadata)
    }
}

/// Relative CPU share derived from the memory quota, in `1..=100`.
pub fn cpu_weight(memory_mb: u32) -> u32 {
    if memory_mb > MAX_CPU_PROXY {
        return 100;
    }
    if memory_mb < MIN_CPU_PROXY {
        return 1;
    }
    99 * (memory_mb - MIN_CPU_PROXY) / (MAX_CPU_PROXY - MIN_CPU_PROXY) + 1
}
