//! # Action Graph
//!
//! The executable part of a run-spec is three trees of [`Action`]s that a
//! downstream executor runs inside the container:
//!
//! ```text
//! setup    Sequential ─► Download lifecycle → /tmp/lifecycle
//!
//! action   Concurrent ─┬► Run launcher app <start-command> <metadata>
//!                      └► Run diego-sshd ...            (ssh only)
//!
//! monitor  BoundedWait(30s) ─► Parallel ─┬► Run healthcheck -port=<p1>
//!                                        └► Run healthcheck -port=<pN>
//! ```
//!
//! ## Composition Semantics
//!
//! | Variant | Executor contract |
//! |---------|-------------------|
//! | `Sequential` | Children run in order; each must succeed before the next |
//! | `Concurrent` | Children run together; when any exits the group is torn down |
//! | `Parallel` | Children run together; the group ends when all have ended |
//! | `BoundedWait` | Child must succeed within the duration, each round |
//!
//! The builder only describes these semantics; nothing here executes.

use crate::constants::{
    APP_LOG_SOURCE, DEFAULT_FILE_DESCRIPTOR_LIMIT, DEFAULT_SSH_PORT, DOCKER_LIFECYCLE,
    HEALTHCHECK_FILE_DESCRIPTOR_LIMIT, HEALTHCHECK_PATH, HEALTH_LOG_SOURCE, LAUNCHER_PATH,
    LIFECYCLE_DIR, MONITOR_TIMEOUT, PORT_ENV_VAR, SSHD_PATH, SSH_KEY_BITS,
};
use crate::error::{Error, Result};
use crate::keys::KeyFactory;
use crate::metadata::PortSet;
use crate::request::{DesireRequest, EnvironmentVariable};
use crate::routes::{RouteTable, SshRoute};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

// =============================================================================
// Action Types
// =============================================================================

/// Per-process resource limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Open file-descriptor ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

/// Downloads and extracts an artifact into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    pub cache_key: String,
    pub user: String,
}

/// Runs a process in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub user: String,
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

/// A node of the action tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Download(DownloadAction),
    Run(RunAction),
    #[serde(rename = "serial")]
    Sequential { actions: Vec<Action> },
    #[serde(rename = "codependent")]
    Concurrent { actions: Vec<Action> },
    Parallel { actions: Vec<Action> },
    #[serde(rename = "timeout")]
    BoundedWait {
        action: Box<Action>,
        #[serde(rename = "timeout_ms", with = "duration_ms")]
        timeout: Duration,
    },
}

impl Action {
    pub fn sequential(actions: Vec<Action>) -> Self {
        Self::Sequential { actions }
    }

    pub fn concurrent(actions: Vec<Action>) -> Self {
        Self::Concurrent { actions }
    }

    pub fn parallel(actions: Vec<Action>) -> Self {
        Self::Parallel { actions }
    }

    pub fn bounded_wait(action: Action, timeout: Duration) -> Self {
        Self::BoundedWait {
            action: Box::new(action),
            timeout,
        }
    }

    /// Direct children of a composite action; empty for leaves.
    pub fn children(&self) -> &[Action] {
        match self {
            Self::Download(_) | Self::Run(_) => &[],
            Self::Sequential { actions }
            | Self::Concurrent { actions }
            | Self::Parallel { actions } => actions,
            Self::BoundedWait { action, .. } => std::slice::from_ref(action.as_ref()),
        }
    }

    /// All run actions in the tree, depth first.
    pub fn runs(&self) -> Vec<&RunAction> {
        let mut out = Vec::new();
        self.visit(&mut |a| {
            if let Self::Run(run) = a {
                out.push(run);
            }
        });
        out
    }

    /// All download actions in the tree, depth first.
    pub fn downloads(&self) -> Vec<&DownloadAction> {
        let mut out = Vec::new();
        self.visit(&mut |a| {
            if let Self::Download(download) = a {
                out.push(download);
            }
        });
        out
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Action)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

// =============================================================================
// Graph Builder
// =============================================================================

/// The three action roots of a run-spec plus the final port list.
#[derive(Debug, Clone)]
pub struct ActionGraph {
    pub setup: Action,
    pub action: Action,
    pub monitor: Option<Action>,
    /// App ports, with the ssh port appended when ssh is enabled.
    pub ports: PortSet,
}

/// Builds the setup, run, and monitor trees for one request.
pub struct ActionGraphBuilder<'a> {
    lifecycle_url: &'a str,
    key_factory: &'a dyn KeyFactory,
}

impl<'a> ActionGraphBuilder<'a> {
    pub fn new(lifecycle_url: &'a str, key_factory: &'a dyn KeyFactory) -> Self {
        Self {
            lifecycle_url,
            key_factory,
        }
    }

    /// Builds the action graph.
    ///
    /// When the request allows ssh, the ssh route is inserted into `routes`
    /// and the ssh port is appended to the returned port list.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyGenerationFailed`] if either key pair cannot be made
    /// - [`Error::RouteTranslationFailed`] if the ssh route cannot be encoded
    pub fn build(
        &self,
        request: &DesireRequest,
        user: &str,
        mut ports: PortSet,
        routes: &mut RouteTable,
    ) -> Result<ActionGraph> {
        let setup = Action::sequential(vec![self.lifecycle_download(user)]);

        let monitor = request
            .health_check_type
            .wants_port_monitor()
            .then(|| monitor_action(&ports, user));

        let nofile = if request.file_descriptors != 0 {
            request.file_descriptors
        } else {
            DEFAULT_FILE_DESCRIPTOR_LIMIT
        };
        let env = app_env(&request.environment, ports.first());

        let mut actions = vec![Action::Run(RunAction {
            user: user.to_string(),
            path: LAUNCHER_PATH.to_string(),
            args: vec![
                "app".to_string(),
                request.start_command.clone(),
                request.execution_metadata.clone(),
            ],
            env: env.clone(),
            resource_limits: ResourceLimits {
                nofile: Some(nofile),
            },
            log_source: Some(APP_LOG_SOURCE.to_string()),
        })];

        if request.allow_ssh {
            let host_key = self.key_factory.new_key_pair(SSH_KEY_BITS).map_err(|e| {
                error!("new-host-key-pair-failed: {}", e);
                with_purpose(e, "host")
            })?;
            let user_key = self.key_factory.new_key_pair(SSH_KEY_BITS).map_err(|e| {
                error!("new-user-key-pair-failed: {}", e);
                with_purpose(e, "user")
            })?;

            actions.push(Action::Run(RunAction {
                user: user.to_string(),
                path: SSHD_PATH.to_string(),
                args: vec![
                    format!("-address=0.0.0.0:{}", DEFAULT_SSH_PORT),
                    format!("-hostKey={}", host_key.private_key_pem()),
                    format!("-authorizedKey={}", user_key.authorized_key()),
                    "-inheritDaemonEnv".to_string(),
                    "-logLevel=fatal".to_string(),
                ],
                env,
                resource_limits: ResourceLimits {
                    nofile: Some(nofile),
                },
                log_source: None,
            }));

            SshRoute {
                container_port: DEFAULT_SSH_PORT,
                private_key: user_key.private_key_pem().to_string(),
                host_fingerprint: host_key.fingerprint().to_string(),
            }
            .insert_into(routes)
            .inspect_err(|e| error!("marshaling-ssh-route-failed: {}", e))?;

            ports.push(DEFAULT_SSH_PORT);
            debug!("Added ssh side-channel on port {}", DEFAULT_SSH_PORT);
        }

        Ok(ActionGraph {
            setup,
            action: Action::concurrent(actions),
            monitor,
            ports,
        })
    }

    fn lifecycle_download(&self, user: &str) -> Action {
        Action::Download(DownloadAction {
            from: self.lifecycle_url.to_string(),
            to: LIFECYCLE_DIR.to_string(),
            cache_key: lifecycle_cache_key(DOCKER_LIFECYCLE),
            user: user.to_string(),
        })
    }
}

/// Filesystem-safe cache key for a lifecycle name.
pub fn lifecycle_cache_key(lifecycle: &str) -> String {
    format!("{}-lifecycle", lifecycle.replace('/', "-"))
}

/// Request environment plus `PORT`.
fn app_env(env: &[EnvironmentVariable], port: u32) -> Vec<EnvironmentVariable> {
    let mut env = env.to_vec();
    env.push(EnvironmentVariable::new(PORT_ENV_VAR, port.to_string()));
    env
}

/// Probes every port in parallel, bounded by [`MONITOR_TIMEOUT`].
fn monitor_action(ports: &PortSet, user: &str) -> Action {
    let probes = ports
        .iter()
        .map(|port| {
            Action::Run(RunAction {
                user: user.to_string(),
                path: HEALTHCHECK_PATH.to_string(),
                args: vec![format!("-port={}", port)],
                env: Vec::new(),
                resource_limits: ResourceLimits {
                    nofile: Some(HEALTHCHECK_FILE_DESCRIPTOR_LIMIT),
                },
                log_source: Some(HEALTH_LOG_SOURCE.to_string()),
            })
        })
        .collect();

    Action::bounded_wait(Action::parallel(probes), MONITOR_TIMEOUT)
}

fn with_purpose(err: Error, purpose: &str) -> Error {
    match err {
        Error::KeyGenerationFailed { reason, .. } => Error::KeyGenerationFailed {
            purpose: purpose.to_string(),
            reason,
        },
        other => Error::KeyGenerationFailed {
            purpose: purpose.to_string(),
            reason: other.to_string(),
        },
    }
}
