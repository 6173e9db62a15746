//! Route table construction.
//!
//! The run-spec carries a route table: one opaque JSON entry per route kind,
//! consumed by the matching router (`cf-router`, `tcp-router`, `diego-ssh`).
//! Upstream routing metadata is translated into that table by a
//! [`RouteTranslator`]; the ssh entry is added later by the action graph
//! builder.

use crate::constants::{CC_HTTP_ROUTES, CC_TCP_ROUTES, CF_ROUTER, DIEGO_SSH, TCP_ROUTER};
use crate::error::{Error, Result};
use crate::metadata::PortSet;
use crate::request::RoutingInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Route entries keyed by route kind.
pub type RouteTable = BTreeMap<String, serde_json::Value>;

/// Maps upstream routing metadata onto a route table.
pub trait RouteTranslator: Send + Sync {
    /// Translates `routing_info` targeting `ports`.
    ///
    /// # Errors
    ///
    /// [`Error::RouteTranslationFailed`] for malformed routing metadata.
    fn translate(&self, routing_info: &RoutingInfo, ports: &PortSet) -> Result<RouteTable>;
}

/// One upstream http route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CcHttpRoute {
    pub hostname: String,
    #[serde(default)]
    pub route_service_url: Option<String>,
}

/// One upstream tcp route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CcTcpRoute {
    pub router_group_guid: String,
    pub external_port: u32,
}

/// A `cf-router` entry: hostnames sharing a route service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfRoute {
    pub hostnames: Vec<String>,
    pub port: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_service_url: Option<String>,
}

/// A `tcp-router` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpRoute {
    pub router_group_guid: String,
    pub external_port: u32,
    pub container_port: u32,
}

/// The `diego-ssh` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshRoute {
    pub container_port: u32,
    pub private_key: String,
    pub host_fingerprint: String,
}

impl SshRoute {
    /// Inserts this route into `routes` under the ssh route key.
    pub fn insert_into(&self, routes: &mut RouteTable) -> Result<()> {
        let value = serde_json::to_value(self).map_err(|e| translation_failed(DIEGO_SSH, e))?;
        routes.insert(DIEGO_SSH.to_string(), value);
        Ok(())
    }
}

/// Translator for routing metadata in the cloud controller's format.
///
/// `http_routes` and `tcp_routes` are understood; other keys are dropped.
/// All routes target the first port.
#[derive(Debug, Clone, Copy, Default)]
pub struct CcRouteTranslator;

impl RouteTranslator for CcRouteTranslator {
    fn translate(&self, routing_info: &RoutingInfo, ports: &PortSet) -> Result<RouteTable> {
        let mut routes = RouteTable::new();
        let port = ports.first();

        for (kind, payload) in routing_info {
            match kind.as_str() {
                CC_HTTP_ROUTES => {
                    let http: Vec<CcHttpRoute> = serde_json::from_value(payload.clone())
                        .map_err(|e| translation_failed(kind, e))?;
                    let cf_routes = group_http_routes(http, port);
                    let value = serde_json::to_value(cf_routes)
                        .map_err(|e| translation_failed(CF_ROUTER, e))?;
                    routes.insert(CF_ROUTER.to_string(), value);
                }
                CC_TCP_ROUTES => {
                    let tcp: Vec<CcTcpRoute> = serde_json::from_value(payload.clone())
                        .map_err(|e| translation_failed(kind, e))?;
                    let tcp_routes: Vec<TcpRoute> = tcp
                        .into_iter()
                        .map(|r| TcpRoute {
                            router_group_guid: r.router_group_guid,
                            external_port: r.external_port,
                            container_port: port,
                        })
                        .collect();
                    let value = serde_json::to_value(tcp_routes)
                        .map_err(|e| translation_failed(TCP_ROUTER, e))?;
                    routes.insert(TCP_ROUTER.to_string(), value);
                }
                other => debug!("Ignoring unknown route kind '{}'", other),
            }
        }

        Ok(routes)
    }
}

/// Groups hostnames by route service, keeping first-seen hostname order.
fn group_http_routes(http: Vec<CcHttpRoute>, port: u32) -> Vec<CfRoute> {
    let mut grouped: BTreeMap<Option<String>, Vec<String>> = BTreeMap::new();
    for route in http {
        let service = route.route_service_url.filter(|u| !u.is_empty());
        grouped.entry(service).or_default().push(route.hostname);
    }

    grouped
        .into_iter()
        .map(|(route_service_url, hostnames)| CfRoute {
            hostnames,
            port,
            route_service_url,
        })
        .collect()
}

fn translation_failed(kind: &str, err: impl std::fmt::Display) -> Error {
    Error::RouteTranslationFailed {
        route_kind: kind.to_string(),
        reason: err.to_string(),
    }
}
