//! Builder configuration.
//!
//! The configuration names where lifecycle tarballs live and the file server
//! that serves them. It is loaded from YAML (or JSON, which YAML accepts):
//!
//! ```yaml
//! file_server_url: http://file-server.service.cf.internal:8080
//! lifecycles:
//!   docker: docker_app_lifecycle/docker_app_lifecycle.tgz
//! ```

use crate::constants::{FILE_SERVER_STATIC_PATH, MAX_CONFIG_SIZE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Recipe builder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Lifecycle name to download path (relative to the file server, or an
    /// absolute URL).
    #[serde(default)]
    pub lifecycles: HashMap<String, String>,
    /// Base URL of the file server.
    pub file_server_url: String,
}

impl Config {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// - Size exceeds `MAX_CONFIG_SIZE`
    /// - Parsing fails
    /// - [`Config::validate`] fails
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        if yaml.len() > MAX_CONFIG_SIZE {
            return Err(Error::InvalidConfig(format!(
                "config size {} exceeds limit of {}",
                yaml.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let config: Self =
            serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        debug!("Loaded config from {}", path.display());
        Self::from_yaml(&data)
    }

    /// Checks that the file server URL is usable and no lifecycle path is empty.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.file_server_url).map_err(|e| {
            Error::InvalidConfig(format!(
                "file_server_url '{}' is not a URL: {}",
                self.file_server_url, e
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "file_server_url '{}' must use http or https",
                self.file_server_url
            )));
        }

        if let Some((name, _)) = self.lifecycles.iter().find(|(_, p)| p.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "lifecycle '{}' has an empty path",
                name
            )));
        }

        Ok(())
    }

    /// Returns the download URL for a lifecycle, if configured.
    pub fn lifecycle_url(&self, lifecycle: &str) -> Option<String> {
        self.lifecycles
            .get(lifecycle)
            .map(|path| lifecycle_download_url(path, &self.file_server_url))
    }
}

/// Resolves a lifecycle path against the file server's static route.
///
/// Absolute URLs are returned unchanged.
pub fn lifecycle_download_url(lifecycle_path: &str, file_server_url: &str) -> String {
    if lifecycle_path.contains("://") {
        return lifecycle_path.to_string();
    }

    let mut out = file_server_url.trim_end_matches('/').to_string();
    for part in [FILE_SERVER_STATIC_PATH, lifecycle_path] {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            out.push('/');
            out.push_str(part);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_joins_static_path() {
        assert_eq!(
            lifecycle_download_url("docker/lifecycle.tgz", "http://fs.example.com:8080"),
            "http://fs.example.com:8080/v1/static/docker/lifecycle.tgz"
        );
    }

    #[test]
    fn download_url_collapses_slashes() {
        assert_eq!(
            lifecycle_download_url("/docker/lifecycle.tgz", "http://fs.example.com/"),
            "http://fs.example.com/v1/static/docker/lifecycle.tgz"
        );
    }

    #[test]
    fn download_url_keeps_absolute_urls() {
        assert_eq!(
            lifecycle_download_url("https://cdn.example.com/l.tgz", "http://fs"),
            "https://cdn.example.com/l.tgz"
        );
    }
}
