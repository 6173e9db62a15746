//! # Image Reference Canonicalization
//!
//! Converts a user-supplied container image reference (`nginx:1.25`,
//! `myregistry.com:5000/foo/bar:1.0`) into the canonical `docker://` URI the
//! executor uses as the container root filesystem locator.
//!
//! ## Parsing Rules
//!
//! The rules follow the legacy Docker registry convention:
//!
//! | Input | Index | Repository | Tag |
//! |-------|-------|------------|-----|
//! | `ubuntu` | | `library/ubuntu` | |
//! | `ubuntu:14.04` | | `library/ubuntu` | `14.04` |
//! | `cloudfoundry/lattice-app` | | `cloudfoundry/lattice-app` | |
//! | `docker.io/library/nginx` | `docker.io` | `library/nginx` | |
//! | `localhost/foo` | `localhost` | `foo` | |
//! | `myregistry.com:5000/foo/bar:1.0` | `myregistry.com:5000` | `foo/bar` | `1.0` |
//!
//! The first path segment names a private index only if it contains a `.` or
//! `:`, or is exactly `localhost`. Anything else is a namespace on the
//! official index.
//!
//! ## Canonical Form
//!
//! ```text
//! docker://<index>/<repository>#<tag>
//! ```
//!
//! The index is empty for the official index (giving `docker:///...`) and
//! the fragment is omitted when there is no tag. Characters outside the URL
//! path and fragment sets are percent-escaped, so references within the
//! usual `[a-z0-9._/-]` charset appear verbatim.

use crate::constants::{DEFAULT_NAMESPACE, DOCKER_INDEX_SERVER, DOCKER_SCHEME, MAX_IMAGE_REF_LEN};
use crate::error::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt;

/// Escaped in the repository path.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Escaped in the tag fragment.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// A parsed, canonical image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry host (and port). Empty means the official index.
    pub index: String,
    /// Repository path, always containing at least one `/` on the official
    /// index.
    pub repository: String,
    /// Tag, empty when absent.
    pub tag: String,
}

impl ImageReference {
    /// Parses a raw image reference.
    ///
    /// See [`normalize_image_reference`].
    pub fn parse(reference: &str) -> Result<Self> {
        if reference.contains("://") {
            return Err(Error::UnexpectedScheme {
                reference: reference.to_string(),
            });
        }
        if reference.is_empty() {
            return Err(malformed(reference, "empty image reference"));
        }
        if reference.len() > MAX_IMAGE_REF_LEN {
            return Err(malformed(
                reference,
                &format!("exceeds maximum length of {} bytes", MAX_IMAGE_REF_LEN),
            ));
        }

        let (first, rest) = match reference.split_once('/') {
            Some((first, rest)) => (first, Some(rest)),
            None => (reference, None),
        };

        let (index, remote) = if is_official_registry(first, rest) {
            let (index, remote) = match rest {
                Some(rest) if first == DOCKER_INDEX_SERVER => (DOCKER_INDEX_SERVER, rest),
                _ => ("", reference),
            };
            if remote.is_empty() {
                return Err(malformed(reference, "missing repository"));
            }
            let remote = if remote.contains('/') {
                remote.to_string()
            } else {
                format!("{}/{}", DEFAULT_NAMESPACE, remote)
            };
            (index.to_string(), remote)
        } else {
            let rest = rest
                .filter(|r| !r.is_empty())
                .ok_or_else(|| malformed(reference, "missing repository after index"))?;
            (first.to_string(), rest.to_string())
        };

        let (repository, tag) = split_tag(&remote);

        Ok(Self {
            index,
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Reads a canonical `docker://` URI back into its parts.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedImageReference`] if the URI does not parse or uses a
    /// different scheme.
    pub fn from_canonical(uri: &str) -> Result<Self> {
        let parsed = url::Url::parse(uri).map_err(|e| malformed(uri, &e.to_string()))?;
        if parsed.scheme() != DOCKER_SCHEME {
            return Err(malformed(uri, "not a docker URI"));
        }

        let mut index = parsed.host_str().unwrap_or_default().to_string();
        if let Some(port) = parsed.port() {
            index = format!("{}:{}", index, port);
        }

        let repository = unescape(uri, parsed.path().trim_start_matches('/'))?;
        if repository.is_empty() {
            return Err(malformed(uri, "missing repository"));
        }

        Ok(Self {
            index,
            repository,
            tag: unescape(uri, parsed.fragment().unwrap_or_default())?,
        })
    }

    /// Returns true if this reference lives on the official index.
    pub fn is_official(&self) -> bool {
        self.index.is_empty() || self.index == DOCKER_INDEX_SERVER
    }

    /// Returns the reference in `index/repository:tag` form.
    pub fn image_name(&self) -> String {
        let mut name = if self.index.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", self.index, self.repository)
        };
        if !self.tag.is_empty() {
            name.push(':');
            name.push_str(&self.tag);
        }
        name
    }

    /// Returns the canonical `docker://` URI.
    pub fn to_uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/{}",
            DOCKER_SCHEME,
            self.index,
            utf8_percent_encode(&self.repository, PATH)
        )?;
        if !self.tag.is_empty() {
            write!(f, "#{}", utf8_percent_encode(&self.tag, FRAGMENT))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ImageReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Converts a raw image reference into its canonical `docker://` URI.
///
/// # Errors
///
/// - [`Error::UnexpectedScheme`] if the reference already has a scheme
/// - [`Error::MalformedImageReference`] if no repository can be found
pub fn normalize_image_reference(reference: &str) -> Result<String> {
    ImageReference::parse(reference).map(|r| r.to_uri())
}

/// Official-index test on the first path segment.
///
/// A single segment is always official. Otherwise the segment is official if
/// it is the default index host, or looks like neither a hostname nor a
/// host:port and is not `localhost`.
fn is_official_registry(first: &str, rest: Option<&str>) -> bool {
    rest.is_none()
        || first == DOCKER_INDEX_SERVER
        || (!first.contains('.') && !first.contains(':') && first != "localhost")
}

/// Splits a trailing `:tag` off a repository path.
///
/// A `/` after the last `:` means the colon belonged to a host:port.
fn split_tag(remote: &str) -> (&str, &str) {
    match remote.rfind(':') {
        Some(n) if !remote[n + 1..].contains('/') => (&remote[..n], &remote[n + 1..]),
        _ => (remote, ""),
    }
}

fn unescape(uri: &str, part: &str) -> Result<String> {
    percent_decode_str(part)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| malformed(uri, &e.to_string()))
}

fn malformed(reference: &str, reason: &str) -> Error {
    Error::MalformedImageReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}
