//! Error types for the recipe-building pipeline.

/// Result type alias for recipe-building operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a desire request into a run-spec.
///
/// Every variant is terminal for a single build call. The builder never
/// retries; callers decide whether to reject or resubmit the request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Request Validation Errors
    // =========================================================================
    /// The request names no container image.
    #[error("desired app '{process_guid}' has no docker image")]
    MissingImageSource { process_guid: String },

    /// The request names both a container image and a droplet.
    #[error("desired app '{process_guid}' has both a docker image and droplet '{droplet_uri}'")]
    ConflictingSources {
        process_guid: String,
        droplet_uri: String,
    },

    /// The lifecycle needed to run the app is not configured.
    #[error("no lifecycle defined for '{lifecycle}'")]
    UnknownLifecycle { lifecycle: String },

    // =========================================================================
    // Image Reference Errors
    // =========================================================================
    /// The image reference already carries a URI scheme.
    #[error("docker URI [{reference}] should not contain scheme")]
    UnexpectedScheme { reference: String },

    /// The image reference cannot be split into index and repository.
    #[error("malformed image reference '{reference}': {reason}")]
    MalformedImageReference { reference: String, reason: String },

    // =========================================================================
    // Execution Metadata Errors
    // =========================================================================
    /// The execution metadata blob did not decode.
    #[error("malformed execution metadata: {reason}")]
    MalformedMetadata { reason: String },

    /// The image declares ports, none of them tcp.
    #[error("no tcp ports found in image metadata (declared protocols: {protocols:?})")]
    NoSupportedPortsFound { protocols: Vec<String> },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Key-pair generation failed.
    #[error("failed to generate {purpose} key pair: {reason}")]
    KeyGenerationFailed { purpose: String, reason: String },

    /// Routing metadata could not be translated into route entries.
    #[error("failed to translate '{route_kind}' routes: {reason}")]
    RouteTranslationFailed { route_kind: String, reason: String },

    // =========================================================================
    // Configuration / I/O Errors
    // =========================================================================
    /// Configuration is missing or invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fieldless classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingImageSource,
    ConflictingSources,
    UnknownLifecycle,
    UnexpectedScheme,
    MalformedImageReference,
    MalformedMetadata,
    NoSupportedPortsFound,
    KeyGenerationFailed,
    RouteTranslationFailed,
    InvalidConfig,
    Io,
    Serialization,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingImageSource { .. } => ErrorKind::MissingImageSource,
            Self::ConflictingSources { .. } => ErrorKind::ConflictingSources,
            Self::UnknownLifecycle { .. } => ErrorKind::UnknownLifecycle,
            Self::UnexpectedScheme { .. } => ErrorKind::UnexpectedScheme,
            Self::MalformedImageReference { .. } => ErrorKind::MalformedImageReference,
            Self::MalformedMetadata { .. } => ErrorKind::MalformedMetadata,
            Self::NoSupportedPortsFound { .. } => ErrorKind::NoSupportedPortsFound,
            Self::KeyGenerationFailed { .. } => ErrorKind::KeyGenerationFailed,
            Self::RouteTranslationFailed { .. } => ErrorKind::RouteTranslationFailed,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Returns true if the error stems from the request itself rather than
    /// configuration or a collaborator.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingImageSource
                | ErrorKind::ConflictingSources
                | ErrorKind::UnexpectedScheme
                | ErrorKind::MalformedImageReference
                | ErrorKind::MalformedMetadata
                | ErrorKind::NoSupportedPortsFound
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
