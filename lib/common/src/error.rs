use std::error::Error;
use std::io;
use std::time::Duration;

/// An error raised while talking to a SPARQL endpoint.
///
/// Timeouts are kept apart from every other failure because they are the main signal that drives
/// strategy escalation and result-limit probing. Permission failures are kept apart so that a
/// rejected update is never mistaken for an unreachable endpoint.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EndpointError {
    /// The client-side deadline elapsed or the endpoint (or a gateway) reported a timeout.
    #[error("the endpoint did not answer within {}", display_timeout(*.0))]
    Timeout(Option<Duration>),
    /// Any other unsuccessful HTTP status.
    #[error("the endpoint answered with HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// The endpoint refused the request for lack of permissions.
    #[error("the endpoint denied access (HTTP status {status})")]
    Access { status: u16 },
    /// Connection-level failure (DNS, TLS, refused connection...).
    #[error("could not reach the endpoint: {0}")]
    Transport(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// The response body is not a valid serialization.
    #[error("invalid response: {0}")]
    ResultsParse(#[source] Box<dyn Error + Send + Sync + 'static>),
    #[error("unsupported response format '{0}'")]
    UnsupportedFormat(String),
    /// The response is well-formed but does not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResult(String),
}

fn display_timeout(timeout: Option<Duration>) -> String {
    match timeout {
        Some(timeout) => format!("{timeout:?}"),
        None => "its own time limit".to_owned(),
    }
}

impl EndpointError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::Access { .. })
    }
}

/// An error related to reading or writing the registry.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The registry is backed by a remote store that failed.
    #[error(transparent)]
    Endpoint(EndpointError),
    /// The registry store rejected a write.
    #[error("the registry store rejected the update (HTTP status {status})")]
    AccessDenied { status: u16 },
    /// Error related to data corruption.
    #[error(transparent)]
    Corruption(#[from] CorruptionError),
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A serialized registry could not be parsed.
    #[error("could not parse the registry: {0}")]
    Parse(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl From<EndpointError> for RegistryError {
    #[inline]
    fn from(error: EndpointError) -> Self {
        match error {
            EndpointError::Access { status } => Self::AccessDenied { status },
            error => Self::Endpoint(error),
        }
    }
}

/// An error return if some content in the registry is corrupted.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CorruptionError(#[from] CorruptionErrorKind);

/// An error return if some content in the registry is corrupted.
#[derive(Debug, thiserror::Error)]
enum CorruptionErrorKind {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl CorruptionError {
    /// Wraps another error.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(CorruptionErrorKind::Other(error.into()))
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(CorruptionErrorKind::Msg(msg.into()))
    }
}

impl From<CorruptionError> for io::Error {
    #[inline]
    fn from(error: CorruptionError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}
