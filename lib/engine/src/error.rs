use sparql_index_common::error::{EndpointError, RegistryError};
use sparql_index_model::NamedNode;

/// An error of an indexing run or registry maintenance pass.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IndexError {
    #[error("{endpoint} did not answer a ping")]
    Unreachable { endpoint: NamedNode },
    #[error("{endpoint} is not registered")]
    UnknownEndpoint { endpoint: NamedNode },
    #[error("{endpoint} is already registered")]
    DuplicateEndpoint { endpoint: NamedNode },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// An aggregate query returned no value or a value of the wrong type.
    #[error("invalid aggregate result: {0}")]
    InvalidAggregate(String),
    /// The fallback strategy failed too.
    #[error("every indexing strategy failed, last error: {0}")]
    StrategiesExhausted(#[source] EndpointError),
    #[error("a traversal needs at least one root resource")]
    NoRoots,
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid predicate exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// An error of the results limit prober.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// Even a single row cannot be fetched in time.
    #[error("the endpoint timed out even for the smallest probe")]
    Timeout,
    /// The endpoint has no triples to probe with.
    #[error("the endpoint returned no rows to probe with")]
    Empty,
    #[error("probing did not converge within {steps} queries")]
    StepLimit { steps: usize },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}
