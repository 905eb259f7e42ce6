//! Deterministic, in-memory stand-ins for remote SPARQL endpoints.
//!
//! A [SimulatedEndpoint] answers every [`EndpointQuery`](sparql_index_common::EndpointQuery) by
//! evaluating it over a fixed list of triples. It can emulate the behavior that makes real
//! endpoints hard to index: a row cap on every answer, timeouts beyond some offset, and failures
//! of selected query kinds. Every query is recorded so tests can assert on what was issued.

mod connector;
mod endpoint;
pub mod fixtures;

pub use connector::SimulatedConnector;
pub use endpoint::{FailureMode, SimulatedEndpoint};
