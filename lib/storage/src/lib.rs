//! Persistence of index records.
//!
//! The [Registry] maps [`IndexRecord`](sparql_index_model::IndexRecord)s and
//! [`PredicateFact`](sparql_index_model::PredicateFact)s to RDF facts in two named graphs of a
//! [`RegistryStore`](sparql_index_common::RegistryStore). Two stores are provided: an in-memory
//! store that can be loaded from and dumped to a file, and a store that forwards to a remote
//! SPARQL endpoint.

mod codec;
mod memory;
mod registry;
mod sparql;

pub use codec::FactSet;
pub use memory::MemRegistryStore;
pub use registry::{Registry, RegistryConfig, DEFAULT_INDEX_GRAPH, DEFAULT_ONTOLOGY_GRAPH};
pub use sparql::SparqlRegistryStore;
