//! Indexing and adaptive probing of SPARQL endpoints.
//!
//! The index of a set of endpoints is kept in a registry: for each endpoint, the predicates it
//! uses, regexes matching its subject and object URIs, its size, its status and the largest
//! result window it answers in time. [`RegistryAdmin`](admin::RegistryAdmin) is the entry point
//! for maintaining the registry.
//!
//! Usage example:
//! ```
//! use sparql_index::admin::RegistryAdmin;
//! use sparql_index::client::HttpConnector;
//! use sparql_index::engine::IndexerConfig;
//! use sparql_index::model::{EndpointStatus, EndpointType, NamedNode};
//! use sparql_index::storage::{MemRegistryStore, Registry, RegistryConfig};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = Registry::new(Arc::new(MemRegistryStore::new()), RegistryConfig::default());
//! let admin = RegistryAdmin::new(
//!     registry,
//!     Arc::new(HttpConnector::new()?),
//!     IndexerConfig::default(),
//! )?;
//!
//! let endpoint = NamedNode::new("http://example.com/sparql")?;
//! admin
//!     .add_endpoint(&endpoint, EndpointType::Standard, EndpointStatus::Ok)
//!     .await?;
//! assert_eq!(admin.endpoints().await?, vec![endpoint]);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! # }).unwrap();
//! ```

pub mod admin;

pub mod model {
    pub use sparql_index_model::*;
}

pub mod common {
    pub use sparql_index_common::*;
}

pub mod client {
    pub use sparql_index_client::*;
}

pub mod storage {
    pub use sparql_index_storage::*;
}

pub mod engine {
    pub use sparql_index_engine::*;
}
