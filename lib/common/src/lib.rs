mod endpoint;
pub mod error;
mod query;
mod registry_store;

pub use endpoint::{EndpointClient, EndpointConnector};
pub use query::{EndpointQuery, QueryForm, QueryKind, UriPosition};
pub use registry_store::RegistryStore;
pub use sparesults::QuerySolution;
