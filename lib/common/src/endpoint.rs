use crate::error::EndpointError;
use crate::query::EndpointQuery;
use async_trait::async_trait;
use sparesults::QuerySolution;
use sparql_index_model::{NamedNode, NamedNodeRef, Triple};
use std::sync::Arc;
use std::time::Duration;

/// A connection to a single SPARQL endpoint.
///
/// Implementations must report every timeout, client-side or server-side, as
/// [EndpointError::Timeout] and every permission failure as [EndpointError::Access].
#[async_trait]
pub trait EndpointClient: Send + Sync {
    /// Returns the IRI of the endpoint this client talks to.
    fn endpoint(&self) -> NamedNodeRef<'_>;

    /// Evaluates a query of the [`Select`](crate::QueryForm::Select) form.
    async fn select(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<QuerySolution>, EndpointError>;

    /// Evaluates a query of the [`Construct`](crate::QueryForm::Construct) form.
    async fn construct(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<Triple>, EndpointError>;

    /// Executes a SPARQL update.
    async fn update(&self, update: &str) -> Result<(), EndpointError>;

    /// Returns whether the endpoint answers a trivial query within `timeout`.
    async fn ping(&self, timeout: Duration) -> bool {
        self.select(&EndpointQuery::Ping, timeout).await.is_ok()
    }
}

/// Creates [EndpointClient]s for endpoint IRIs.
pub trait EndpointConnector: Send + Sync {
    fn connect(&self, endpoint: &NamedNode) -> Result<Arc<dyn EndpointClient>, EndpointError>;
}
