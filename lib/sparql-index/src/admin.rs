//! Maintenance operations on a registry.
//!
//! Every operation that writes touches a single endpoint (or predicate) and writes only after all
//! of its queries succeeded. A failed operation leaves the registry as it was.

use futures::{stream, StreamExt};
use sparql_index_common::{EndpointClient, EndpointConnector};
use sparql_index_engine::{
    AmbiguousPredicateDetector, IndexBuilder, IndexError, IndexOutcome, IndexerConfig,
};
use sparql_index_model::{
    EndpointStatus, EndpointType, IndexRecord, NamedNode, PredicateFact, UriRegex,
};
use sparql_index_storage::Registry;
use std::sync::Arc;

/// The result of an operation run on several endpoints.
pub type EndpointResults<T> = Vec<(NamedNode, Result<T, IndexError>)>;

/// The operation surface of a registry.
///
/// The admin combines a [Registry] with an [EndpointConnector] that opens clients for the
/// registered endpoints and an [IndexBuilder] that computes their records.
#[derive(Clone)]
pub struct RegistryAdmin {
    registry: Registry,
    connector: Arc<dyn EndpointConnector>,
    builder: IndexBuilder,
}

impl RegistryAdmin {
    pub fn new(
        registry: Registry,
        connector: Arc<dyn EndpointConnector>,
        config: IndexerConfig,
    ) -> Result<Self, IndexError> {
        Ok(Self {
            registry,
            connector,
            builder: IndexBuilder::new(config)?,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &IndexerConfig {
        self.builder.config()
    }

    /// Registers an endpoint that has not been indexed yet.
    pub async fn add_endpoint(
        &self,
        endpoint: &NamedNode,
        endpoint_type: EndpointType,
        status: EndpointStatus,
    ) -> Result<(), IndexError> {
        if self.registry.contains_endpoint(endpoint.as_ref()).await? {
            return Err(IndexError::DuplicateEndpoint {
                endpoint: endpoint.clone(),
            });
        }
        self.registry
            .add_endpoint(endpoint, endpoint_type, status)
            .await?;
        tracing::info!(%endpoint, %endpoint_type, %status, "Added endpoint");
        Ok(())
    }

    /// Removes an endpoint and all of its facts.
    pub async fn remove_endpoint(&self, endpoint: &NamedNode) -> Result<(), IndexError> {
        if !self.registry.remove_endpoint(endpoint).await? {
            return Err(IndexError::UnknownEndpoint {
                endpoint: endpoint.clone(),
            });
        }
        tracing::info!(%endpoint, "Removed endpoint");
        Ok(())
    }

    /// Indexes a registered endpoint and replaces its record.
    ///
    /// Without `roots`, the strategy cascade of [IndexBuilder::index] is used. With `roots`, the
    /// endpoint is crawled from them up to `max_depth`, or the configured depth if `None`.
    pub async fn index_endpoint(
        &self,
        endpoint: &NamedNode,
        roots: &[NamedNode],
        max_depth: Option<usize>,
    ) -> Result<IndexOutcome, IndexError> {
        let record = self.registered(endpoint).await?;
        let client = self.connector.connect(endpoint)?;
        let outcome = if roots.is_empty() {
            self.builder
                .index(client.as_ref(), record.endpoint_type)
                .await?
        } else {
            self.builder
                .index_by_traversal(client.as_ref(), record.endpoint_type, roots, max_depth)
                .await?
        };
        self.registry.write_record(&outcome.record).await?;
        Ok(outcome)
    }

    /// Indexes several endpoints concurrently, at most `max_workers` at a time.
    ///
    /// A failure only affects the endpoint it happened on. The results are in completion order.
    pub async fn index_endpoints(
        &self,
        endpoints: &[NamedNode],
        roots: &[NamedNode],
        max_depth: Option<usize>,
    ) -> EndpointResults<IndexOutcome> {
        stream::iter(endpoints)
            .map(|endpoint| async move {
                let result = self.index_endpoint(endpoint, roots, max_depth).await;
                (endpoint.clone(), result)
            })
            .buffer_unordered(self.workers())
            .collect()
            .await
    }

    pub async fn set_endpoint_status(
        &self,
        endpoint: &NamedNode,
        status: EndpointStatus,
    ) -> Result<(), IndexError> {
        self.registered(endpoint).await?;
        self.registry.set_status(endpoint, status).await?;
        Ok(())
    }

    /// Pings the endpoint and records it as [EndpointStatus::Ok] or [EndpointStatus::Dead].
    pub async fn refresh_endpoint_status(
        &self,
        endpoint: &NamedNode,
    ) -> Result<EndpointStatus, IndexError> {
        self.registered(endpoint).await?;
        let alive = match self.connector.connect(endpoint) {
            Ok(client) => client.ping(self.config().query_timeout()).await,
            Err(error) => {
                tracing::warn!(%endpoint, %error, "Could not connect to endpoint");
                false
            }
        };
        let status = if alive {
            EndpointStatus::Ok
        } else {
            EndpointStatus::Dead
        };
        self.registry.set_status(endpoint, status).await?;
        tracing::info!(%endpoint, %status, "Refreshed status");
        Ok(status)
    }

    /// Refreshes the status of every registered endpoint.
    pub async fn refresh_all_statuses(&self) -> Result<EndpointResults<EndpointStatus>, IndexError> {
        let endpoints = self.registry.endpoints().await?;
        Ok(stream::iter(endpoints)
            .map(|endpoint| async move {
                let result = self.refresh_endpoint_status(&endpoint).await;
                (endpoint, result)
            })
            .buffer_unordered(self.workers())
            .collect()
            .await)
    }

    pub async fn set_results_limit(
        &self,
        endpoint: &NamedNode,
        results_limit: u64,
    ) -> Result<(), IndexError> {
        self.registered(endpoint).await?;
        self.registry
            .set_results_limit(endpoint, results_limit)
            .await?;
        Ok(())
    }

    /// Measures the results limit of the endpoint and records it.
    ///
    /// Unlike indexing, a failed measurement is an error and the recorded limit is kept.
    pub async fn refresh_results_limit(&self, endpoint: &NamedNode) -> Result<u64, IndexError> {
        self.registered(endpoint).await?;
        let client = self.reachable(endpoint).await?;
        let limit = self.builder.prober().probe(client.as_ref()).await?;
        self.registry.set_results_limit(endpoint, limit).await?;
        tracing::info!(%endpoint, limit, "Refreshed results limit");
        Ok(limit)
    }

    /// Recomputes the subject and object regexes. Other facts are untouched.
    ///
    /// Endpoints registered with limited filter support are iterated instead of being sent
    /// regex filters.
    pub async fn refresh_regexes(
        &self,
        endpoint: &NamedNode,
    ) -> Result<(Option<UriRegex>, Option<UriRegex>), IndexError> {
        let record = self.registered(endpoint).await?;
        let client = self.reachable(endpoint).await?;
        let (subject_regex, object_regex) = self
            .builder
            .regexes(client.as_ref(), record.endpoint_type)
            .await?;
        self.registry
            .set_regexes(endpoint, subject_regex.clone(), object_regex.clone())
            .await?;
        Ok((subject_regex, object_regex))
    }

    /// Classifies the recorded predicates of the endpoint and stores the classifications in the
    /// ontology graph.
    pub async fn classify_predicates(
        &self,
        endpoint: &NamedNode,
    ) -> Result<Vec<PredicateFact>, IndexError> {
        let record = self.registered(endpoint).await?;
        let client = self.connector.connect(endpoint)?;
        let facts = self
            .detector()
            .classify_all(client.as_ref(), &record.predicates)
            .await?;
        self.registry.add_predicate_facts(&facts).await?;
        tracing::info!(%endpoint, classified = facts.len(), "Classified predicates");
        Ok(facts)
    }

    /// Removes every predicate that some endpoint uses contrary to its classification.
    pub async fn remove_ambiguous_predicates(&self) -> Result<Vec<PredicateFact>, IndexError> {
        self.detector()
            .remove_ambiguous(&self.registry, self.connector.as_ref())
            .await
    }

    pub async fn clear_registry(&self) -> Result<(), IndexError> {
        self.registry.clear().await?;
        tracing::info!("Cleared registry");
        Ok(())
    }

    pub async fn record(&self, endpoint: &NamedNode) -> Result<Option<IndexRecord>, IndexError> {
        Ok(self.registry.record(endpoint).await?)
    }

    pub async fn endpoints(&self) -> Result<Vec<NamedNode>, IndexError> {
        Ok(self.registry.endpoints().await?)
    }

    pub async fn endpoints_with_predicate(
        &self,
        predicate: &NamedNode,
    ) -> Result<Vec<NamedNode>, IndexError> {
        Ok(self.registry.endpoints_with_predicate(predicate).await?)
    }

    async fn registered(&self, endpoint: &NamedNode) -> Result<IndexRecord, IndexError> {
        self.registry
            .record(endpoint)
            .await?
            .ok_or_else(|| IndexError::UnknownEndpoint {
                endpoint: endpoint.clone(),
            })
    }

    async fn reachable(
        &self,
        endpoint: &NamedNode,
    ) -> Result<Arc<dyn EndpointClient>, IndexError> {
        let client = self.connector.connect(endpoint)?;
        if client.ping(self.config().query_timeout()).await {
            Ok(client)
        } else {
            Err(IndexError::Unreachable {
                endpoint: endpoint.clone(),
            })
        }
    }

    fn detector(&self) -> AmbiguousPredicateDetector {
        AmbiguousPredicateDetector::new(self.config().query_timeout())
    }

    fn workers(&self) -> usize {
        self.config().max_workers.max(1)
    }
}
