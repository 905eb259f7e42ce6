use crate::error::IndexError;
use rustc_hash::FxHashMap;
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointConnector, EndpointQuery};
use sparql_index_model::{NamedNode, PredicateFact, PropertyKind, Term};
use sparql_index_storage::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Classifies predicates as datatype or object properties and finds predicates used as both.
#[derive(Debug, Clone)]
pub struct AmbiguousPredicateDetector {
    timeout: Duration,
}

impl AmbiguousPredicateDetector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Classifies `predicate` by the object of one of its triples. Returns `None` if the endpoint
    /// has no triple with this predicate.
    pub async fn classify(
        &self,
        client: &dyn EndpointClient,
        predicate: &NamedNode,
    ) -> Result<Option<PropertyKind>, EndpointError> {
        let query = EndpointQuery::PredicateSample {
            predicate: predicate.clone(),
        };
        let triples = client.construct(&query, self.timeout).await?;
        Ok(triples.first().map(|triple| match triple.object {
            Term::Literal(_) => PropertyKind::Datatype,
            _ => PropertyKind::Object,
        }))
    }

    /// Classifies every predicate in `predicates`. Unused predicates are skipped.
    pub async fn classify_all<'p>(
        &self,
        client: &dyn EndpointClient,
        predicates: impl IntoIterator<Item = &'p NamedNode>,
    ) -> Result<Vec<PredicateFact>, EndpointError> {
        let mut facts = Vec::new();
        for predicate in predicates {
            match self.classify(client, predicate).await? {
                Some(kind) => facts.push(PredicateFact::new(predicate.clone(), kind)),
                None => tracing::debug!(%predicate, "Predicate has no triples, not classified"),
            }
        }
        Ok(facts)
    }

    /// Returns whether the endpoint uses the predicate of `fact` with an object of the other kind.
    pub async fn conflicts(
        &self,
        client: &dyn EndpointClient,
        fact: &PredicateFact,
    ) -> Result<bool, EndpointError> {
        let query = EndpointQuery::PredicateObjects {
            predicate: fact.predicate.clone(),
            literal: fact.kind == PropertyKind::Object,
        };
        let solutions = client.select(&query, self.timeout).await?;
        Ok(!solutions.is_empty())
    }

    /// Checks every classified predicate of the registry against every endpoint exporting it.
    ///
    /// Endpoints that cannot be queried are skipped.
    pub async fn find_ambiguous(
        &self,
        registry: &Registry,
        connector: &dyn EndpointConnector,
    ) -> Result<Vec<PredicateFact>, IndexError> {
        let mut clients: FxHashMap<NamedNode, Arc<dyn EndpointClient>> = FxHashMap::default();
        let mut ambiguous = Vec::new();

        for fact in registry.predicate_facts().await? {
            for endpoint in registry.endpoints_with_predicate(&fact.predicate).await? {
                let client = match clients.get(&endpoint) {
                    Some(client) => Arc::clone(client),
                    None => match connector.connect(&endpoint) {
                        Ok(client) => {
                            clients.insert(endpoint.clone(), Arc::clone(&client));
                            client
                        }
                        Err(error) => {
                            tracing::warn!(%endpoint, %error, "Skipping endpoint");
                            continue;
                        }
                    },
                };
                match self.conflicts(client.as_ref(), &fact).await {
                    Ok(true) => {
                        tracing::info!(
                            predicate = %fact.predicate,
                            kind = %fact.kind,
                            %endpoint,
                            "Predicate is ambiguous"
                        );
                        ambiguous.push(fact.clone());
                        break;
                    }
                    Ok(false) => {}
                    Err(error) => {
                        tracing::warn!(%endpoint, predicate = %fact.predicate, %error, "Could not check predicate");
                    }
                }
            }
        }
        Ok(ambiguous)
    }

    /// Removes every ambiguous predicate from the ontology graph and returns them.
    pub async fn remove_ambiguous(
        &self,
        registry: &Registry,
        connector: &dyn EndpointConnector,
    ) -> Result<Vec<PredicateFact>, IndexError> {
        let ambiguous = self.find_ambiguous(registry, connector).await?;
        for fact in &ambiguous {
            registry.remove_predicate(&fact.predicate).await?;
        }
        Ok(ambiguous)
    }
}
