use crate::codec::{decode_record, fact_sets, FactSet};
use sparql_index_common::error::RegistryError;
use sparql_index_common::RegistryStore;
use sparql_index_model::vocab::{rdf, registry};
use sparql_index_model::{
    EndpointStatus, EndpointType, IndexRecord, NamedNode, NamedNodeRef, PredicateFact,
    PropertyKind, Term, Triple, UriRegex,
};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_INDEX_GRAPH: &str = "https://w3id.org/sparql-index/graph/index";
pub const DEFAULT_ONTOLOGY_GRAPH: &str = "https://w3id.org/sparql-index/graph/ontology";

/// The named graphs holding the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Holds one subject per endpoint.
    pub index_graph: NamedNode,
    /// Holds one subject per classified predicate.
    pub ontology_graph: NamedNode,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_graph: NamedNode::new_unchecked(DEFAULT_INDEX_GRAPH),
            ontology_graph: NamedNode::new_unchecked(DEFAULT_ONTOLOGY_GRAPH),
        }
    }
}

/// Reads and writes index records in a [RegistryStore].
///
/// Every write touches a single subject, either the endpoint or the predicate, and is executed as a
/// single [RegistryStore::replace]. Writes for different endpoints therefore never interfere.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RegistryStore>,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(store: Arc<dyn RegistryStore>, config: RegistryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn index_graph(&self) -> NamedNodeRef<'_> {
        self.config.index_graph.as_ref()
    }

    fn ontology_graph(&self) -> NamedNodeRef<'_> {
        self.config.ontology_graph.as_ref()
    }

    /// Returns all registered endpoints.
    pub async fn endpoints(&self) -> Result<Vec<NamedNode>, RegistryError> {
        self.store
            .subjects_for(self.index_graph(), registry::ENDPOINT_STATUS, None)
            .await
    }

    pub async fn contains_endpoint(&self, endpoint: NamedNodeRef<'_>) -> Result<bool, RegistryError> {
        let triples = self
            .store
            .triples_for_subject(self.index_graph(), endpoint)
            .await?;
        Ok(triples
            .iter()
            .any(|t| t.predicate.as_ref() == registry::ENDPOINT_STATUS))
    }

    /// Reads the record of `endpoint`, or `None` if it is not registered.
    pub async fn record(&self, endpoint: &NamedNode) -> Result<Option<IndexRecord>, RegistryError> {
        let triples = self
            .store
            .triples_for_subject(self.index_graph(), endpoint.as_ref())
            .await?;
        Ok(decode_record(endpoint, &triples)?)
    }

    /// Registers a new endpoint. Only the status, the type, and an incomplete predicate list are
    /// written.
    pub async fn add_endpoint(
        &self,
        endpoint: &NamedNode,
        endpoint_type: EndpointType,
        status: EndpointStatus,
    ) -> Result<(), RegistryError> {
        self.replace_facts(
            endpoint,
            &[
                FactSet::Status(status),
                FactSet::EndpointType(endpoint_type),
                FactSet::Predicates {
                    predicates: BTreeSet::new(),
                    complete: false,
                },
            ],
        )
        .await
    }

    /// Replaces every fact of the endpoint with the facts of `record`.
    pub async fn write_record(&self, record: &IndexRecord) -> Result<(), RegistryError> {
        let triples = encode(&record.endpoint, &fact_sets(record))?;
        tracing::debug!(endpoint = %record.endpoint, facts = triples.len(), "Writing index record");
        self.store
            .replace(self.index_graph(), record.endpoint.as_ref(), None, triples)
            .await
    }

    /// Atomically replaces the given fact sets of `endpoint`. Other facts are untouched.
    pub async fn replace_facts(
        &self,
        endpoint: &NamedNode,
        facts: &[FactSet],
    ) -> Result<(), RegistryError> {
        let scope = facts
            .iter()
            .flat_map(|f| f.scope().iter().map(|p| p.into_owned()))
            .collect::<Vec<_>>();
        let triples = encode(endpoint, facts)?;
        self.store
            .replace(self.index_graph(), endpoint.as_ref(), Some(&scope), triples)
            .await
    }

    pub async fn set_status(
        &self,
        endpoint: &NamedNode,
        status: EndpointStatus,
    ) -> Result<(), RegistryError> {
        self.replace_facts(endpoint, &[FactSet::Status(status)]).await
    }

    pub async fn set_results_limit(
        &self,
        endpoint: &NamedNode,
        results_limit: u64,
    ) -> Result<(), RegistryError> {
        self.replace_facts(endpoint, &[FactSet::ResultsLimit(results_limit)])
            .await
    }

    /// Replaces both URI regexes of `endpoint`. A `None` regex is removed from the registry.
    pub async fn set_regexes(
        &self,
        endpoint: &NamedNode,
        subject_regex: Option<UriRegex>,
        object_regex: Option<UriRegex>,
    ) -> Result<(), RegistryError> {
        let scope = [
            registry::SUBJECT_REGEX,
            registry::SUBJECT_REGEX_IS_COMPLETE,
            registry::OBJECT_REGEX,
            registry::OBJECT_REGEX_IS_COMPLETE,
        ]
        .map(NamedNodeRef::into_owned);
        let facts = subject_regex
            .map(FactSet::SubjectRegex)
            .into_iter()
            .chain(object_regex.map(FactSet::ObjectRegex))
            .collect::<Vec<_>>();
        let triples = encode(endpoint, &facts)?;
        self.store
            .replace(self.index_graph(), endpoint.as_ref(), Some(&scope), triples)
            .await
    }

    /// Removes every fact whose subject is `endpoint`. Returns whether the endpoint was registered.
    pub async fn remove_endpoint(&self, endpoint: &NamedNode) -> Result<bool, RegistryError> {
        let existed = self.contains_endpoint(endpoint.as_ref()).await?;
        self.store
            .replace(self.index_graph(), endpoint.as_ref(), None, Vec::new())
            .await?;
        Ok(existed)
    }

    /// Removes all endpoints and predicate facts.
    pub async fn clear(&self) -> Result<(), RegistryError> {
        self.store.clear_graph(self.index_graph()).await?;
        self.store.clear_graph(self.ontology_graph()).await
    }

    /// Returns the endpoints that are known to contain `predicate`.
    pub async fn endpoints_with_predicate(
        &self,
        predicate: &NamedNode,
    ) -> Result<Vec<NamedNode>, RegistryError> {
        let object = Term::from(predicate.clone());
        self.store
            .subjects_for(
                self.index_graph(),
                registry::HAS_PREDICATE,
                Some(object.as_ref()),
            )
            .await
    }

    /// Returns all predicate classifications of the ontology graph.
    pub async fn predicate_facts(&self) -> Result<Vec<PredicateFact>, RegistryError> {
        let mut facts = Vec::new();
        for kind in [PropertyKind::Datatype, PropertyKind::Object] {
            let class = Term::from(kind.class().into_owned());
            let predicates = self
                .store
                .subjects_for(self.ontology_graph(), rdf::TYPE, Some(class.as_ref()))
                .await?;
            facts.extend(
                predicates
                    .into_iter()
                    .map(|predicate| PredicateFact::new(predicate, kind)),
            );
        }
        facts.sort();
        Ok(facts)
    }

    /// Stores the classification of each predicate, replacing earlier classifications.
    pub async fn add_predicate_facts(&self, facts: &[PredicateFact]) -> Result<(), RegistryError> {
        let scope = [rdf::TYPE.into_owned()];
        for fact in facts {
            let triple = Triple::new(
                fact.predicate.clone(),
                rdf::TYPE.into_owned(),
                fact.kind.class().into_owned(),
            );
            self.store
                .replace(
                    self.ontology_graph(),
                    fact.predicate.as_ref(),
                    Some(&scope),
                    vec![triple],
                )
                .await?;
        }
        Ok(())
    }

    /// Removes every fact about `predicate` from the ontology graph.
    pub async fn remove_predicate(&self, predicate: &NamedNode) -> Result<(), RegistryError> {
        self.store
            .replace(self.ontology_graph(), predicate.as_ref(), None, Vec::new())
            .await
    }
}

fn encode(endpoint: &NamedNode, facts: &[FactSet]) -> Result<Vec<Triple>, RegistryError> {
    let mut triples = Vec::new();
    for fact in facts {
        triples.extend(fact.to_triples(endpoint)?);
    }
    Ok(triples)
}
