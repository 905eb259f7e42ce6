use async_trait::async_trait;
use itertools::Itertools;
use sparql_index_common::error::{EndpointError, RegistryError};
use sparql_index_common::{EndpointClient, EndpointQuery, RegistryStore};
use sparql_index_model::{NamedNode, NamedNodeRef, Subject, Term, TermRef, Triple};
use std::sync::Arc;
use std::time::Duration;

/// A [RegistryStore] backed by a remote triple store supporting SPARQL 1.1 Update.
pub struct SparqlRegistryStore {
    client: Arc<dyn EndpointClient>,
    timeout: Duration,
}

impl SparqlRegistryStore {
    pub fn new(client: Arc<dyn EndpointClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl RegistryStore for SparqlRegistryStore {
    async fn triples_for_subject(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
    ) -> Result<Vec<Triple>, RegistryError> {
        let query = EndpointQuery::GraphTriples {
            graph: graph.into_owned(),
            subject: Some(subject.into_owned()),
        };
        let triples = self.client.construct(&query, self.timeout).await?;
        Ok(triples
            .into_iter()
            .filter(|t| matches!(&t.subject, Subject::NamedNode(node) if node.as_ref() == subject))
            .collect())
    }

    async fn subjects_for(
        &self,
        graph: NamedNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<NamedNode>, RegistryError> {
        let query = EndpointQuery::GraphSubjects {
            graph: graph.into_owned(),
            predicate: predicate.into_owned(),
            object: object.map(TermRef::into_owned),
        };
        let solutions = self.client.select(&query, self.timeout).await?;
        solutions
            .iter()
            .filter_map(|solution| solution.get("s"))
            .filter(|term| !term.is_blank_node())
            .map(|term| match term {
                Term::NamedNode(node) => Ok(node.clone()),
                term => Err(RegistryError::from(EndpointError::UnexpectedResult(
                    format!("expected an IRI as subject, got {term}"),
                ))),
            })
            .collect()
    }

    async fn replace(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
        scope: Option<&[NamedNode]>,
        triples: Vec<Triple>,
    ) -> Result<(), RegistryError> {
        let update = replace_update(graph, subject, scope, &triples);
        if update.is_empty() {
            return Ok(());
        }
        Ok(self.client.update(&update).await?)
    }

    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), RegistryError> {
        Ok(self.client.update(&clear_update(graph)).await?)
    }
}

/// Renders a single update request deleting the scoped facts of `subject` and inserting `triples`.
fn replace_update(
    graph: NamedNodeRef<'_>,
    subject: NamedNodeRef<'_>,
    scope: Option<&[NamedNode]>,
    triples: &[Triple],
) -> String {
    let mut operations = Vec::new();
    match scope {
        None => operations.push(format!(
            "DELETE WHERE {{ GRAPH {graph} {{ {subject} ?p ?o }} }}"
        )),
        Some([]) => {}
        Some(scope) => {
            let values = scope.iter().join(" ");
            operations.push(format!(
                "DELETE {{ GRAPH {graph} {{ {subject} ?p ?o }} }} WHERE {{ GRAPH {graph} {{ {subject} ?p ?o }} VALUES ?p {{ {values} }} }}"
            ));
        }
    }
    if !triples.is_empty() {
        let data = triples.iter().map(|triple| format!("{triple} .")).join(" ");
        operations.push(format!("INSERT DATA {{ GRAPH {graph} {{ {data} }} }}"));
    }
    operations.join(" ;\n")
}

fn clear_update(graph: NamedNodeRef<'_>) -> String {
    format!("CLEAR SILENT GRAPH {graph}")
}
