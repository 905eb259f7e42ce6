use crate::exclusion::PredicateFilter;
use crate::summarizer::UriPrefixSummarizer;
use rustc_hash::FxHashSet;
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointQuery};
use sparql_index_model::vocab::rdf;
use sparql_index_model::{NamedNode, Subject, Term};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

/// What a traversal has seen.
#[derive(Debug, Clone)]
pub struct TraversalSummary {
    pub predicates: BTreeSet<NamedNode>,
    pub subjects: UriPrefixSummarizer,
    pub objects: UriPrefixSummarizer,
    /// Number of resources whose triples were fetched.
    pub expanded: usize,
    /// Number of resources skipped because one of their types was already expanded.
    pub skipped: usize,
}

/// Crawls an endpoint breadth-first from a set of root resources.
///
/// Before a resource is expanded, its `rdf:type`s are fetched. A resource sharing a type with an
/// already expanded resource is skipped, so each type is expanded at most once. Untyped resources
/// are always expanded. Objects of expanded resources are followed until `max_depth`, roots being
/// at depth 0. The classes that are objects of `rdf:type` are not followed.
pub struct TypedBfsTraverser<'a> {
    client: &'a dyn EndpointClient,
    filter: &'a PredicateFilter,
    timeout: Duration,
    regex_max_length: usize,
}

impl<'a> TypedBfsTraverser<'a> {
    pub fn new(
        client: &'a dyn EndpointClient,
        filter: &'a PredicateFilter,
        timeout: Duration,
        regex_max_length: usize,
    ) -> Self {
        Self {
            client,
            filter,
            timeout,
            regex_max_length,
        }
    }

    /// Runs the traversal. Any failed query aborts it.
    pub async fn traverse(
        &self,
        roots: &[NamedNode],
        max_depth: usize,
    ) -> Result<TraversalSummary, EndpointError> {
        let endpoint = self.client.endpoint();
        let mut summary = TraversalSummary {
            predicates: BTreeSet::new(),
            subjects: UriPrefixSummarizer::new(self.regex_max_length),
            objects: UriPrefixSummarizer::new(self.regex_max_length),
            expanded: 0,
            skipped: 0,
        };

        let mut discovered = FxHashSet::default();
        let mut expanded_types = FxHashSet::default();
        let mut frontier = VecDeque::new();
        for root in roots {
            if discovered.insert(root.clone()) {
                frontier.push_back((root.clone(), 0));
            }
        }

        while let Some((resource, depth)) = frontier.pop_front() {
            let types = self.types_of(&resource).await?;
            if let Some(known) = types.iter().find(|t| expanded_types.contains(*t)) {
                tracing::trace!(%endpoint, %resource, class = %known, "Type already expanded");
                summary.skipped += 1;
                continue;
            }

            tracing::trace!(%endpoint, %resource, depth, "Expanding resource");
            let query = EndpointQuery::ResourceTriples {
                resource: resource.clone(),
            };
            let triples = self.client.construct(&query, self.timeout).await?;
            summary.expanded += 1;
            expanded_types.extend(types);

            for triple in triples {
                if let Subject::NamedNode(subject) = &triple.subject {
                    summary.subjects.add_uri(subject.as_str());
                }
                if self.filter.allows(triple.predicate.as_ref()) {
                    summary.predicates.insert(triple.predicate.clone());
                }
                let Term::NamedNode(object) = triple.object else {
                    continue;
                };
                summary.objects.add_uri(object.as_str());

                if triple.predicate == rdf::TYPE {
                    expanded_types.insert(object);
                } else if depth < max_depth && discovered.insert(object.clone()) {
                    frontier.push_back((object, depth + 1));
                }
            }
        }

        tracing::info!(
            %endpoint,
            expanded = summary.expanded,
            skipped = summary.skipped,
            predicates = summary.predicates.len(),
            "Traversal finished"
        );
        Ok(summary)
    }

    async fn types_of(&self, resource: &NamedNode) -> Result<Vec<NamedNode>, EndpointError> {
        let query = EndpointQuery::ResourceTypes {
            resource: resource.clone(),
        };
        let solutions = self.client.select(&query, self.timeout).await?;
        Ok(solutions
            .iter()
            .filter_map(|solution| match solution.get("type") {
                Some(Term::NamedNode(class)) => Some(class.clone()),
                _ => None,
            })
            .collect())
    }
}
