use crate::config::IndexerConfig;
use crate::error::{IndexError, ProbeError};
use crate::exclusion::PredicateFilter;
use crate::iteration::TripleIterator;
use crate::prober::ResultLimitProber;
use crate::summarizer::{AddOutcome, UriPrefixSummarizer};
use crate::traversal::TypedBfsTraverser;
use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointQuery, UriPosition};
use sparql_index_model::{
    EndpointStatus, EndpointType, IndexRecord, NamedNode, OffsetDateTime, Subject, Term,
    TripleCount, UriRegex,
};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// How the facts of an index record were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexStrategy {
    /// Aggregate and filter queries.
    Query,
    /// Paging through every triple.
    Iteration,
    /// Breadth-first crawl from root resources.
    Traversal,
}

impl Display for IndexStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Iteration => f.write_str("iteration"),
            Self::Traversal => f.write_str("traversal"),
        }
    }
}

/// The states of an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingState {
    NotIndexed,
    IndexingByQuery,
    IndexingByIteration,
    IndexingByTraversal,
    Indexed(IndexStrategy),
    Failed,
}

/// The result of a successful indexing run.
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub record: IndexRecord,
    pub strategy: IndexStrategy,
    /// The states the run went through, from [IndexingState::NotIndexed] to
    /// [IndexingState::Indexed].
    pub states: Vec<IndexingState>,
}

/// The facts produced by one strategy.
struct Facts {
    predicates: BTreeSet<NamedNode>,
    predicate_list_complete: bool,
    subject_regex: Option<UriRegex>,
    object_regex: Option<UriRegex>,
    triple_count: Option<TripleCount>,
}

/// Tracks and logs the state of a run.
struct Run<'a> {
    endpoint: &'a NamedNode,
    states: Vec<IndexingState>,
}

impl<'a> Run<'a> {
    fn new(endpoint: &'a NamedNode) -> Self {
        Self {
            endpoint,
            states: vec![IndexingState::NotIndexed],
        }
    }

    fn enter(&mut self, state: IndexingState) {
        tracing::debug!(endpoint = %self.endpoint, ?state, "Indexing state changed");
        self.states.push(state);
    }

    fn fail(&mut self, error: IndexError) -> IndexError {
        self.enter(IndexingState::Failed);
        tracing::warn!(endpoint = %self.endpoint, %error, "Indexing failed");
        error
    }
}

/// Builds index records for endpoints.
///
/// The builder never writes to the registry. A failed run yields an error and no record, so
/// the caller cannot commit partial facts.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexerConfig,
    filter: PredicateFilter,
}

impl IndexBuilder {
    pub fn new(config: IndexerConfig) -> Result<Self, IndexError> {
        let filter = PredicateFilter::new(&config.excluded_predicates)?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn filter(&self) -> &PredicateFilter {
        &self.filter
    }

    pub fn prober(&self) -> ResultLimitProber {
        ResultLimitProber::from_config(&self.config)
    }

    /// Indexes an endpoint with the automatic strategy cascade.
    ///
    /// Endpoints of a type supporting regex filters are indexed by queries first. If that fails,
    /// iteration is used and the endpoint is marked [`EndpointStatus::Slow`]. Other endpoints are
    /// indexed by iteration right away.
    pub async fn index(
        &self,
        client: &dyn EndpointClient,
        endpoint_type: EndpointType,
    ) -> Result<IndexOutcome, IndexError> {
        let endpoint = client.endpoint().into_owned();
        let mut run = Run::new(&endpoint);
        self.ping(client, &mut run).await?;

        let mut status = EndpointStatus::Ok;
        let mut facts = None;
        if endpoint_type.supports_regex_filter() {
            run.enter(IndexingState::IndexingByQuery);
            match self.index_by_query(client).await {
                Ok(result) => facts = Some((result, IndexStrategy::Query)),
                Err(IndexError::Endpoint(error)) => {
                    tracing::warn!(%endpoint, %error, "Indexing by query failed, falling back to iteration");
                    status = EndpointStatus::Slow;
                }
                Err(error) => return Err(run.fail(error)),
            }
        } else {
            tracing::debug!(%endpoint, "Endpoint cannot filter by regex, indexing by iteration");
        }

        let (facts, strategy) = match facts {
            Some(facts) => facts,
            None => {
                run.enter(IndexingState::IndexingByIteration);
                match self.index_by_iteration(client).await {
                    Ok(result) => (result, IndexStrategy::Iteration),
                    Err(error) => return Err(run.fail(IndexError::StrategiesExhausted(error))),
                }
            }
        };

        let results_limit = self.results_limit_or_default(client).await;
        run.enter(IndexingState::Indexed(strategy));
        Ok(self.finish(run, endpoint_type, status, facts, strategy, results_limit))
    }

    /// Indexes an endpoint by crawling from `roots`. All completeness flags of the resulting record
    /// are false.
    pub async fn index_by_traversal(
        &self,
        client: &dyn EndpointClient,
        endpoint_type: EndpointType,
        roots: &[NamedNode],
        max_depth: Option<usize>,
    ) -> Result<IndexOutcome, IndexError> {
        if roots.is_empty() {
            return Err(IndexError::NoRoots);
        }
        let endpoint = client.endpoint().into_owned();
        let mut run = Run::new(&endpoint);
        self.ping(client, &mut run).await?;

        run.enter(IndexingState::IndexingByTraversal);
        let traverser = TypedBfsTraverser::new(
            client,
            &self.filter,
            self.config.query_timeout(),
            self.config.regex_max_length,
        );
        let max_depth = max_depth.unwrap_or(self.config.max_traversal_depth);
        let summary = match traverser.traverse(roots, max_depth).await {
            Ok(summary) => summary,
            Err(error) => return Err(run.fail(error.into())),
        };

        let incomplete = |regex: Option<UriRegex>| {
            regex.map(|regex| UriRegex {
                complete: false,
                ..regex
            })
        };
        let facts = Facts {
            predicates: summary.predicates,
            predicate_list_complete: false,
            subject_regex: incomplete(summary.subjects.to_uri_regex()),
            object_regex: incomplete(summary.objects.to_uri_regex()),
            triple_count: None,
        };

        let results_limit = self.results_limit_or_default(client).await;
        run.enter(IndexingState::Indexed(IndexStrategy::Traversal));
        Ok(self.finish(
            run,
            endpoint_type,
            EndpointStatus::Ok,
            facts,
            IndexStrategy::Traversal,
            results_limit,
        ))
    }

    /// Computes the subject and object regexes.
    ///
    /// Endpoints of a type supporting regex filters are asked with filter queries. The others are
    /// iterated, so their regexes are only complete if the iteration was not truncated.
    pub async fn regexes(
        &self,
        client: &dyn EndpointClient,
        endpoint_type: EndpointType,
    ) -> Result<(Option<UriRegex>, Option<UriRegex>), EndpointError> {
        if endpoint_type.supports_regex_filter() {
            self.regexes_by_query(client).await
        } else {
            let facts = self.index_by_iteration(client).await?;
            Ok((facts.subject_regex, facts.object_regex))
        }
    }

    async fn regexes_by_query(
        &self,
        client: &dyn EndpointClient,
    ) -> Result<(Option<UriRegex>, Option<UriRegex>), EndpointError> {
        let subject_regex = self.regex_by_query(client, UriPosition::Subject).await?;
        let object_regex = self.regex_by_query(client, UriPosition::Object).await?;
        Ok((subject_regex, object_regex))
    }

    /// Probes the results limit of an endpoint, falling back to the configured default.
    pub async fn results_limit_or_default(&self, client: &dyn EndpointClient) -> u64 {
        match self.prober().probe(client).await {
            Ok(limit) => {
                tracing::info!(endpoint = %client.endpoint(), limit, "Measured results limit");
                limit
            }
            Err(error) => {
                let limit = self.config.default_results_limit;
                log_probe_failure(client, &error, limit);
                limit
            }
        }
    }

    async fn ping(&self, client: &dyn EndpointClient, run: &mut Run<'_>) -> Result<(), IndexError> {
        if client.ping(self.config.query_timeout()).await {
            Ok(())
        } else {
            Err(run.fail(IndexError::Unreachable {
                endpoint: client.endpoint().into_owned(),
            }))
        }
    }

    fn finish(
        &self,
        run: Run<'_>,
        endpoint_type: EndpointType,
        status: EndpointStatus,
        facts: Facts,
        strategy: IndexStrategy,
        results_limit: u64,
    ) -> IndexOutcome {
        let record = IndexRecord {
            endpoint: run.endpoint.clone(),
            endpoint_type,
            status,
            predicates: facts.predicates,
            predicate_list_complete: facts.predicate_list_complete,
            subject_regex: facts.subject_regex,
            object_regex: facts.object_regex,
            triple_count: facts.triple_count,
            results_limit,
            last_updated: Some(OffsetDateTime::now_utc()),
        };
        tracing::info!(
            endpoint = %record.endpoint,
            %strategy,
            %status,
            predicates = record.predicates.len(),
            predicate_list_complete = record.predicate_list_complete,
            subject_regex_complete = record.subject_regex_complete(),
            object_regex_complete = record.object_regex_complete(),
            "Indexed endpoint"
        );
        IndexOutcome {
            record,
            strategy,
            states: run.states,
        }
    }

    async fn index_by_query(&self, client: &dyn EndpointClient) -> Result<Facts, IndexError> {
        let timeout = self.config.query_timeout();

        let solutions = client
            .select(&EndpointQuery::DistinctPredicates, timeout)
            .await?;
        let predicates = solutions
            .iter()
            .filter_map(|solution| match solution.get("p") {
                Some(Term::NamedNode(predicate)) => Some(predicate),
                _ => None,
            })
            .filter(|predicate| self.filter.allows(predicate.as_ref()))
            .cloned()
            .collect();
        let offset = u64::try_from(solutions.len()).unwrap_or(u64::MAX);
        let predicate_list_complete = !self.has_more_predicates(client, offset).await;

        let solutions = client.select(&EndpointQuery::CountTriples, timeout).await?;
        let count = match solutions.first().and_then(|solution| solution.get("count")) {
            Some(Term::Literal(count)) => count.value().parse::<u64>().map_err(|_| {
                IndexError::InvalidAggregate(format!("triple count {count} is not a count"))
            })?,
            Some(term) => {
                return Err(IndexError::InvalidAggregate(format!(
                    "triple count {term} is not a literal"
                )))
            }
            None => {
                return Err(IndexError::InvalidAggregate(
                    "the triple count query returned no value".to_owned(),
                ))
            }
        };

        let (subject_regex, object_regex) = self.regexes_by_query(client).await?;
        Ok(Facts {
            predicates,
            predicate_list_complete,
            subject_regex,
            object_regex,
            triple_count: Some(TripleCount::Exact(count)),
        })
    }

    /// Whether the endpoint knows a predicate past the first `offset` ones, that is whether the
    /// answer to [EndpointQuery::DistinctPredicates] was cut short. Unanswered checks count as yes.
    async fn has_more_predicates(&self, client: &dyn EndpointClient, offset: u64) -> bool {
        let query = EndpointQuery::PredicateAtOffset { offset };
        match client.select(&query, self.config.query_timeout()).await {
            Ok(rows) if rows.is_empty() => false,
            Ok(_) => {
                tracing::warn!(endpoint = %client.endpoint(), offset, "Endpoint cut the predicate list short");
                true
            }
            Err(error) => {
                tracing::warn!(endpoint = %client.endpoint(), %error, "Could not verify the end of the predicate list");
                true
            }
        }
    }

    /// Grows a regex by repeatedly asking for a URI it does not match yet.
    async fn regex_by_query(
        &self,
        client: &dyn EndpointClient,
        position: UriPosition,
    ) -> Result<Option<UriRegex>, EndpointError> {
        let endpoint = client.endpoint();
        let mut summarizer = UriPrefixSummarizer::new(self.config.regex_max_length);
        let complete = loop {
            let query = EndpointQuery::UnmatchedUri {
                position,
                regex: (!summarizer.is_empty()).then(|| summarizer.regex()),
            };
            let triples = client.construct(&query, self.config.query_timeout()).await?;
            let Some(triple) = triples.first() else {
                break summarizer.is_complete();
            };
            let uri = match position {
                UriPosition::Subject => match &triple.subject {
                    Subject::NamedNode(node) => Some(node.as_str()),
                    _ => None,
                },
                UriPosition::Object => match &triple.object {
                    Term::NamedNode(node) => Some(node.as_str()),
                    _ => None,
                },
            };
            let Some(uri) = uri else {
                tracing::warn!(%endpoint, %position, %triple, "Endpoint returned a triple without IRI");
                break false;
            };
            match summarizer.add_uri(uri) {
                AddOutcome::Added => {}
                AddOutcome::Truncated => break false,
                AddOutcome::Rejected => break false,
                AddOutcome::AlreadyCovered => {
                    tracing::warn!(%endpoint, %position, uri, "Endpoint returned a URI matching the regex");
                    break false;
                }
            }
        };

        tracing::debug!(
            %endpoint,
            %position,
            prefixes = summarizer.prefix_count(),
            complete,
            "Built URI regex"
        );
        Ok(summarizer.to_final_uri_regex(complete))
    }

    async fn index_by_iteration(&self, client: &dyn EndpointClient) -> Result<Facts, EndpointError> {
        let mut iterator = TripleIterator::new(
            client,
            self.config.query_timeout(),
            self.config.page_size,
            self.config.max_triples,
        );
        let mut predicates = BTreeSet::new();
        let mut subjects = UriPrefixSummarizer::new(self.config.regex_max_length);
        let mut objects = UriPrefixSummarizer::new(self.config.regex_max_length);

        while let Some(page) = iterator.next_page().await? {
            for triple in page {
                if let Subject::NamedNode(subject) = &triple.subject {
                    subjects.add_uri(subject.as_str());
                }
                if let Term::NamedNode(object) = &triple.object {
                    objects.add_uri(object.as_str());
                }
                if !predicates.contains(&triple.predicate) && self.filter.allows(triple.predicate.as_ref()) {
                    predicates.insert(triple.predicate);
                }
            }
        }

        let exhaustive = !iterator.is_truncated();
        let count = iterator.consumed();
        Ok(Facts {
            predicates,
            predicate_list_complete: exhaustive,
            subject_regex: subjects.to_final_uri_regex(exhaustive),
            object_regex: objects.to_final_uri_regex(exhaustive),
            triple_count: Some(if exhaustive {
                TripleCount::Exact(count)
            } else {
                TripleCount::LowerBound(count)
            }),
        })
    }
}

fn log_probe_failure(client: &dyn EndpointClient, error: &ProbeError, default: u64) {
    tracing::warn!(
        endpoint = %client.endpoint(),
        %error,
        default,
        "Could not measure results limit, using default"
    );
}
