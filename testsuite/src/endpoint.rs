use async_trait::async_trait;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use sparesults::QuerySolution;
use sparql_index_common::error::EndpointError;
use sparql_index_common::{
    EndpointClient, EndpointQuery, QueryForm, QueryKind, UriPosition,
};
use sparql_index_model::vocab::{rdf, xsd};
use sparql_index_model::{Literal, NamedNode, NamedNodeRef, Subject, Term, Triple, Variable};
use std::sync::Mutex;
use std::time::Duration;

/// How a simulated query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    Timeout,
    /// The query succeeds with an empty answer.
    Empty,
    HttpStatus(u16),
    Access,
    Unreachable,
}

impl FailureMode {
    fn to_error(self, timeout: Option<Duration>) -> EndpointError {
        match self {
            Self::Timeout => EndpointError::Timeout(timeout),
            Self::Empty => EndpointError::UnexpectedResult("empty answer".to_owned()),
            Self::HttpStatus(status) => EndpointError::HttpStatus {
                status,
                body: "simulated failure".to_owned(),
            },
            Self::Access => EndpointError::Access { status: 403 },
            Self::Unreachable => EndpointError::Transport("connection refused".into()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    mode: FailureMode,
    /// Number of queries of the kind that succeed before the failure kicks in.
    after: usize,
}

/// An endpoint evaluating queries over an in-memory list of triples.
pub struct SimulatedEndpoint {
    endpoint: NamedNode,
    triples: Vec<Triple>,
    row_cap: Option<usize>,
    timeout_threshold: Option<u64>,
    failures: FxHashMap<QueryKind, Failure>,
    unreachable: bool,
    queries: Mutex<Vec<EndpointQuery>>,
    updates: Mutex<Vec<String>>,
}

impl SimulatedEndpoint {
    pub fn new(endpoint: &str, triples: Vec<Triple>) -> Self {
        Self {
            endpoint: NamedNode::new_unchecked(endpoint),
            triples,
            row_cap: None,
            timeout_threshold: None,
            failures: FxHashMap::default(),
            unreachable: false,
            queries: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    /// Truncates every answer to `cap` rows, like endpoints enforcing a server-side limit.
    #[must_use]
    pub fn with_row_cap(mut self, cap: usize) -> Self {
        self.row_cap = Some(cap);
        self
    }

    /// Makes [EndpointQuery::RowAtOffset] time out for every offset at or beyond `threshold`.
    #[must_use]
    pub fn with_timeout_threshold(mut self, threshold: u64) -> Self {
        self.timeout_threshold = Some(threshold);
        self
    }

    /// Makes every query of `kind` fail.
    #[must_use]
    pub fn failing(self, kind: QueryKind, mode: FailureMode) -> Self {
        self.failing_after(kind, 0, mode)
    }

    /// Makes queries of `kind` fail once `after` of them succeeded.
    #[must_use]
    pub fn failing_after(mut self, kind: QueryKind, after: usize, mode: FailureMode) -> Self {
        self.failures.insert(kind, Failure { mode, after });
        self
    }

    /// Makes every request fail at the connection level.
    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Returns every query received so far, in order.
    pub fn queries(&self) -> Vec<EndpointQuery> {
        self.lock_queries().clone()
    }

    /// Returns the number of queries of `kind` received so far.
    pub fn query_count(&self, kind: QueryKind) -> usize {
        self.lock_queries()
            .iter()
            .filter(|q| q.kind() == kind)
            .count()
    }

    pub fn updates(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn clear_log(&self) {
        self.lock_queries().clear();
    }

    fn lock_queries(&self) -> std::sync::MutexGuard<'_, Vec<EndpointQuery>> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Records the query and decides whether it fails. Returns `false` if the answer must be
    /// empty.
    fn receive(&self, query: &EndpointQuery, timeout: Duration) -> Result<bool, EndpointError> {
        let previous = {
            let mut queries = self.lock_queries();
            let previous = queries.iter().filter(|q| q.kind() == query.kind()).count();
            queries.push(query.clone());
            previous
        };
        if self.unreachable {
            return Err(FailureMode::Unreachable.to_error(None));
        }
        if let Some(failure) = self.failures.get(&query.kind()) {
            if previous >= failure.after {
                if failure.mode == FailureMode::Empty {
                    return Ok(false);
                }
                return Err(failure.mode.to_error(Some(timeout)));
            }
        }
        if let (EndpointQuery::RowAtOffset { offset }, Some(threshold)) =
            (query, self.timeout_threshold)
        {
            if *offset >= threshold {
                return Err(EndpointError::Timeout(Some(timeout)));
            }
        }
        Ok(true)
    }

    fn cap<T>(&self, mut rows: Vec<T>) -> Vec<T> {
        if let Some(cap) = self.row_cap {
            rows.truncate(cap);
        }
        rows
    }

    fn evaluate_construct(&self, query: &EndpointQuery) -> Result<Vec<Triple>, EndpointError> {
        let triples = match query {
            EndpointQuery::TriplePage { limit, offset } => self
                .triples
                .iter()
                .skip(to_usize(*offset))
                .take(to_usize(*limit))
                .cloned()
                .collect(),
            EndpointQuery::UnmatchedUri { position, regex } => {
                let regex = regex
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|e| EndpointError::HttpStatus {
                        status: 400,
                        body: e.to_string(),
                    })?;
                self.triples
                    .iter()
                    .filter(|t| match iri_at(t, *position) {
                        Some(iri) => regex.as_ref().map_or(true, |r| !r.is_match(iri)),
                        None => false,
                    })
                    .take(1)
                    .cloned()
                    .collect()
            }
            EndpointQuery::ResourceTriples { resource } => self
                .triples
                .iter()
                .filter(|t| is_subject(t, resource.as_ref()))
                .cloned()
                .collect(),
            EndpointQuery::PredicateSample { predicate } => self
                .triples
                .iter()
                .filter(|t| t.predicate == *predicate)
                .take(1)
                .cloned()
                .collect(),
            EndpointQuery::GraphTriples { .. } => Vec::new(),
            _ => return Err(wrong_form(query)),
        };
        Ok(self.cap(triples))
    }

    fn evaluate_select(&self, query: &EndpointQuery) -> Result<Vec<QuerySolution>, EndpointError> {
        let solutions = match query {
            EndpointQuery::Ping => self.triples.iter().take(1).map(spo_solution).collect(),
            EndpointQuery::DistinctPredicates => {
                let mut seen = FxHashSet::default();
                self.triples
                    .iter()
                    .filter(|t| seen.insert(t.predicate.clone()))
                    .map(|t| solution("p", t.predicate.clone().into()))
                    .collect()
            }
            EndpointQuery::PredicateAtOffset { offset } => {
                let mut seen = FxHashSet::default();
                self.triples
                    .iter()
                    .filter(|t| seen.insert(t.predicate.clone()))
                    .skip(to_usize(*offset))
                    .take(1)
                    .map(|t| solution("p", t.predicate.clone().into()))
                    .collect()
            }
            EndpointQuery::CountTriples => vec![solution(
                "count",
                Literal::new_typed_literal(self.triples.len().to_string(), xsd::INTEGER).into(),
            )],
            EndpointQuery::RowAtOffset { offset } => self
                .triples
                .iter()
                .skip(to_usize(*offset))
                .take(1)
                .map(spo_solution)
                .collect(),
            EndpointQuery::ResourceTypes { resource } => {
                let mut seen = FxHashSet::default();
                self.triples
                    .iter()
                    .filter(|t| is_subject(t, resource.as_ref()) && t.predicate == rdf::TYPE)
                    .filter(|t| seen.insert(t.object.clone()))
                    .map(|t| solution("type", t.object.clone()))
                    .collect()
            }
            EndpointQuery::PredicateObjects { predicate, literal } => self
                .triples
                .iter()
                .filter(|t| t.predicate == *predicate && t.object.is_literal() == *literal)
                .take(1)
                .map(|t| solution("o", t.object.clone()))
                .collect(),
            EndpointQuery::GraphSubjects { .. } => Vec::new(),
            _ => return Err(wrong_form(query)),
        };
        Ok(self.cap(solutions))
    }
}

#[async_trait]
impl EndpointClient for SimulatedEndpoint {
    fn endpoint(&self) -> NamedNodeRef<'_> {
        self.endpoint.as_ref()
    }

    async fn select(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<QuerySolution>, EndpointError> {
        if !self.receive(query, timeout)? {
            return Ok(Vec::new());
        }
        self.evaluate_select(query)
    }

    async fn construct(
        &self,
        query: &EndpointQuery,
        timeout: Duration,
    ) -> Result<Vec<Triple>, EndpointError> {
        if !self.receive(query, timeout)? {
            return Ok(Vec::new());
        }
        self.evaluate_construct(query)
    }

    async fn update(&self, update: &str) -> Result<(), EndpointError> {
        if self.unreachable {
            return Err(FailureMode::Unreachable.to_error(None));
        }
        self.updates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(update.to_owned());
        Ok(())
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

fn wrong_form(query: &EndpointQuery) -> EndpointError {
    let expected = match query.form() {
        QueryForm::Select => "select",
        QueryForm::Construct => "construct",
    };
    EndpointError::UnexpectedResult(format!("{} must be sent as a {expected} query", query.kind()))
}

fn is_subject(triple: &Triple, resource: NamedNodeRef<'_>) -> bool {
    matches!(&triple.subject, Subject::NamedNode(node) if node.as_ref() == resource)
}

fn iri_at(triple: &Triple, position: UriPosition) -> Option<&str> {
    match position {
        UriPosition::Subject => match &triple.subject {
            Subject::NamedNode(node) => Some(node.as_str()),
            _ => None,
        },
        UriPosition::Object => match &triple.object {
            Term::NamedNode(node) => Some(node.as_str()),
            _ => None,
        },
    }
}

fn solution(variable: &str, value: Term) -> QuerySolution {
    QuerySolution::from((vec![Variable::new_unchecked(variable)], vec![Some(value)]))
}

fn spo_solution(triple: &Triple) -> QuerySolution {
    QuerySolution::from((
        vec![
            Variable::new_unchecked("s"),
            Variable::new_unchecked("p"),
            Variable::new_unchecked("o"),
        ],
        vec![
            Some(triple.subject.clone().into()),
            Some(triple.predicate.clone().into()),
            Some(triple.object.clone()),
        ],
    ))
}
