use sparql_index_model::vocab::rdf;
use sparql_index_model::{Literal, NamedNode, Term};
use std::fmt::{Display, Formatter};

/// Which position of a triple an IRI is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriPosition {
    Subject,
    Object,
}

impl UriPosition {
    /// The variable holding this position in the queries of [EndpointQuery].
    pub fn variable(self) -> &'static str {
        match self {
            Self::Subject => "s",
            Self::Object => "o",
        }
    }
}

impl Display for UriPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subject => f.write_str("subject"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// The SPARQL query form of an [EndpointQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryForm {
    /// Answered with a solution sequence.
    Select,
    /// Answered with a graph.
    Construct,
}

/// The variant of an [EndpointQuery] without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Ping,
    DistinctPredicates,
    PredicateAtOffset,
    CountTriples,
    TriplePage,
    RowAtOffset,
    UnmatchedUri,
    ResourceTriples,
    ResourceTypes,
    PredicateSample,
    PredicateObjects,
    GraphTriples,
    GraphSubjects,
}

impl Display for QueryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Every query issued against an endpoint.
///
/// The [Display] implementation renders the query as SPARQL 1.1 text. Queries of the
/// [QueryForm::Select] form bind the variables documented on each variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EndpointQuery {
    /// A cheap query that any live endpoint answers.
    Ping,
    /// Binds `?p` to each predicate of the endpoint.
    DistinctPredicates,
    /// Binds `?p` to at most one distinct predicate past the first `offset` ones.
    PredicateAtOffset { offset: u64 },
    /// Binds `?count` to the number of triples.
    CountTriples,
    /// One page of all triples.
    TriplePage { limit: u64, offset: u64 },
    /// Binds `?s ?p ?o` to at most one row at the given offset.
    RowAtOffset { offset: u64 },
    /// One triple whose IRI at `position` does not match `regex`. Without a regex, any triple
    /// with an IRI at `position`.
    UnmatchedUri {
        position: UriPosition,
        regex: Option<String>,
    },
    /// The triples whose subject is `resource`.
    ResourceTriples { resource: NamedNode },
    /// Binds `?type` to each `rdf:type` of `resource`.
    ResourceTypes { resource: NamedNode },
    /// One triple using `predicate`.
    PredicateSample { predicate: NamedNode },
    /// Binds `?o` to at most one object of `predicate` that is (or is not) a literal.
    PredicateObjects { predicate: NamedNode, literal: bool },
    /// The triples of a named graph, optionally restricted to one subject.
    GraphTriples {
        graph: NamedNode,
        subject: Option<NamedNode>,
    },
    /// Binds `?s` to each subject of `predicate` in a named graph, optionally with a fixed object.
    GraphSubjects {
        graph: NamedNode,
        predicate: NamedNode,
        object: Option<Term>,
    },
}

impl EndpointQuery {
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Ping => QueryKind::Ping,
            Self::DistinctPredicates => QueryKind::DistinctPredicates,
            Self::PredicateAtOffset { .. } => QueryKind::PredicateAtOffset,
            Self::CountTriples => QueryKind::CountTriples,
            Self::TriplePage { .. } => QueryKind::TriplePage,
            Self::RowAtOffset { .. } => QueryKind::RowAtOffset,
            Self::UnmatchedUri { .. } => QueryKind::UnmatchedUri,
            Self::ResourceTriples { .. } => QueryKind::ResourceTriples,
            Self::ResourceTypes { .. } => QueryKind::ResourceTypes,
            Self::PredicateSample { .. } => QueryKind::PredicateSample,
            Self::PredicateObjects { .. } => QueryKind::PredicateObjects,
            Self::GraphTriples { .. } => QueryKind::GraphTriples,
            Self::GraphSubjects { .. } => QueryKind::GraphSubjects,
        }
    }

    pub fn form(&self) -> QueryForm {
        match self {
            Self::TriplePage { .. }
            | Self::UnmatchedUri { .. }
            | Self::ResourceTriples { .. }
            | Self::PredicateSample { .. }
            | Self::GraphTriples { .. } => QueryForm::Construct,
            Self::Ping
            | Self::DistinctPredicates
            | Self::PredicateAtOffset { .. }
            | Self::CountTriples
            | Self::RowAtOffset { .. }
            | Self::ResourceTypes { .. }
            | Self::PredicateObjects { .. }
            | Self::GraphSubjects { .. } => QueryForm::Select,
        }
    }
}

impl Display for EndpointQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ping => f.write_str("SELECT * WHERE { ?s ?p ?o } LIMIT 1"),
            Self::DistinctPredicates => f.write_str("SELECT DISTINCT ?p WHERE { ?s ?p ?o }"),
            Self::PredicateAtOffset { offset } => write!(
                f,
                "SELECT DISTINCT ?p WHERE {{ ?s ?p ?o }} OFFSET {offset} LIMIT 1"
            ),
            Self::CountTriples => {
                f.write_str("SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o }")
            }
            Self::TriplePage { limit, offset } => write!(
                f,
                "CONSTRUCT {{ ?s ?p ?o }} WHERE {{ ?s ?p ?o }} LIMIT {limit} OFFSET {offset}"
            ),
            Self::RowAtOffset { offset } => {
                write!(f, "SELECT * WHERE {{ ?s ?p ?o }} OFFSET {offset} LIMIT 1")
            }
            Self::UnmatchedUri { position, regex } => {
                let var = position.variable();
                match regex {
                    Some(regex) => write!(
                        f,
                        "CONSTRUCT {{ ?s ?p ?o }} WHERE {{ ?s ?p ?o . FILTER(isIRI(?{var}) && !regex(str(?{var}), {})) }} LIMIT 1",
                        Literal::new_simple_literal(regex)
                    ),
                    None => write!(
                        f,
                        "CONSTRUCT {{ ?s ?p ?o }} WHERE {{ ?s ?p ?o . FILTER(isIRI(?{var})) }} LIMIT 1"
                    ),
                }
            }
            Self::ResourceTriples { resource } => write!(
                f,
                "CONSTRUCT {{ {resource} ?p ?o }} WHERE {{ {resource} ?p ?o }}"
            ),
            Self::ResourceTypes { resource } => write!(
                f,
                "SELECT DISTINCT ?type WHERE {{ {resource} {} ?type }}",
                rdf::TYPE
            ),
            Self::PredicateSample { predicate } => write!(
                f,
                "CONSTRUCT {{ ?s {predicate} ?o }} WHERE {{ ?s {predicate} ?o }} LIMIT 1"
            ),
            Self::PredicateObjects { predicate, literal } => write!(
                f,
                "SELECT ?o WHERE {{ ?s {predicate} ?o . FILTER({}isLiteral(?o)) }} LIMIT 1",
                if *literal { "" } else { "!" }
            ),
            Self::GraphTriples { graph, subject } => match subject {
                Some(subject) => write!(
                    f,
                    "CONSTRUCT {{ {subject} ?p ?o }} WHERE {{ GRAPH {graph} {{ {subject} ?p ?o }} }}"
                ),
                None => write!(
                    f,
                    "CONSTRUCT {{ ?s ?p ?o }} WHERE {{ GRAPH {graph} {{ ?s ?p ?o }} }}"
                ),
            },
            Self::GraphSubjects {
                graph,
                predicate,
                object,
            } => match object {
                Some(object) => write!(
                    f,
                    "SELECT DISTINCT ?s WHERE {{ GRAPH {graph} {{ ?s {predicate} {object} }} }}"
                ),
                None => write!(
                    f,
                    "SELECT DISTINCT ?s WHERE {{ GRAPH {graph} {{ ?s {predicate} ?o }} }}"
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::Query;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn all_queries() -> Vec<EndpointQuery> {
        vec![
            EndpointQuery::Ping,
            EndpointQuery::DistinctPredicates,
            EndpointQuery::PredicateAtOffset { offset: 12 },
            EndpointQuery::CountTriples,
            EndpointQuery::TriplePage {
                limit: 100,
                offset: 200,
            },
            EndpointQuery::RowAtOffset { offset: 41 },
            EndpointQuery::UnmatchedUri {
                position: UriPosition::Subject,
                regex: None,
            },
            EndpointQuery::UnmatchedUri {
                position: UriPosition::Object,
                regex: Some(r#"^http://example\.com/|^urn:"quoted"\\"#.to_owned()),
            },
            EndpointQuery::ResourceTriples {
                resource: node("http://example.com/a"),
            },
            EndpointQuery::ResourceTypes {
                resource: node("http://example.com/a"),
            },
            EndpointQuery::PredicateSample {
                predicate: node("http://example.com/p"),
            },
            EndpointQuery::PredicateObjects {
                predicate: node("http://example.com/p"),
                literal: true,
            },
            EndpointQuery::PredicateObjects {
                predicate: node("http://example.com/p"),
                literal: false,
            },
            EndpointQuery::GraphTriples {
                graph: node("http://example.com/g"),
                subject: Some(node("http://example.com/a")),
            },
            EndpointQuery::GraphTriples {
                graph: node("http://example.com/g"),
                subject: None,
            },
            EndpointQuery::GraphSubjects {
                graph: node("http://example.com/g"),
                predicate: node("http://example.com/p"),
                object: Some(Literal::new_simple_literal("a \"b\"").into()),
            },
            EndpointQuery::GraphSubjects {
                graph: node("http://example.com/g"),
                predicate: node("http://example.com/p"),
                object: None,
            },
        ]
    }

    #[test]
    fn rendered_queries_are_valid_sparql() {
        for query in all_queries() {
            let text = query.to_string();
            let parsed = Query::parse(&text, None);
            assert!(parsed.is_ok(), "{text}: {parsed:?}");

            let is_construct = matches!(parsed.unwrap(), Query::Construct { .. });
            assert_eq!(is_construct, query.form() == QueryForm::Construct, "{text}");
        }
    }

    #[test]
    fn regex_is_embedded_as_string_literal() {
        let query = EndpointQuery::UnmatchedUri {
            position: UriPosition::Subject,
            regex: Some(r#"^a"b"#.to_owned()),
        };
        assert_eq!(
            query.to_string(),
            r#"CONSTRUCT { ?s ?p ?o } WHERE { ?s ?p ?o . FILTER(isIRI(?s) && !regex(str(?s), "^a\"b")) } LIMIT 1"#
        );
    }

    #[test]
    fn predicate_at_offset_skips_known_predicates() {
        assert_eq!(
            EndpointQuery::PredicateAtOffset { offset: 3 }.to_string(),
            "SELECT DISTINCT ?p WHERE { ?s ?p ?o } OFFSET 3 LIMIT 1"
        );
    }

    #[test]
    fn row_at_offset_selects_single_row() {
        assert_eq!(
            EndpointQuery::RowAtOffset { offset: 9 }.to_string(),
            "SELECT * WHERE { ?s ?p ?o } OFFSET 9 LIMIT 1"
        );
    }
}
