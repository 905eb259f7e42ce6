use sparql_index_common::error::EndpointError;
use sparql_index_common::{EndpointClient, EndpointConnector, EndpointQuery, QueryKind, UriPosition};
use sparql_index_testsuite::fixtures::{ex, numbered_triples, three_triples};
use sparql_index_testsuite::{FailureMode, SimulatedConnector, SimulatedEndpoint};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(1);

#[tokio::test]
async fn counts_triples() {
    let endpoint = SimulatedEndpoint::new("http://example.com/sparql", three_triples());
    let solutions = endpoint
        .select(&EndpointQuery::CountTriples, TIMEOUT)
        .await
        .unwrap();
    let count = solutions[0].get("count").unwrap();
    assert_eq!(
        count.to_string(),
        "\"3\"^^<http://www.w3.org/2001/XMLSchema#integer>"
    );
}

#[tokio::test]
async fn row_cap_truncates_pages() {
    let endpoint = SimulatedEndpoint::new(
        "http://example.com/sparql",
        numbered_triples("http://example.com/s", 10),
    )
    .with_row_cap(4);
    let page = endpoint
        .construct(
            &EndpointQuery::TriplePage {
                limit: 8,
                offset: 0,
            },
            TIMEOUT,
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 4);
}

#[tokio::test]
async fn predicate_at_offset_skips_distinct_predicates() {
    let endpoint = SimulatedEndpoint::new("http://example.com/sparql", three_triples());
    let after_first = endpoint
        .select(&EndpointQuery::PredicateAtOffset { offset: 1 }, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first[0].get("p"), Some(&ex("q").into()));

    let after_all = endpoint
        .select(&EndpointQuery::PredicateAtOffset { offset: 2 }, TIMEOUT)
        .await
        .unwrap();
    assert!(after_all.is_empty());
}

#[tokio::test]
async fn unmatched_uri_respects_regex() {
    let endpoint = SimulatedEndpoint::new("http://example.com/sparql", three_triples());
    let query = EndpointQuery::UnmatchedUri {
        position: UriPosition::Subject,
        regex: Some("^http://example\\.com/a/".to_owned()),
    };
    let triples = endpoint.construct(&query, TIMEOUT).await.unwrap();
    assert_eq!(triples.len(), 1);
    assert_eq!(triples[0].subject.to_string(), format!("<{}>", ex("d/D").as_str()));
}

#[tokio::test]
async fn timeout_threshold_applies_to_offsets() {
    let endpoint = SimulatedEndpoint::new(
        "http://example.com/sparql",
        numbered_triples("http://example.com/s", 10),
    )
    .with_timeout_threshold(5);
    assert_eq!(
        endpoint
            .select(&EndpointQuery::RowAtOffset { offset: 4 }, TIMEOUT)
            .await
            .unwrap()
            .len(),
        1
    );
    let error = endpoint
        .select(&EndpointQuery::RowAtOffset { offset: 5 }, TIMEOUT)
        .await
        .unwrap_err();
    assert!(error.is_timeout());
}

#[tokio::test]
async fn failures_kick_in_after_successes() {
    let endpoint = SimulatedEndpoint::new("http://example.com/sparql", three_triples())
        .failing_after(QueryKind::Ping, 1, FailureMode::HttpStatus(500));
    assert!(endpoint.ping(TIMEOUT).await);
    assert!(!endpoint.ping(TIMEOUT).await);
    assert_eq!(endpoint.query_count(QueryKind::Ping), 2);
}

#[tokio::test]
async fn wrong_form_is_rejected() {
    let endpoint = SimulatedEndpoint::new("http://example.com/sparql", three_triples());
    let error = endpoint
        .construct(&EndpointQuery::CountTriples, TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(error, EndpointError::UnexpectedResult(_)));
}

#[tokio::test]
async fn connector_rejects_unknown_endpoints() {
    let mut connector = SimulatedConnector::new();
    connector.add(SimulatedEndpoint::new(
        "http://example.com/sparql",
        three_triples(),
    ));
    assert!(connector.connect(&ex("sparql")).is_ok());
    assert!(connector.connect(&ex("other")).is_err());
}
