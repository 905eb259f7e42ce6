use sparql_index_engine::AmbiguousPredicateDetector;
use sparql_index_model::{
    EndpointStatus, EndpointType, IndexRecord, PredicateFact, PropertyKind, Triple,
};
use sparql_index_storage::{MemRegistryStore, Registry, RegistryConfig};
use sparql_index_testsuite::fixtures::{ex, literal, triple};
use sparql_index_testsuite::{SimulatedConnector, SimulatedEndpoint};
use std::sync::Arc;
use std::time::Duration;

fn detector() -> AmbiguousPredicateDetector {
    AmbiguousPredicateDetector::new(Duration::from_secs(1))
}

fn registry() -> Registry {
    Registry::new(Arc::new(MemRegistryStore::new()), RegistryConfig::default())
}

/// Registers `endpoint` in the registry as exporting every predicate of `triples`.
async fn register(
    registry: &Registry,
    connector: &mut SimulatedConnector,
    endpoint: &str,
    triples: Vec<Triple>,
) {
    let mut record = IndexRecord::new(ex(endpoint), EndpointType::Standard, EndpointStatus::Ok);
    record.predicates = triples.iter().map(|t| t.predicate.clone()).collect();
    registry.write_record(&record).await.unwrap();
    connector.add(SimulatedEndpoint::new(ex(endpoint).as_str(), triples));
}

#[tokio::test]
async fn classifies_by_sample_object() {
    let endpoint = SimulatedEndpoint::new(
        "http://example.com/sparql",
        vec![
            triple(&ex("s"), &ex("name"), literal("a name")),
            triple(&ex("s"), &ex("knows"), ex("o")),
        ],
    );

    let facts = detector()
        .classify_all(&endpoint, &[ex("name"), ex("knows"), ex("unused")])
        .await
        .unwrap();

    assert_eq!(
        facts,
        vec![
            PredicateFact::new(ex("name"), PropertyKind::Datatype),
            PredicateFact::new(ex("knows"), PropertyKind::Object),
        ]
    );
}

#[tokio::test]
async fn finds_and_removes_ambiguous_predicates() {
    let registry = registry();
    let mut connector = SimulatedConnector::new();
    register(
        &registry,
        &mut connector,
        "first",
        vec![
            triple(&ex("s"), &ex("creator"), ex("alice")),
            triple(&ex("s"), &ex("title"), literal("a title")),
        ],
    )
    .await;
    register(
        &registry,
        &mut connector,
        "second",
        vec![triple(&ex("t"), &ex("creator"), literal("Bob"))],
    )
    .await;
    registry
        .add_predicate_facts(&[
            PredicateFact::new(ex("creator"), PropertyKind::Object),
            PredicateFact::new(ex("title"), PropertyKind::Datatype),
        ])
        .await
        .unwrap();

    let ambiguous = detector()
        .find_ambiguous(&registry, &connector)
        .await
        .unwrap();
    assert_eq!(
        ambiguous,
        vec![PredicateFact::new(ex("creator"), PropertyKind::Object)]
    );

    detector()
        .remove_ambiguous(&registry, &connector)
        .await
        .unwrap();
    assert_eq!(
        registry.predicate_facts().await.unwrap(),
        vec![PredicateFact::new(ex("title"), PropertyKind::Datatype)]
    );
}

#[tokio::test]
async fn unreachable_endpoints_are_skipped() {
    let registry = registry();
    let mut connector = SimulatedConnector::new();
    register(
        &registry,
        &mut connector,
        "first",
        vec![triple(&ex("s"), &ex("title"), literal("a title"))],
    )
    .await;
    let mut record = IndexRecord::new(ex("gone"), EndpointType::Standard, EndpointStatus::Dead);
    record.predicates = [ex("title")].into_iter().collect();
    registry.write_record(&record).await.unwrap();
    registry
        .add_predicate_facts(&[PredicateFact::new(ex("title"), PropertyKind::Datatype)])
        .await
        .unwrap();

    let ambiguous = detector()
        .find_ambiguous(&registry, &connector)
        .await
        .unwrap();

    assert!(ambiguous.is_empty());
}
