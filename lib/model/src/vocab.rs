//! Vocabularies used by the registry graphs.

pub use oxrdf::vocab::{rdf, xsd};

/// The vocabulary describing indexed endpoints.
///
/// Every field of an [`IndexRecord`](crate::IndexRecord) is persisted as exactly one of these
/// predicates, with the endpoint IRI as subject.
pub mod registry {
    use oxrdf::NamedNodeRef;

    /// The namespace of the registry vocabulary.
    pub const NAMESPACE: &str = "https://w3id.org/sparql-index/registry#";

    /// The liveness status of an endpoint (`OK`, `SLOW`, `DEAD`, `INCORRECT`).
    pub const ENDPOINT_STATUS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#endpointStatus");
    /// A predicate that occurs in the endpoint. Repeated once per predicate.
    pub const HAS_PREDICATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#hasPredicate");
    /// Whether the `hasPredicate` facts are exhaustive.
    pub const PREDICATE_LIST_IS_COMPLETE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "https://w3id.org/sparql-index/registry#predicateListIsComplete",
    );
    /// A regular expression matching the subject IRIs of the endpoint.
    pub const SUBJECT_REGEX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#subjectRegex");
    /// Whether the subject regex covers every subject IRI.
    pub const SUBJECT_REGEX_IS_COMPLETE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "https://w3id.org/sparql-index/registry#subjectRegexIsComplete",
    );
    /// A regular expression matching the object IRIs of the endpoint.
    pub const OBJECT_REGEX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#objectRegex");
    /// Whether the object regex covers every object IRI.
    pub const OBJECT_REGEX_IS_COMPLETE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "https://w3id.org/sparql-index/registry#objectRegexIsComplete",
    );
    /// The exact number of triples. Mutually exclusive with [`NUM_TRIPLES_LOWER_BOUND`].
    pub const NUM_TRIPLES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#numTriples");
    /// A lower bound on the number of triples. Mutually exclusive with [`NUM_TRIPLES`].
    pub const NUM_TRIPLES_LOWER_BOUND: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "https://w3id.org/sparql-index/registry#numTriplesLowerBound",
    );
    /// The largest page size the endpoint answers within its timeout.
    pub const RESULTS_LIMIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#resultsLimit");
    /// When the facts of the endpoint were last written by an indexing run.
    pub const LAST_UPDATED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#lastUpdated");

    /// Class of endpoints supporting regular expression filters.
    pub const STANDARD_ENDPOINT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("https://w3id.org/sparql-index/registry#StandardEndpoint");
    /// Class of endpoints whose engine cannot evaluate `FILTER(regex(...))`.
    pub const LIMITED_FILTER_SUPPORT_ENDPOINT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked(
        "https://w3id.org/sparql-index/registry#LimitedFilterSupportEndpoint",
    );
}

pub mod owl {
    use oxrdf::NamedNodeRef;

    pub const DATATYPE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");
    pub const OBJECT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
}
