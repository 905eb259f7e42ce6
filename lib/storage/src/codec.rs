use sparql_index_common::error::CorruptionError;
use sparql_index_model::vocab::{rdf, registry, xsd};
use sparql_index_model::{
    EndpointStatus, EndpointType, IndexRecord, Literal, NamedNode, NamedNodeRef, Term, Triple,
    TripleCount, UriRegex, DEFAULT_RESULTS_LIMIT,
};
use std::collections::BTreeSet;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A group of facts about an endpoint that is always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactSet {
    Status(EndpointStatus),
    EndpointType(EndpointType),
    Predicates {
        predicates: BTreeSet<NamedNode>,
        complete: bool,
    },
    SubjectRegex(UriRegex),
    ObjectRegex(UriRegex),
    TripleCount(TripleCount),
    ResultsLimit(u64),
    LastUpdated(OffsetDateTime),
}

impl FactSet {
    /// The predicates whose triples belong to this fact set.
    pub fn scope(&self) -> &'static [NamedNodeRef<'static>] {
        match self {
            Self::Status(_) => &[registry::ENDPOINT_STATUS],
            Self::EndpointType(_) => &[rdf::TYPE],
            Self::Predicates { .. } => {
                &[registry::HAS_PREDICATE, registry::PREDICATE_LIST_IS_COMPLETE]
            }
            Self::SubjectRegex(_) => &[registry::SUBJECT_REGEX, registry::SUBJECT_REGEX_IS_COMPLETE],
            Self::ObjectRegex(_) => &[registry::OBJECT_REGEX, registry::OBJECT_REGEX_IS_COMPLETE],
            Self::TripleCount(_) => &[registry::NUM_TRIPLES, registry::NUM_TRIPLES_LOWER_BOUND],
            Self::ResultsLimit(_) => &[registry::RESULTS_LIMIT],
            Self::LastUpdated(_) => &[registry::LAST_UPDATED],
        }
    }

    /// Serializes the fact set with `endpoint` as subject.
    pub fn to_triples(&self, endpoint: &NamedNode) -> Result<Vec<Triple>, CorruptionError> {
        let triple = |predicate: NamedNodeRef<'_>, object: Term| {
            Triple::new(endpoint.clone(), predicate.into_owned(), object)
        };
        Ok(match self {
            Self::Status(status) => vec![triple(
                registry::ENDPOINT_STATUS,
                Literal::new_simple_literal(status.as_str()).into(),
            )],
            Self::EndpointType(endpoint_type) => {
                vec![triple(rdf::TYPE, endpoint_type.class().into_owned().into())]
            }
            Self::Predicates {
                predicates,
                complete,
            } => predicates
                .iter()
                .map(|p| triple(registry::HAS_PREDICATE, p.clone().into()))
                .chain([triple(
                    registry::PREDICATE_LIST_IS_COMPLETE,
                    Literal::from(*complete).into(),
                )])
                .collect(),
            Self::SubjectRegex(regex) => regex_triples(
                endpoint,
                regex,
                registry::SUBJECT_REGEX,
                registry::SUBJECT_REGEX_IS_COMPLETE,
            ),
            Self::ObjectRegex(regex) => regex_triples(
                endpoint,
                regex,
                registry::OBJECT_REGEX,
                registry::OBJECT_REGEX_IS_COMPLETE,
            ),
            Self::TripleCount(count) => vec![triple(count.predicate(), long(count.value()))],
            Self::ResultsLimit(limit) => vec![triple(registry::RESULTS_LIMIT, long(*limit))],
            Self::LastUpdated(timestamp) => {
                let value = timestamp.format(&Rfc3339).map_err(CorruptionError::new)?;
                vec![triple(
                    registry::LAST_UPDATED,
                    Literal::new_typed_literal(value, xsd::DATE_TIME).into(),
                )]
            }
        })
    }
}

fn regex_triples(
    endpoint: &NamedNode,
    regex: &UriRegex,
    pattern_predicate: NamedNodeRef<'_>,
    complete_predicate: NamedNodeRef<'_>,
) -> Vec<Triple> {
    vec![
        Triple::new(
            endpoint.clone(),
            pattern_predicate.into_owned(),
            Literal::new_simple_literal(&regex.pattern),
        ),
        Triple::new(
            endpoint.clone(),
            complete_predicate.into_owned(),
            Literal::from(regex.complete),
        ),
    ]
}

fn long(value: u64) -> Term {
    Literal::new_typed_literal(value.to_string(), xsd::LONG).into()
}

/// Splits a record into all of its fact sets.
pub fn fact_sets(record: &IndexRecord) -> Vec<FactSet> {
    let mut facts = vec![
        FactSet::Status(record.status),
        FactSet::EndpointType(record.endpoint_type),
        FactSet::Predicates {
            predicates: record.predicates.clone(),
            complete: record.predicate_list_complete,
        },
        FactSet::ResultsLimit(record.results_limit),
    ];
    facts.extend(record.subject_regex.clone().map(FactSet::SubjectRegex));
    facts.extend(record.object_regex.clone().map(FactSet::ObjectRegex));
    facts.extend(record.triple_count.map(FactSet::TripleCount));
    facts.extend(record.last_updated.map(FactSet::LastUpdated));
    facts
}

/// Rebuilds a record from the triples whose subject is `endpoint`.
///
/// Returns `None` if there are no triples. Unknown predicates are ignored.
pub fn decode_record(
    endpoint: &NamedNode,
    triples: &[Triple],
) -> Result<Option<IndexRecord>, CorruptionError> {
    if triples.is_empty() {
        return Ok(None);
    }

    let mut status = None;
    let mut endpoint_type = None;
    let mut predicates = BTreeSet::new();
    let mut predicate_list_complete = false;
    let mut subject_regex = None;
    let mut subject_regex_complete = false;
    let mut object_regex = None;
    let mut object_regex_complete = false;
    let mut triple_count = None;
    let mut results_limit = None;
    let mut last_updated = None;

    for triple in triples {
        let predicate = triple.predicate.as_ref();
        let object = &triple.object;
        if predicate == rdf::TYPE {
            if let Term::NamedNode(class) = object {
                if let Some(value) = EndpointType::from_class(class.as_ref()) {
                    endpoint_type = Some(value);
                }
            }
        } else if predicate == registry::ENDPOINT_STATUS {
            status = Some(
                lexical(object, predicate)?
                    .parse::<EndpointStatus>()
                    .map_err(CorruptionError::new)?,
            );
        } else if predicate == registry::HAS_PREDICATE {
            match object {
                Term::NamedNode(node) => {
                    predicates.insert(node.clone());
                }
                _ => return Err(invalid(object, predicate)),
            }
        } else if predicate == registry::PREDICATE_LIST_IS_COMPLETE {
            predicate_list_complete = boolean(object, predicate)?;
        } else if predicate == registry::SUBJECT_REGEX {
            subject_regex = Some(lexical(object, predicate)?.to_owned());
        } else if predicate == registry::SUBJECT_REGEX_IS_COMPLETE {
            subject_regex_complete = boolean(object, predicate)?;
        } else if predicate == registry::OBJECT_REGEX {
            object_regex = Some(lexical(object, predicate)?.to_owned());
        } else if predicate == registry::OBJECT_REGEX_IS_COMPLETE {
            object_regex_complete = boolean(object, predicate)?;
        } else if predicate == registry::NUM_TRIPLES {
            if triple_count.is_some() {
                return Err(CorruptionError::msg(format!(
                    "{endpoint} has more than one triple count"
                )));
            }
            triple_count = Some(TripleCount::Exact(unsigned(object, predicate)?));
        } else if predicate == registry::NUM_TRIPLES_LOWER_BOUND {
            if triple_count.is_some() {
                return Err(CorruptionError::msg(format!(
                    "{endpoint} has more than one triple count"
                )));
            }
            triple_count = Some(TripleCount::LowerBound(unsigned(object, predicate)?));
        } else if predicate == registry::RESULTS_LIMIT {
            results_limit = Some(unsigned(object, predicate)?);
        } else if predicate == registry::LAST_UPDATED {
            let value = OffsetDateTime::parse(lexical(object, predicate)?, &Rfc3339)
                .map_err(CorruptionError::new)?;
            last_updated = Some(value);
        }
    }

    let Some(status) = status else {
        return Err(CorruptionError::msg(format!(
            "{endpoint} has facts but no {}",
            registry::ENDPOINT_STATUS
        )));
    };

    Ok(Some(IndexRecord {
        endpoint: endpoint.clone(),
        endpoint_type: endpoint_type.unwrap_or_default(),
        status,
        predicates,
        predicate_list_complete,
        subject_regex: subject_regex.map(|p| UriRegex::new(p, subject_regex_complete)),
        object_regex: object_regex.map(|p| UriRegex::new(p, object_regex_complete)),
        triple_count,
        results_limit: results_limit.unwrap_or(DEFAULT_RESULTS_LIMIT),
        last_updated,
    }))
}

fn invalid(object: &Term, predicate: NamedNodeRef<'_>) -> CorruptionError {
    CorruptionError::msg(format!("invalid object {object} for {predicate}"))
}

fn lexical<'a>(object: &'a Term, predicate: NamedNodeRef<'_>) -> Result<&'a str, CorruptionError> {
    match object {
        Term::Literal(literal) => Ok(literal.value()),
        _ => Err(invalid(object, predicate)),
    }
}

fn boolean(object: &Term, predicate: NamedNodeRef<'_>) -> Result<bool, CorruptionError> {
    match lexical(object, predicate)? {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(object, predicate)),
    }
}

fn unsigned(object: &Term, predicate: NamedNodeRef<'_>) -> Result<u64, CorruptionError> {
    lexical(object, predicate)?
        .parse()
        .map_err(|_| invalid(object, predicate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> NamedNode {
        NamedNode::new_unchecked("http://example.com/sparql")
    }

    fn full_record() -> IndexRecord {
        IndexRecord {
            endpoint: endpoint(),
            endpoint_type: EndpointType::LimitedFilterSupport,
            status: EndpointStatus::Slow,
            predicates: [
                NamedNode::new_unchecked("http://example.com/p"),
                NamedNode::new_unchecked("http://example.com/q"),
            ]
            .into_iter()
            .collect(),
            predicate_list_complete: true,
            subject_regex: Some(UriRegex::new("^http://example\\.com/", true)),
            object_regex: Some(UriRegex::new("^urn:", false)),
            triple_count: Some(TripleCount::LowerBound(1_000)),
            results_limit: 10_000,
            last_updated: Some(OffsetDateTime::UNIX_EPOCH),
        }
    }

    fn encode(record: &IndexRecord) -> Vec<Triple> {
        fact_sets(record)
            .iter()
            .flat_map(|facts| facts.to_triples(&record.endpoint).unwrap())
            .collect()
    }

    #[test]
    fn decode_restores_encoded_record() {
        let record = full_record();
        let decoded = decode_record(&endpoint(), &encode(&record)).unwrap();
        assert_eq!(decoded, Some(record));
    }

    #[test]
    fn every_triple_is_in_the_scope_of_its_fact_set() {
        for facts in fact_sets(&full_record()) {
            for triple in facts.to_triples(&endpoint()).unwrap() {
                assert!(
                    facts.scope().contains(&triple.predicate.as_ref()),
                    "{triple} not in scope of {facts:?}"
                );
            }
        }
    }

    #[test]
    fn missing_results_limit_uses_default() {
        let triples = vec![Triple::new(
            endpoint(),
            registry::ENDPOINT_STATUS.into_owned(),
            Literal::new_simple_literal("OK"),
        )];
        let record = decode_record(&endpoint(), &triples).unwrap().unwrap();
        assert_eq!(record.results_limit, DEFAULT_RESULTS_LIMIT);
        assert_eq!(record.endpoint_type, EndpointType::Standard);
    }

    #[test]
    fn no_triples_means_no_record() {
        assert_eq!(decode_record(&endpoint(), &[]).unwrap(), None);
    }

    #[test]
    fn missing_status_is_corruption() {
        let triples = vec![Triple::new(
            endpoint(),
            registry::RESULTS_LIMIT.into_owned(),
            Literal::new_typed_literal("10", xsd::LONG),
        )];
        assert!(decode_record(&endpoint(), &triples).is_err());
    }

    #[test]
    fn both_triple_counts_is_corruption() {
        let triples = vec![
            Triple::new(
                endpoint(),
                registry::ENDPOINT_STATUS.into_owned(),
                Literal::new_simple_literal("OK"),
            ),
            Triple::new(
                endpoint(),
                registry::NUM_TRIPLES.into_owned(),
                Literal::new_typed_literal("3", xsd::LONG),
            ),
            Triple::new(
                endpoint(),
                registry::NUM_TRIPLES_LOWER_BOUND.into_owned(),
                Literal::new_typed_literal("3", xsd::LONG),
            ),
        ];
        assert!(decode_record(&endpoint(), &triples).is_err());
    }

    #[test]
    fn unknown_status_is_corruption() {
        let triples = vec![Triple::new(
            endpoint(),
            registry::ENDPOINT_STATUS.into_owned(),
            Literal::new_simple_literal("MAYBE"),
        )];
        assert!(decode_record(&endpoint(), &triples).is_err());
    }
}
