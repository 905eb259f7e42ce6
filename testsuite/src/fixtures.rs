//! Helpers for building test data.

use sparql_index_model::{Literal, NamedNode, Term, Triple};

pub const EX: &str = "http://example.com/";

/// Creates an IRI in the `http://example.com/` namespace.
pub fn ex(local: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{EX}{local}"))
}

pub fn triple(subject: &NamedNode, predicate: &NamedNode, object: impl Into<Term>) -> Triple {
    Triple::new(subject.clone(), predicate.clone(), object)
}

pub fn literal(value: &str) -> Literal {
    Literal::new_simple_literal(value)
}

/// The three triples `(A, p, B)`, `(A, p, C)` and `(D, q, "lit")`.
pub fn three_triples() -> Vec<Triple> {
    vec![
        triple(&ex("a/A"), &ex("p"), ex("b/B")),
        triple(&ex("a/A"), &ex("p"), ex("c/C")),
        triple(&ex("d/D"), &ex("q"), literal("lit")),
    ]
}

/// `count` triples `(<base>/i, p, i)`.
pub fn numbered_triples(base: &str, count: usize) -> Vec<Triple> {
    (0..count)
        .map(|i| {
            triple(
                &NamedNode::new_unchecked(format!("{base}/{i}")),
                &ex("p"),
                literal(&i.to_string()),
            )
        })
        .collect()
}
