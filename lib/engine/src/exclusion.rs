use regex::Regex;
use sparql_index_model::NamedNodeRef;

/// Decides which predicates are recorded in the registry.
#[derive(Debug, Clone, Default)]
pub struct PredicateFilter {
    excluded: Vec<Regex>,
}

impl PredicateFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let excluded = patterns
            .iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { excluded })
    }

    pub fn allows(&self, predicate: NamedNodeRef<'_>) -> bool {
        !self
            .excluded
            .iter()
            .any(|pattern| pattern.is_match(predicate.as_str()))
    }
}
