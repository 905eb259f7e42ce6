use serde::Deserialize;
use sparql_index_model::DEFAULT_RESULTS_LIMIT;
use std::time::Duration;

/// The longest subject or object regex that is ever recorded.
pub const REGEX_MAX_LENGTH: usize = 2048;
/// The depth bound of a traversal when none is given.
pub const MAX_TRAVERSAL_DEPTH: usize = 7;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROBE_START_SIZE: u64 = 1;
pub const DEFAULT_PROBE_MAX_STEPS: usize = 64;
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Tuning of the indexing engine.
///
/// Read from the `[indexer]` table of the configuration file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerConfig {
    pub regex_max_length: usize,
    /// Recorded as results limit when probing fails.
    pub default_results_limit: u64,
    pub max_traversal_depth: usize,
    /// Timeout of every query except probe queries, in seconds.
    pub query_timeout_secs: u64,
    /// Timeout of a single probe query, in seconds.
    pub probe_timeout_secs: u64,
    pub probe_start_size: u64,
    /// Upper bound on the number of probe queries for one endpoint.
    pub probe_max_steps: usize,
    /// Number of triples requested per page when iterating.
    pub page_size: u64,
    /// Stop iterating after this many triples. The run then counts as truncated.
    pub max_triples: Option<u64>,
    /// Predicates matching any of these regular expressions are never recorded.
    pub excluded_predicates: Vec<String>,
    /// Number of endpoints indexed concurrently.
    pub max_workers: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            regex_max_length: REGEX_MAX_LENGTH,
            default_results_limit: DEFAULT_RESULTS_LIMIT,
            max_traversal_depth: MAX_TRAVERSAL_DEPTH,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            probe_start_size: DEFAULT_PROBE_START_SIZE,
            probe_max_steps: DEFAULT_PROBE_MAX_STEPS,
            page_size: DEFAULT_RESULTS_LIMIT,
            max_triples: None,
            excluded_predicates: Vec::new(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl IndexerConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_yields_defaults() {
        let config: IndexerConfig = toml::from_str("").unwrap();
        assert_eq!(config, IndexerConfig::default());
        assert_eq!(config.regex_max_length, 2048);
        assert_eq!(config.default_results_limit, 50_000);
        assert_eq!(config.max_traversal_depth, 7);
    }

    #[test]
    fn fields_can_be_overridden() {
        let config: IndexerConfig = toml::from_str(
            r#"
            probe_timeout_secs = 5
            max_triples = 1000
            excluded_predicates = ["^http://www\\.w3\\.org/2002/07/owl#sameAs$"]
            "#,
        )
        .unwrap();
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_triples, Some(1000));
        assert_eq!(config.excluded_predicates.len(), 1);
        assert_eq!(config.query_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<IndexerConfig>("probe_timeout = 5").is_err());
    }
}
