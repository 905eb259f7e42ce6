//! The indexing engine.
//!
//! [IndexBuilder] turns an endpoint into an [`IndexRecord`](sparql_index_model::IndexRecord)
//! using one of three strategies:
//!
//! - **query**: `SELECT DISTINCT ?p`, `COUNT(*)`, and regexes grown by asking for URIs they do not
//!   match yet,
//! - **iteration**: paging through all triples, for endpoints without regex filters or when
//!   queries fail,
//! - **traversal**: a breadth-first crawl from root resources, for endpoints too large for either.
//!
//! The [ResultLimitProber] measures the page size an endpoint can answer, and the
//! [AmbiguousPredicateDetector] maintains the predicate classifications of the registry.

mod ambiguity;
mod builder;
mod config;
mod error;
mod exclusion;
mod iteration;
mod prober;
mod summarizer;
mod traversal;

pub use ambiguity::AmbiguousPredicateDetector;
pub use builder::{IndexBuilder, IndexOutcome, IndexStrategy, IndexingState};
pub use config::*;
pub use error::{IndexError, ProbeError};
pub use exclusion::PredicateFilter;
pub use iteration::TripleIterator;
pub use prober::ResultLimitProber;
pub use summarizer::{uri_prefix, AddOutcome, UriPrefixSummarizer};
pub use traversal::{TraversalSummary, TypedBfsTraverser};
