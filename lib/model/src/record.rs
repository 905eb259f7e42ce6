use crate::vocab::registry;
use crate::UnknownVariantError;
use oxrdf::{NamedNode, NamedNodeRef};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::OffsetDateTime;

/// The results limit recorded for an endpoint when probing could not measure one.
pub const DEFAULT_RESULTS_LIMIT: u64 = 50_000;

/// Distinguishes engines by the SPARQL features they support.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointType {
    /// Supports the full SPARQL 1.1 query language.
    #[default]
    Standard,
    /// Cannot evaluate `FILTER(regex(...))`. Regexes must be derived by iteration.
    LimitedFilterSupport,
}

impl EndpointType {
    /// Whether `FILTER(regex(...))` can be used against endpoints of this type.
    pub fn supports_regex_filter(self) -> bool {
        matches!(self, Self::Standard)
    }

    /// The class used as `rdf:type` object in the registry.
    pub fn class(self) -> NamedNodeRef<'static> {
        match self {
            Self::Standard => registry::STANDARD_ENDPOINT,
            Self::LimitedFilterSupport => registry::LIMITED_FILTER_SUPPORT_ENDPOINT,
        }
    }

    /// Inverse of [Self::class].
    pub fn from_class(class: NamedNodeRef<'_>) -> Option<Self> {
        if class == registry::STANDARD_ENDPOINT {
            Some(Self::Standard)
        } else if class == registry::LIMITED_FILTER_SUPPORT_ENDPOINT {
            Some(Self::LimitedFilterSupport)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::LimitedFilterSupport => "LIMITED_FILTER_SUPPORT",
        }
    }
}

impl Display for EndpointType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointType {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "STANDARD" => Ok(Self::Standard),
            "LIMITED_FILTER_SUPPORT" => Ok(Self::LimitedFilterSupport),
            _ => Err(UnknownVariantError::new("endpoint type", s)),
        }
    }
}

/// The liveness of an endpoint as observed by the most recent successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EndpointStatus {
    Ok,
    /// Reachable, but aggregate queries fail or time out.
    Slow,
    Dead,
    /// Reachable, but answers are wrong or malformed.
    Incorrect,
}

impl EndpointStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Slow => "SLOW",
            Self::Dead => "DEAD",
            Self::Incorrect => "INCORRECT",
        }
    }
}

impl Display for EndpointStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointStatus {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(Self::Ok),
            "SLOW" => Ok(Self::Slow),
            "DEAD" => Ok(Self::Dead),
            "INCORRECT" => Ok(Self::Incorrect),
            _ => Err(UnknownVariantError::new("endpoint status", s)),
        }
    }
}

/// The number of triples in an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripleCount {
    Exact(u64),
    /// The endpoint holds at least this many triples.
    LowerBound(u64),
}

impl TripleCount {
    pub fn value(self) -> u64 {
        match self {
            Self::Exact(value) | Self::LowerBound(value) => value,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// The predicate under which this count is persisted.
    pub fn predicate(self) -> NamedNodeRef<'static> {
        match self {
            Self::Exact(_) => registry::NUM_TRIPLES,
            Self::LowerBound(_) => registry::NUM_TRIPLES_LOWER_BOUND,
        }
    }
}

impl Display for TripleCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "{value} (exact)"),
            Self::LowerBound(value) => write!(f, ">= {value}"),
        }
    }
}

/// A regular expression summarizing the IRIs at one position of an endpoint's triples.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriRegex {
    pub pattern: String,
    /// Whether every IRI of the position is guaranteed to match [Self::pattern].
    pub complete: bool,
}

impl UriRegex {
    /// The pattern of a position known to hold no IRI. It only matches the empty string, which is
    /// never an IRI.
    pub const NO_URIS_PATTERN: &'static str = "^$";

    pub fn new(pattern: impl Into<String>, complete: bool) -> Self {
        Self {
            pattern: pattern.into(),
            complete,
        }
    }

    /// The complete regex of a position without any IRI.
    pub fn no_uris() -> Self {
        Self::new(Self::NO_URIS_PATTERN, true)
    }
}

/// Everything the registry knows about a single endpoint.
///
/// The record is the unit of registry truth. Each field maps to one predicate of the registry
/// vocabulary (see [`crate::vocab::registry`]) with the endpoint as subject. Fields that have not
/// been computed yet are `None` (or empty), except for [`Self::results_limit`], which always
/// holds either a measured value or [`DEFAULT_RESULTS_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub endpoint: NamedNode,
    pub endpoint_type: EndpointType,
    pub status: EndpointStatus,
    pub predicates: BTreeSet<NamedNode>,
    pub predicate_list_complete: bool,
    pub subject_regex: Option<UriRegex>,
    pub object_regex: Option<UriRegex>,
    pub triple_count: Option<TripleCount>,
    pub results_limit: u64,
    pub last_updated: Option<OffsetDateTime>,
}

impl IndexRecord {
    /// Creates the record written by an "add endpoint" operation.
    pub fn new(endpoint: NamedNode, endpoint_type: EndpointType, status: EndpointStatus) -> Self {
        Self {
            endpoint,
            endpoint_type,
            status,
            predicates: BTreeSet::new(),
            predicate_list_complete: false,
            subject_regex: None,
            object_regex: None,
            triple_count: None,
            results_limit: DEFAULT_RESULTS_LIMIT,
            last_updated: None,
        }
    }

    pub fn subject_regex_complete(&self) -> bool {
        self.subject_regex.as_ref().is_some_and(|r| r.complete)
    }

    pub fn object_regex_complete(&self) -> bool {
        self.object_regex.as_ref().is_some_and(|r| r.complete)
    }

    /// Compares two records ignoring [Self::last_updated].
    pub fn same_facts(&self, other: &Self) -> bool {
        Self {
            last_updated: None,
            ..self.clone()
        } == Self {
            last_updated: None,
            ..other.clone()
        }
    }
}
