use clap::{Parser, Subcommand, ValueHint};
use sparql_index::model::{EndpointStatus, EndpointType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparql-index")]
/// Maintains an index of SPARQL endpoints
pub struct Args {
    /// TOML configuration file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Log level, or a tracing filter directive like "sparql_index_engine=debug"
    ///
    /// Overrides the level of the configuration file. If neither is set, RUST_LOG is used.
    #[arg(long)]
    pub log_level: Option<String>,
    /// File holding the registry
    ///
    /// The file is read before and written after running the command. Its format is guessed from
    /// the extension, N-Quads by default.
    #[arg(
        long,
        required_unless_present = "registry_endpoint",
        conflicts_with = "registry_endpoint",
        value_hint = ValueHint::FilePath
    )]
    pub registry_file: Option<PathBuf>,
    /// SPARQL endpoint of the triple store holding the registry
    #[arg(long, value_hint = ValueHint::Url)]
    pub registry_endpoint: Option<String>,
    /// SPARQL update endpoint of the triple store holding the registry
    ///
    /// By default updates are sent to the registry endpoint.
    #[arg(long, requires = "registry_endpoint", value_hint = ValueHint::Url)]
    pub registry_update_endpoint: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register endpoints without indexing them
    Add {
        /// Endpoint URLs
        #[arg(required = true, value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
        /// "standard", or "limited-filter-support" for endpoints that cannot filter by regex
        #[arg(long = "type", default_value = "standard")]
        endpoint_type: EndpointType,
    },
    /// Remove endpoints and all of their facts
    Remove {
        /// Endpoint URLs
        #[arg(required = true, value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
    /// Index registered endpoints
    Index {
        /// Endpoint URLs
        ///
        /// By default all registered endpoints are indexed.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
        /// Crawl from this resource instead of querying the whole endpoint
        #[arg(long = "root", value_hint = ValueHint::Url)]
        roots: Vec<String>,
        /// Depth bound of the crawl
        #[arg(long, requires = "roots")]
        max_depth: Option<usize>,
        /// Stop iterating over the triples of an endpoint after this many
        #[arg(long)]
        max_results: Option<u64>,
    },
    /// Set or refresh the status of endpoints
    Status {
        #[command(subcommand)]
        action: StatusCommand,
    },
    /// Set or measure the results limit of endpoints
    ResultsLimit {
        #[command(subcommand)]
        action: ResultsLimitCommand,
    },
    /// Recompute the subject and object regexes of endpoints
    Regex {
        #[command(subcommand)]
        action: RegexCommand,
    },
    /// Classify the predicates of endpoints as datatype or object properties
    ClassifyPredicates {
        /// Endpoint URLs
        ///
        /// By default the predicates of all registered endpoints are classified.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
    /// Remove predicates that are used both as datatype and as object property
    RemoveAmbiguous,
    /// Remove all endpoints and predicate classifications
    Clear,
    /// Print the records of endpoints
    Show {
        /// Endpoint URLs
        ///
        /// By default all registered endpoints are printed.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum StatusCommand {
    /// Record a status
    Set {
        /// "ok", "slow", "dead" or "incorrect"
        status: EndpointStatus,
        /// Endpoint URLs
        #[arg(required = true, value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
    /// Ping endpoints and record them as OK or DEAD
    Refresh {
        /// Endpoint URLs
        ///
        /// By default all registered endpoints are pinged.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ResultsLimitCommand {
    /// Record a results limit
    Set {
        limit: u64,
        /// Endpoint URLs
        #[arg(required = true, value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
    /// Probe endpoints for the largest result window they answer in time
    Refresh {
        /// Endpoint URLs
        ///
        /// By default all registered endpoints are probed.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum RegexCommand {
    /// Rebuild the regexes with filter queries
    Refresh {
        /// Endpoint URLs
        ///
        /// By default the regexes of all registered endpoints are rebuilt.
        #[arg(value_hint = ValueHint::Url)]
        endpoints: Vec<String>,
    },
}
