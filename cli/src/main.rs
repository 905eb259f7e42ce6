#![allow(clippy::print_stdout)]
use crate::cli::{Args, Command, RegexCommand, ResultsLimitCommand, StatusCommand};
use crate::config::{FileConfig, DEFAULT_LOG_LEVEL};
use anyhow::{bail, Context};
use clap::Parser;
use sparql_index::admin::RegistryAdmin;
use sparql_index::client::HttpConnector;
use sparql_index::common::{EndpointClient, EndpointConnector};
use sparql_index::engine::IndexError;
use sparql_index::model::{EndpointStatus, IndexRecord, NamedNode};
use sparql_index::storage::{MemRegistryStore, Registry, SparqlRegistryStore};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;
mod logger;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    logger::init(
        args.log_level.as_deref().or(config.log_level.as_deref()),
        DEFAULT_LOG_LEVEL,
    )?;

    let mut indexer = config.indexer.clone();
    if let Command::Index {
        max_results: Some(max_results),
        ..
    } = &args.command
    {
        indexer.max_triples = Some(*max_results);
    }

    let connector = Arc::new(HttpConnector::new()?);
    let (registry, file_store) = open_registry(&args, &config, &connector)?;
    let admin = RegistryAdmin::new(registry, connector, indexer)?;

    let failures = run(&admin, args.command).await?;

    if let Some((store, path)) = file_store {
        store
            .dump_file(&path)
            .await
            .with_context(|| format!("Failed to write the registry to {}", path.display()))?;
    }
    if failures > 0 {
        bail!("{failures} operation(s) failed");
    }
    Ok(())
}

/// Opens the registry. For a file registry, the store is returned too so it can be saved.
fn open_registry(
    args: &Args,
    config: &FileConfig,
    connector: &HttpConnector,
) -> anyhow::Result<(Registry, Option<(Arc<MemRegistryStore>, PathBuf)>)> {
    let registry_config = config.registry_config()?;
    if let Some(path) = &args.registry_file {
        let store = Arc::new(
            MemRegistryStore::load_file(path)
                .with_context(|| format!("Failed to read the registry from {}", path.display()))?,
        );
        let registry = Registry::new(store.clone(), registry_config);
        return Ok((registry, Some((store, path.clone()))));
    }
    let Some(endpoint) = &args.registry_endpoint else {
        bail!("Either --registry-file or --registry-endpoint must be set")
    };
    let endpoint = parse_iri(endpoint)?;
    let client: Arc<dyn EndpointClient> = match &args.registry_update_endpoint {
        Some(update_endpoint) => {
            Arc::new(connector.connect_with_update(endpoint, parse_iri(update_endpoint)?))
        }
        None => connector.connect(&endpoint)?,
    };
    let store = SparqlRegistryStore::new(client, config.indexer.query_timeout());
    Ok((Registry::new(Arc::new(store), registry_config), None))
}

/// Runs the command and returns the number of failed operations.
async fn run(admin: &RegistryAdmin, command: Command) -> anyhow::Result<usize> {
    let mut failures = 0;
    match command {
        Command::Add {
            endpoints,
            endpoint_type,
        } => {
            for endpoint in parse_iris(&endpoints)? {
                let result = admin
                    .add_endpoint(&endpoint, endpoint_type, EndpointStatus::Ok)
                    .await;
                failures += report(&endpoint, result, |()| None);
            }
        }
        Command::Remove { endpoints } => {
            for endpoint in parse_iris(&endpoints)? {
                let result = admin.remove_endpoint(&endpoint).await;
                failures += report(&endpoint, result, |()| None);
            }
        }
        Command::Index {
            endpoints,
            roots,
            max_depth,
            ..
        } => {
            let endpoints = endpoints_or_all(admin, &endpoints).await?;
            let roots = parse_iris(&roots)?;
            for (endpoint, result) in admin.index_endpoints(&endpoints, &roots, max_depth).await {
                failures += report(&endpoint, result, |outcome| {
                    Some(format!("{} {}", outcome.strategy, outcome.record.status))
                });
            }
        }
        Command::Status { action } => match action {
            StatusCommand::Set { status, endpoints } => {
                for endpoint in parse_iris(&endpoints)? {
                    let result = admin.set_endpoint_status(&endpoint, status).await;
                    failures += report(&endpoint, result, |()| None);
                }
            }
            StatusCommand::Refresh { endpoints } if endpoints.is_empty() => {
                for (endpoint, result) in admin.refresh_all_statuses().await? {
                    failures += report(&endpoint, result, |status| Some(status.to_string()));
                }
            }
            StatusCommand::Refresh { endpoints } => {
                for endpoint in parse_iris(&endpoints)? {
                    let result = admin.refresh_endpoint_status(&endpoint).await;
                    failures += report(&endpoint, result, |status| Some(status.to_string()));
                }
            }
        },
        Command::ResultsLimit { action } => match action {
            ResultsLimitCommand::Set { limit, endpoints } => {
                for endpoint in parse_iris(&endpoints)? {
                    let result = admin.set_results_limit(&endpoint, limit).await;
                    failures += report(&endpoint, result, |()| None);
                }
            }
            ResultsLimitCommand::Refresh { endpoints } => {
                for endpoint in endpoints_or_all(admin, &endpoints).await? {
                    let result = admin.refresh_results_limit(&endpoint).await;
                    failures += report(&endpoint, result, |limit| Some(limit.to_string()));
                }
            }
        },
        Command::Regex {
            action: RegexCommand::Refresh { endpoints },
        } => {
            for endpoint in endpoints_or_all(admin, &endpoints).await? {
                let result = admin.refresh_regexes(&endpoint).await;
                failures += report(&endpoint, result, |(subject_regex, object_regex)| {
                    Some(format!(
                        "subjects: {} objects: {}",
                        optional(subject_regex.map(|r| r.pattern)),
                        optional(object_regex.map(|r| r.pattern))
                    ))
                });
            }
        }
        Command::ClassifyPredicates { endpoints } => {
            for endpoint in endpoints_or_all(admin, &endpoints).await? {
                let result = admin.classify_predicates(&endpoint).await;
                failures += report(&endpoint, result, |facts| {
                    Some(format!("{} predicates classified", facts.len()))
                });
            }
        }
        Command::RemoveAmbiguous => {
            for fact in admin.remove_ambiguous_predicates().await? {
                println!("{} {}", fact.predicate, fact.kind);
            }
        }
        Command::Clear => admin.clear_registry().await?,
        Command::Show { endpoints } => {
            for endpoint in endpoints_or_all(admin, &endpoints).await? {
                match admin.record(&endpoint).await? {
                    Some(record) => print_record(&record),
                    None => {
                        tracing::error!(%endpoint, "Endpoint is not registered");
                        failures += 1;
                    }
                }
            }
        }
    }
    Ok(failures)
}

/// Logs the result of an operation on `endpoint` and prints the line produced by `summary`.
/// Returns the number of failures, 0 or 1.
fn report<T>(
    endpoint: &NamedNode,
    result: Result<T, IndexError>,
    summary: impl FnOnce(T) -> Option<String>,
) -> usize {
    match result {
        Ok(value) => {
            if let Some(line) = summary(value) {
                println!("{} {line}", endpoint.as_str());
            }
            0
        }
        Err(error) => {
            tracing::error!(%endpoint, %error, "Operation failed");
            1
        }
    }
}

fn print_record(record: &IndexRecord) {
    println!("{}", record.endpoint.as_str());
    println!("  type: {}", record.endpoint_type);
    println!("  status: {}", record.status);
    println!(
        "  predicates: {}{}",
        record.predicates.len(),
        if record.predicate_list_complete {
            " (complete)"
        } else {
            ""
        }
    );
    for predicate in &record.predicates {
        println!("    {}", predicate.as_str());
    }
    for (name, regex) in [
        ("subject regex", &record.subject_regex),
        ("object regex", &record.object_regex),
    ] {
        if let Some(regex) = regex {
            let complete = if regex.complete { " (complete)" } else { "" };
            println!("  {name}: {}{complete}", regex.pattern);
        }
    }
    println!("  triples: {}", optional(record.triple_count));
    println!("  results limit: {}", record.results_limit);
    println!("  last updated: {}", optional(record.last_updated));
}

fn optional(value: Option<impl Display>) -> String {
    value.map_or_else(|| "unknown".to_owned(), |value| value.to_string())
}

async fn endpoints_or_all(
    admin: &RegistryAdmin,
    endpoints: &[String],
) -> anyhow::Result<Vec<NamedNode>> {
    if endpoints.is_empty() {
        Ok(admin.endpoints().await?)
    } else {
        parse_iris(endpoints)
    }
}

fn parse_iris(iris: &[String]) -> anyhow::Result<Vec<NamedNode>> {
    iris.iter().map(|iri| parse_iri(iri)).collect()
}

fn parse_iri(iri: &str) -> anyhow::Result<NamedNode> {
    NamedNode::new(iri).with_context(|| format!("Invalid IRI {iri}"))
}
