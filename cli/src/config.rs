use anyhow::Context;
use serde::Deserialize;
use sparql_index::engine::IndexerConfig;
use sparql_index::model::NamedNode;
use sparql_index::storage::RegistryConfig;
use std::fs;
use std::path::Path;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub log_level: Option<String>,
    pub indexer: IndexerConfig,
    pub registry: RegistrySection,
}

/// The `[registry]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    pub index_graph: Option<String>,
    pub ontology_graph: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn registry_config(&self) -> anyhow::Result<RegistryConfig> {
        let mut config = RegistryConfig::default();
        if let Some(graph) = &self.registry.index_graph {
            config.index_graph = NamedNode::new(graph)
                .with_context(|| format!("Invalid index graph IRI {graph}"))?;
        }
        if let Some(graph) = &self.registry.ontology_graph {
            config.ontology_graph = NamedNode::new(graph)
                .with_context(|| format!("Invalid ontology graph IRI {graph}"))?;
        }
        Ok(config)
    }
}
