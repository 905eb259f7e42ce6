use async_trait::async_trait;
use oxrdfio::{RdfFormat, RdfParser, RdfSerializer};
use sparql_index_common::error::RegistryError;
use sparql_index_common::RegistryStore;
use sparql_index_model::{
    Dataset, GraphName, GraphNameRef, NamedNode, NamedNodeRef, Quad, QuadRef, Subject, SubjectRef,
    TermRef, Triple,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tokio::sync::RwLock;

/// A [RegistryStore] keeping the registry in memory.
///
/// The content can be loaded from and dumped to any dataset serialization supported by `oxrdfio`.
#[derive(Default)]
pub struct MemRegistryStore {
    dataset: RwLock<Dataset>,
}

impl MemRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the quads of `reader`.
    pub fn load(reader: impl Read, format: RdfFormat) -> Result<Self, RegistryError> {
        let mut dataset = Dataset::new();
        for quad in RdfParser::from_format(format).for_reader(reader) {
            let quad = quad.map_err(|e| RegistryError::Parse(Box::new(e)))?;
            dataset.insert(&quad);
        }
        Ok(Self {
            dataset: RwLock::new(dataset),
        })
    }

    /// Creates a store from a file. The format is guessed from the file extension and a missing
    /// file yields an empty store.
    pub fn load_file(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Registry file does not exist, starting empty");
            return Ok(Self::new());
        }
        let format = format_for_path(path)?;
        Self::load(BufReader::new(File::open(path)?), format)
    }

    /// Writes all quads to `writer`.
    pub async fn dump<W: Write>(&self, writer: W, format: RdfFormat) -> Result<W, RegistryError> {
        let dataset = self.dataset.read().await;
        let mut serializer = RdfSerializer::from_format(format).for_writer(writer);
        for quad in dataset.iter() {
            serializer.serialize_quad(quad)?;
        }
        Ok(serializer.finish()?)
    }

    /// Writes all quads to a file, in the format matching its extension.
    pub async fn dump_file(&self, path: &Path) -> Result<(), RegistryError> {
        let format = format_for_path(path)?;
        let mut writer = self
            .dump(BufWriter::new(File::create(path)?), format)
            .await?;
        writer.flush()?;
        Ok(())
    }

    /// Returns a copy of the content of the store.
    pub async fn snapshot(&self) -> Dataset {
        self.dataset.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.dataset.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.dataset.read().await.is_empty()
    }
}

fn format_for_path(path: &Path) -> Result<RdfFormat, RegistryError> {
    let format = path
        .extension()
        .and_then(|extension| extension.to_str())
        .and_then(RdfFormat::from_extension)
        .unwrap_or(RdfFormat::NQuads);
    if !format.supports_datasets() {
        return Err(RegistryError::Parse(
            format!(
                "{} cannot hold named graphs, use N-Quads or TriG",
                path.display()
            )
            .into(),
        ));
    }
    Ok(format)
}

fn in_graph(quad: &QuadRef<'_>, graph: NamedNodeRef<'_>) -> bool {
    quad.graph_name == GraphNameRef::NamedNode(graph)
}

#[async_trait]
impl RegistryStore for MemRegistryStore {
    async fn triples_for_subject(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
    ) -> Result<Vec<Triple>, RegistryError> {
        let dataset = self.dataset.read().await;
        Ok(dataset
            .quads_for_subject(subject)
            .filter(|q| in_graph(q, graph))
            .map(|q| {
                Triple::new(
                    q.subject.into_owned(),
                    q.predicate.into_owned(),
                    q.object.into_owned(),
                )
            })
            .collect())
    }

    async fn subjects_for(
        &self,
        graph: NamedNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<NamedNode>, RegistryError> {
        let dataset = self.dataset.read().await;
        let subjects = dataset
            .quads_for_predicate(predicate)
            .filter(|q| in_graph(q, graph))
            .filter(|q| object.map_or(true, |object| q.object == object))
            .filter_map(|q| match q.subject {
                SubjectRef::NamedNode(node) => Some(node.into_owned()),
                _ => None,
            })
            .collect::<BTreeSet<_>>();
        Ok(subjects.into_iter().collect())
    }

    async fn replace(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
        scope: Option<&[NamedNode]>,
        triples: Vec<Triple>,
    ) -> Result<(), RegistryError> {
        let mut dataset = self.dataset.write().await;
        let removed = dataset
            .quads_for_subject(subject)
            .filter(|q| in_graph(q, graph))
            .filter(|q| {
                scope.map_or(true, |scope| scope.iter().any(|p| p.as_ref() == q.predicate))
            })
            .map(QuadRef::into_owned)
            .collect::<Vec<_>>();
        for quad in &removed {
            dataset.remove(quad);
        }

        let graph_name = GraphName::NamedNode(graph.into_owned());
        for triple in triples {
            if triple.subject != Subject::NamedNode(subject.into_owned()) {
                tracing::warn!(%subject, %triple, "Ignoring fact about a different subject");
                continue;
            }
            dataset.insert(&Quad::new(
                triple.subject,
                triple.predicate,
                triple.object,
                graph_name.clone(),
            ));
        }
        tracing::trace!(%graph, %subject, removed = removed.len(), "Replaced facts");
        Ok(())
    }

    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), RegistryError> {
        let mut dataset = self.dataset.write().await;
        let removed = dataset
            .quads_for_graph_name(graph)
            .map(QuadRef::into_owned)
            .collect::<Vec<_>>();
        for quad in &removed {
            dataset.remove(quad);
        }
        Ok(())
    }
}
