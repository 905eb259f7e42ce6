use crate::error::RegistryError;
use async_trait::async_trait;
use sparql_index_model::{NamedNode, NamedNodeRef, TermRef, Triple};

/// The triple store persisting the registry, addressed by named graphs.
///
/// The store knows nothing about endpoints or index records. It only guarantees that
/// [RegistryStore::replace] is atomic with respect to other operations on the same store.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Returns all triples of `graph` whose subject is `subject`.
    async fn triples_for_subject(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
    ) -> Result<Vec<Triple>, RegistryError>;

    /// Returns the distinct IRI subjects of `graph` that have `predicate`, optionally restricted
    /// to a given object.
    async fn subjects_for(
        &self,
        graph: NamedNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
        object: Option<TermRef<'_>>,
    ) -> Result<Vec<NamedNode>, RegistryError>;

    /// Deletes the triples of `subject` in `graph` and inserts `triples`.
    ///
    /// If `scope` is given, only the triples whose predicate is in `scope` are deleted. Otherwise,
    /// every triple of `subject` is deleted.
    async fn replace(
        &self,
        graph: NamedNodeRef<'_>,
        subject: NamedNodeRef<'_>,
        scope: Option<&[NamedNode]>,
        triples: Vec<Triple>,
    ) -> Result<(), RegistryError>;

    /// Removes every triple of `graph`.
    async fn clear_graph(&self, graph: NamedNodeRef<'_>) -> Result<(), RegistryError>;
}
