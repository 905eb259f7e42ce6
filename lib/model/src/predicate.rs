use crate::vocab::owl;
use oxrdf::{NamedNode, NamedNodeRef};
use std::fmt::{Display, Formatter};

/// Whether a predicate relates resources to literals or to other resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// Objects are literals.
    Datatype,
    /// Objects are IRIs or blank nodes.
    Object,
}

impl PropertyKind {
    pub fn class(self) -> NamedNodeRef<'static> {
        match self {
            Self::Datatype => owl::DATATYPE_PROPERTY,
            Self::Object => owl::OBJECT_PROPERTY,
        }
    }

    pub fn from_class(class: NamedNodeRef<'_>) -> Option<Self> {
        if class == owl::DATATYPE_PROPERTY {
            Some(Self::Datatype)
        } else if class == owl::OBJECT_PROPERTY {
            Some(Self::Object)
        } else {
            None
        }
    }

    /// The kind a conflicting object would have.
    pub fn opposite(self) -> Self {
        match self {
            Self::Datatype => Self::Object,
            Self::Object => Self::Datatype,
        }
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Datatype => f.write_str("datatype property"),
            Self::Object => f.write_str("object property"),
        }
    }
}

/// A classification of a predicate, stored in the ontology graph of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredicateFact {
    pub predicate: NamedNode,
    pub kind: PropertyKind,
}

impl PredicateFact {
    pub fn new(predicate: NamedNode, kind: PropertyKind) -> Self {
        Self { predicate, kind }
    }
}
