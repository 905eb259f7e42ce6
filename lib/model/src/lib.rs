mod error;
mod predicate;
mod record;
pub mod vocab;

pub use error::*;
pub use predicate::*;
pub use record::*;

// Re-export some oxrdf types.
pub use oxrdf::{
    BlankNode, BlankNodeRef, Dataset, Graph, GraphName, GraphNameRef, IriParseError, Literal,
    LiteralRef, NamedNode, NamedNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef,
    Triple, TripleRef, Variable, VariableRef,
};
pub use time::OffsetDateTime;
