use thiserror::Error;

/// Raised when a textual name does not denote any variant of a registry enumeration.
///
/// Registry enumerations (endpoint types, statuses) are persisted as strings and supplied on the
/// command line, so parsing them is fallible.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("'{value}' is not a valid {kind}")]
pub struct UnknownVariantError {
    kind: &'static str,
    value: String,
}

impl UnknownVariantError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The name of the enumeration that failed to parse.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected input.
    pub fn value(&self) -> &str {
        &self.value
    }
}
