//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for sqlweave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// Errors raised while composing fragments and building statements.
///
/// Every error is raised at the call that detects it; nothing is retried or
/// silently corrected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeaveError {
    /// A property name that does not exist on the schema, or is not a storage column.
    #[error("Property '{property}' is not a column of {schema}")]
    UnknownProperty { schema: String, property: String },

    /// A table handle that is not part of the statement's reference list.
    #[error("Could not find reference for table '{table}'")]
    ReferenceNotFound { table: String },

    /// A shorthand condition payload with the wrong shape.
    #[error("Invalid shorthand: {0}")]
    InvalidShorthand(String),

    /// A fragment whose placeholders and parameters disagree, or a value that is not a fragment.
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// A [`JoinSpec`](crate::JoinSpec) that was never given an ON builder.
    #[error("Join to '{table}' is missing its ON clause")]
    IncompleteJoin { table: String },

    /// An UPDATE/DELETE without WHERE that was not explicitly forced.
    #[error("No WHERE clause exists for {statement} {table}, force it with `.force()`")]
    MissingGuard {
        statement: &'static str,
        table: String,
    },

    /// An UPDATE with nothing to SET.
    #[error("UPDATE {table} has no SET assignments")]
    EmptyAssignment { table: String },

    /// A table name that was never registered.
    #[error("Table '{0}' is not registered")]
    UnknownTable(String),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(String),
}

impl WeaveError {
    /// Create an unknown property error
    pub fn unknown_property(schema: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            schema: schema.into(),
            property: property.into(),
        }
    }

    /// Create a reference-not-found error
    pub fn reference_not_found(table: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            table: table.into(),
        }
    }

    /// Create an invalid shorthand error
    pub fn invalid_shorthand(message: impl Into<String>) -> Self {
        Self::InvalidShorthand(message.into())
    }

    /// Create an invalid fragment error
    pub fn invalid_fragment(message: impl Into<String>) -> Self {
        Self::InvalidFragment(message.into())
    }

    /// Create a missing guard error
    pub fn missing_guard(statement: &'static str, table: impl Into<String>) -> Self {
        Self::MissingGuard {
            statement,
            table: table.into(),
        }
    }

    /// Check if this is an unknown property error
    pub fn is_unknown_property(&self) -> bool {
        matches!(self, Self::UnknownProperty { .. })
    }

    /// Check if this is a reference-not-found error
    pub fn is_reference_not_found(&self) -> bool {
        matches!(self, Self::ReferenceNotFound { .. })
    }

    /// Check if this is an invalid shorthand error
    pub fn is_invalid_shorthand(&self) -> bool {
        matches!(self, Self::InvalidShorthand(_))
    }

    /// Check if this is an invalid fragment error
    pub fn is_invalid_fragment(&self) -> bool {
        matches!(self, Self::InvalidFragment(_))
    }

    /// Check if this is an incomplete join error
    pub fn is_incomplete_join(&self) -> bool {
        matches!(self, Self::IncompleteJoin { .. })
    }

    /// Check if this is a missing guard error
    pub fn is_missing_guard(&self) -> bool {
        matches!(self, Self::MissingGuard { .. })
    }
}

impl From<toml::de::Error> for WeaveError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
