use thiserror::Error;

/// Core error type shared across schemasift crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected before a reduction starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A name pattern failed to compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// The schema graph violates internal invariants.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A foreign key points at a table the catalog never contained.
    #[error("foreign key {foreign_key} on {table} references unknown column {column}")]
    UnresolvedReference {
        foreign_key: String,
        table: String,
        column: String,
    },
    /// The catalog has already been reduced once.
    #[error("catalog has already been reduced")]
    AlreadyReduced,
}

/// Convenience alias for results returned by schemasift crates.
pub type Result<T> = std::result::Result<T, Error>;
