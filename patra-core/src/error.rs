//! Error types for the patra-core crate.

use thiserror::Error;

/// Top-level error type for model card operations.
///
/// Document-level problems (a card that fails the schema, a registry that
/// refuses a submission) are not errors: they are reported and surface as
/// `Ok(false)` / `Ok(None)`. What lands here is environmental.
#[derive(Debug, Error)]
pub enum CardError {
    /// The bundled (or supplied) schema could not be parsed or compiled.
    #[error("Schema configuration error: {0}")]
    SchemaConfiguration(String),

    #[error("Analyzer error: {0}")]
    Analyzer(String),

    #[error("Python runtime error: {0}")]
    Python(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CardError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaConfiguration(msg.into())
    }

    pub fn analyzer(msg: impl Into<String>) -> Self {
        Self::Analyzer(msg.into())
    }

    pub fn python(msg: impl Into<String>) -> Self {
        Self::Python(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for the one error class that means the installation is broken
    /// rather than the input.
    pub fn is_schema_configuration(&self) -> bool {
        matches!(self, Self::SchemaConfiguration(_))
    }
}

impl From<figment::Error> for CardError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}
