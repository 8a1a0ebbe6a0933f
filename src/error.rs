//! Error types for deck loading and sequencing.

use thiserror::Error;

/// Errors surfaced by the loader, the registry and the sequencer.
///
/// Out-of-range navigation is never an error; it is reported as a no-op
/// by the operation that rejected it.
#[derive(Error, Debug)]
pub enum DeckError {
    /// Manifest or config JSON could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest parsed but contains no pages
    #[error("manifest has no pages")]
    EmptyManifest,

    /// Manifest could not be fetched from its source
    #[error("manifest fetch failed: {0}")]
    Fetch(String),

    /// A page group, element or trigger id is missing from the document
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The rendered-document host rejected an operation
    #[error("host error: {0}")]
    Host(String),

    /// Configuration file could not be parsed
    #[cfg(feature = "toml")]
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeckError>;
