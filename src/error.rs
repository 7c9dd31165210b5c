//! Error types shared by the catalog and the dialogue engine.

use thiserror::Error;

/// Failures raised by a menu catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Menu data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Item not found: '{0}'")]
    NotFound(String),

    #[error("An item named '{name}' already exists in {category}")]
    DuplicateName { name: String, category: String },

    #[error("Invalid menu item: {0}")]
    InvalidItem(String),

    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),

    /// The catalog could not be read at all (e.g. a remote source is down).
    #[error("Menu catalog unavailable: {0}")]
    Unavailable(String),
}

/// Faults inside a conversation turn that are not recoverable by re-prompting.
#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("catalog lookup failed: {0}")]
    Catalog(#[from] CatalogError),
}
