//! Core error types

use thiserror::Error;

/// Errors surfaced by the discovery pipeline, the indexer and the collaborator traits.
#[derive(Error, Debug)]
pub enum Error {
    /// Distinct sentinel for get/delete on an id the store does not know.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Search index error: {0}")]
    Search(String),

    /// The store write succeeded but the search write did not. The resource stays
    /// store-durable and becomes searchable again on the next index of the same id.
    #[error("Resource {id} is stored but not searchable: {reason}")]
    StoreInconsistency { id: String, reason: String },

    #[error("Locality of resource {id} cannot change from {from} to {to}")]
    LocalityChanged {
        id: String,
        from: String,
        to: String,
    },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Output stream closed")]
    StreamClosed,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ResourceNotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
