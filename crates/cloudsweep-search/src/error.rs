//! Search index error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl From<SearchError> for cloudsweep_core::Error {
    fn from(e: SearchError) -> Self {
        cloudsweep_core::Error::Search(e.to_string())
    }
}
