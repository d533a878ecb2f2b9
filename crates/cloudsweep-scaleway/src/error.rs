//! Scaleway provider error types

use cloudsweep_core::{Classify, ErrorClass, classify_status};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalewayError {
    /// Non-2xx answer from the API.
    #[error("Scaleway API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Scaleway config not found at {0}")]
    ConfigNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Cockpit is not activated for project {0}")]
    CockpitNotActivated(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] cloudsweep_core::Error),
}

impl ScalewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ScalewayError::Api { status, .. } => Some(*status),
            ScalewayError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl Classify for ScalewayError {
    fn classify(&self) -> ErrorClass {
        match self.status() {
            Some(status) => classify_status(status),
            None => ErrorClass::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScalewayError>;

impl From<ScalewayError> for cloudsweep_core::Error {
    fn from(e: ScalewayError) -> Self {
        match e {
            ScalewayError::Core(inner) => inner,
            other => cloudsweep_core::Error::Provider(other.to_string()),
        }
    }
}
