use thiserror::Error;

use crate::data::loader::FileFormat;

/// Failure to turn an uploaded file into a dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("failed to parse {format} file: {reason:#}")]
    Parse {
        format: FileFormat,
        reason: anyhow::Error,
    },
}

/// Failure talking to one of the external services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be decoded: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    #[error("invalid {service} endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        service: &'static str,
        endpoint: String,
        reason: String,
    },

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("object storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
