//! Error types for presign and upload operations

use std::path::PathBuf;

use flexi_logger::FlexiLoggerError;
use s3::error::S3Error;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for presign and upload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is terminal for the current invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// A flag required by the selected operation is absent or empty
    #[error("missing required argument: --{0}")]
    MissingArgument(&'static str),

    /// Unknown region without a custom endpoint
    #[error("invalid region: {0}")]
    Region(String),

    /// Ambient credential resolution failed
    #[error("credential resolution failed: {0}")]
    Credentials(#[source] BoxError),

    /// Building or signing the presigned request failed
    #[error("presign failed: {0}")]
    Signing(#[from] S3Error),

    /// Opening or stat'ing the local file failed
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Sending the PUT request failed (dns, connect, tls, ...)
    #[error("put request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("reading response body failed: {0}")]
    ResponseRead(#[source] reqwest::Error),

    #[error("writing output failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("encoding output failed: {0}")]
    Output(#[from] serde_json::Error),

    #[error("logger init failed: {0}")]
    Logger(#[from] FlexiLoggerError),
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
