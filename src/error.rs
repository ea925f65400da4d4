use std::path::PathBuf;

use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub(crate) enum QueryError {
    #[error("invalid marketplace query: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("no marketplace query at position {position} (have {len})")]
    OutOfRange { position: usize, len: usize },

    #[error("could not build a search URL for host \"{host}\": {reason}")]
    Url { host: String, reason: String },
}

/// Failures of the browser side of a scrape.
///
/// headless_chrome reports everything as `anyhow::Error`, so the underlying
/// cause is kept as its rendered chain.
#[derive(Debug, Error)]
pub(crate) enum LoaderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to navigate to {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script `{script}` failed: {reason}")]
    Script { script: String, reason: String },

    #[error("script `{script}` returned {value} where a number was expected")]
    NotANumber { script: String, value: String },

    #[error("element `{selector}` could not be clicked: {reason}")]
    Element { selector: String, reason: String },

    #[error("failed to close browser: {0}")]
    Close(String),

    #[error("failed to read the rendered page: {0}")]
    PageSource(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("stored query #{position} is invalid: {source}")]
    InvalidQuery {
        position: usize,
        #[source]
        source: QueryError,
    },
}

#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
