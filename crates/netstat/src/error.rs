//! Error types for discovery, collection and lifecycle calls

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetstatError {
    #[error("invalid netstat config key {0}")]
    UnknownConfigKey(String),

    #[error("{0} is not a valid directory")]
    InvalidDirectoryConfig(String),

    #[error("can't open directory {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no interfaces found")]
    EmptyRoster,

    #[error("can not open stats file {path}: {source}")]
    StatFileUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading stats file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required config key {key} was never set")]
    MissingConfig { key: &'static str },

    #[error("{operation} is not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: crate::lifecycle::LifecycleState,
    },
}

pub type Result<T> = std::result::Result<T, NetstatError>;
