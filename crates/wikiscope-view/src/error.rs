//! Errors surfaced to the owner of a graph view

use std::path::PathBuf;

use thiserror::Error;
use wikiscope_core::{EngineError, SurfaceError};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("graph view is not mounted")]
    NotMounted,

    #[error("graph view is already mounted")]
    AlreadyMounted,

    #[error("graph view has been unmounted")]
    Unmounted,

    #[error("snapshot feed is closed")]
    FeedClosed,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid view config: {0}")]
    Parse(#[from] toml::de::Error),
}
