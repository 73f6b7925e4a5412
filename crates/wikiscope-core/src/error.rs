//! Error taxonomy for the reconciliation engine

use crate::model::EntityId;
use std::fmt;
use thiserror::Error;

/// Where a repeated identity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The old side of a diff.
    Old,
    /// The new snapshot passed to the differ.
    New,
    /// An entity already present in the live collection.
    Collection,
    /// A repeat inside a single batch handed to `add`.
    Batch,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Old => f.write_str("old snapshot"),
            Origin::New => f.write_str("new snapshot"),
            Origin::Collection => f.write_str("collection"),
            Origin::Batch => f.write_str("batch"),
        }
    }
}

/// Errors raised by collection mutation, diffing, and reconciliation.
///
/// Every variant is raised before any mutation happens, so a failed cycle
/// leaves the collections exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("duplicate identity `{id}` in {origin}")]
    DuplicateIdentity { id: EntityId, origin: Origin },

    #[error("unknown identity `{id}`")]
    UnknownIdentity { id: EntityId },
}

/// Errors a rendering surface may report when registering a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface rejected handler for event `{event}`: {reason}")]
    HandlerRejected { event: String, reason: String },

    #[error("surface has been destroyed")]
    Destroyed,
}

/// Errors raised while turning raw query results into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("malformed query results: {0}")]
    Malformed(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
