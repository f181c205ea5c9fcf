//! Scratch workspaces for compilation requests
//!
//! Every request is staged into its own uniquely named directory under the
//! scratch root. The directory and everything the engine writes into it is
//! removed when the [`Workspace`] is released or dropped.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::workspace::manager::{Workspace, WorkspaceManager};

mod manager;

/// Prefix of every workspace directory name
pub const WORKSPACE_PREFIX: &str = "texcube-";

/// Errors that occur while staging a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace under {root}: {source}")]
    CreateFailed {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workspace manager is shut down")]
    Closed,

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
