//! External typesetting engine invocation
//!
//! This module builds the engine's fixed, non-interactive argument vector,
//! resolves the engine binary, and runs single passes under a wall-clock
//! timeout.
//!
//! References for the TeX Live command-line options:
//! - https://tug.org/texlive/doc/pdftex.html
//! - https://tug.org/texinfohtml/web2c.html#Common-options

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use crate::engine::command::{EngineCommand, INTERACTION_FLAG, NO_SHELL_ESCAPE_FLAG};
pub use crate::engine::process::run_pass;

mod command;
mod process;

/// Errors that prevent an engine invocation from happening at all
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine '{0}' not found in PATH")]
    NotFound(String),

    #[error("failed to spawn engine process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("I/O error while running engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve the engine program to an absolute path using `search_path`.
///
/// Programs that already contain a `/` (like `./pdflatex` or
/// `/usr/bin/pdflatex`) are returned unchanged and checked at spawn time.
/// Bare names (like `pdflatex`) are looked up in each directory of
/// `search_path`, a colon-separated list.
pub fn resolve_program(program: &str, search_path: &str) -> Result<PathBuf, EngineError> {
    if program.is_empty() {
        return Err(EngineError::NotFound(program.to_string()));
    }

    if program.contains('/') {
        return Ok(PathBuf::from(program));
    }

    for dir in search_path.split(':').filter(|dir| !dir.is_empty()) {
        let candidate = Path::new(dir).join(program);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(EngineError::NotFound(program.to_string()))
}
