//! Compilation runner for Texcube
//!
//! Provides the high-level pipeline: validate the request, stage it into a
//! workspace, run the engine passes, and tear the workspace down again.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

pub use crate::runner::compile::{PASS_COUNT, compile};

mod compile;
mod diagnostic;

use crate::config::{Config, ConfigError, Engine};
use crate::types::{CompilationOutcome, DiagnosticReport, ErrorClass};
use crate::workspace::{Workspace, WorkspaceError, WorkspaceManager};

/// Errors that stop a request before any engine pass runs
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no source text supplied")]
    EmptyInput,

    #[error("source text is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    #[error("engine '{0}' is not configured")]
    UnknownEngine(String),

    #[error("unusable engine settings: {0}")]
    InvalidEngine(#[source] ConfigError),

    #[error("failed to stage workspace: {0}")]
    Staging(#[from] WorkspaceError),
}

impl CompileError {
    /// Who is responsible for this error
    pub fn error_class(&self) -> ErrorClass {
        match self {
            CompileError::EmptyInput
            | CompileError::InvalidEncoding(_)
            | CompileError::UnknownEngine(_)
            | CompileError::InvalidEngine(_) => ErrorClass::Caller,
            CompileError::Staging(_) => ErrorClass::Infrastructure,
        }
    }

    /// Structured report for the response layer
    pub fn report(&self) -> DiagnosticReport {
        DiagnosticReport {
            error: self.to_string(),
            log: String::new(),
            stage: None,
            class: self.error_class(),
        }
    }
}

/// Validate raw request bytes as source text
///
/// Rejects empty and whitespace-only input and anything that is not UTF-8.
pub fn validate_source(source: &[u8]) -> Result<&str, CompileError> {
    let text = std::str::from_utf8(source)?;
    if text.trim().is_empty() {
        return Err(CompileError::EmptyInput);
    }
    Ok(text)
}

/// High-level runner for compilation requests
///
/// Cloning is cheap; clones share the same workspace manager and therefore
/// the same concurrency limit.
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
    workspaces: Arc<WorkspaceManager>,
}

impl Runner {
    /// Create a new runner with the given configuration
    ///
    /// The configuration is used as given; call [`Config::validate`] first if
    /// it was assembled in code.
    pub fn new(config: Config) -> Self {
        let workspaces = Arc::new(WorkspaceManager::new(
            config.scratch_dir(),
            config.max_concurrent,
        ));
        Self { config, workspaces }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the workspace manager
    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Run the pass sequence over an already staged workspace
    pub async fn compile(&self, workspace: &Workspace, engine: &Engine) -> CompilationOutcome {
        compile::compile(workspace, engine).await
    }

    /// Compile source text with a configured engine (default engine if `None`)
    pub async fn compile_source(
        &self,
        source: &[u8],
        engine_id: Option<&str>,
    ) -> Result<CompilationOutcome, CompileError> {
        let id = engine_id.unwrap_or(self.config.default_engine.as_str());
        let engine = self
            .config
            .get_engine(id)
            .map_err(|_| CompileError::UnknownEngine(id.to_string()))?;
        self.compile_source_with(source, engine).await
    }

    /// Compile source text with an explicit engine description
    ///
    /// The workspace is released before returning. If this future is dropped
    /// early, the running engine is killed and the workspace removed.
    #[instrument(skip(self, source, engine), fields(engine = %engine.name, len = source.len()))]
    pub async fn compile_source_with(
        &self,
        source: &[u8],
        engine: &Engine,
    ) -> Result<CompilationOutcome, CompileError> {
        let text = validate_source(source)?;
        engine.validate().map_err(CompileError::InvalidEngine)?;

        let request_id = self.workspaces.next_request_id();
        let workspace = self.workspaces.acquire(request_id, text, engine).await?;

        let outcome = compile::compile(&workspace, engine).await;
        workspace.release().await;

        match &outcome {
            CompilationOutcome::Success { artifact } => {
                info!(request_id, len = artifact.bytes.len(), "compilation succeeded")
            }
            CompilationOutcome::Failure {
                stage, passes_run, ..
            } => info!(request_id, %stage, passes_run, "compilation failed"),
        }
        debug!(request_id, "request complete");

        Ok(outcome)
    }
}
