//! A library for compiling TeX documents in disposable workspaces.
//!
//! Texcube provides an async Rust API that takes document source text,
//! runs an external TeX engine over it, and returns either the produced PDF
//! or the engine's diagnostics. No state outlives a request.
//!
//! # Features
//!
//! - **Disposable workspaces** — Every request gets its own uniquely named scratch directory, removed on every exit path.
//! - **Fixed two-pass compilation** — Cross-references, tables of contents, and citations resolve on the second pass.
//! - **Failure classification** — Launch failures, rejected documents, missing artifacts, and timeouts are told apart.
//! - **Shell escape always off** — The engine can never run shell commands from inside a document.
//! - **Bounded concurrency** — A semaphore caps simultaneous compilations; timeouts and cancellation kill the engine.
//! - **TOML configuration** — Per-engine program, arguments, file names, and time limits.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Engine};
pub use engine::{EngineError, resolve_program};
pub use runner::{CompileError, PASS_COUNT, Runner, validate_source};
pub use types::{
    Artifact, CompilationOutcome, DiagnosticReport, ErrorClass, FailureStage, PassResult,
    PassStatus,
};
pub use workspace::{Workspace, WorkspaceError, WorkspaceManager};

pub mod config;
pub mod engine;
pub mod runner;
pub mod types;
pub mod workspace;
