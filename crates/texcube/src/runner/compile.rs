//! The fixed pass sequence
//!
//! Runs the engine over a staged workspace, classifies how it ended, and
//! either reads the artifact or collects diagnostics.

use tracing::{debug, instrument, warn};

use crate::config::Engine;
use crate::engine::{EngineCommand, EngineError, resolve_program, run_pass};
use crate::runner::diagnostic;
use crate::types::{Artifact, CompilationOutcome, FailureStage, PassResult, PassStatus};
use crate::workspace::Workspace;

/// Number of engine passes per compilation.
///
/// The first pass writes cross-reference data (`.aux`, `.toc`), the second
/// reads it back. There is no third pass and no convergence check.
pub const PASS_COUNT: u32 = 2;

/// Compile the source staged in `workspace`
///
/// A failing first pass does not stop the second; only the last pass's exit
/// status is judged. A pass that cannot be started or that times out ends
/// the sequence immediately.
#[instrument(
    skip(workspace, engine),
    fields(request_id = workspace.request_id(), engine = %engine.name)
)]
pub async fn compile(workspace: &Workspace, engine: &Engine) -> CompilationOutcome {
    let program = match resolve_program(&engine.program, &engine.path) {
        Ok(program) => program,
        Err(e) => {
            warn!(error = %e, "engine unavailable");
            return launch_failure(&e, 0);
        }
    };

    let limit = match engine.pass_timeout() {
        Ok(limit) => limit,
        Err(e) => {
            warn!(error = %e, "engine has an unusable timeout");
            return CompilationOutcome::Failure {
                diagnostic: e.to_string(),
                stage: FailureStage::LaunchFailed,
                passes_run: 0,
            };
        }
    };

    let artifact_name = engine.artifact_name.as_str();
    let mut last: Option<PassResult> = None;

    for pass in 1..=PASS_COUNT {
        // Only the final pass may supply the artifact
        if pass == PASS_COUNT
            && let Err(e) = workspace.remove_file(artifact_name).await
        {
            warn!(pass, error = %e, "failed to remove earlier artifact");
            return CompilationOutcome::Failure {
                diagnostic: format!("failed to remove {artifact_name} before pass {pass}: {e}"),
                stage: FailureStage::LaunchFailed,
                passes_run: pass - 1,
            };
        }

        let command = EngineCommand::for_engine(&program, engine).working_dir(workspace.root());

        let result = match run_pass(pass, command, limit).await {
            Ok(result) => result,
            Err(e) => {
                warn!(pass, error = %e, "engine could not be started");
                return launch_failure(&e, pass - 1);
            }
        };

        if result.status == PassStatus::TimedOut {
            warn!(pass, timeout = engine.timeout, "compilation timed out");
            return failure(workspace, engine, &result, FailureStage::Timeout).await;
        }

        if !result.is_success() {
            // Later passes may still resolve what this one tripped over
            debug!(
                pass,
                exit_code = ?result.exit_code,
                status = ?result.status,
                "pass reported errors, continuing"
            );
        }

        last = Some(result);
    }

    let Some(last) = last else {
        return CompilationOutcome::Failure {
            diagnostic: diagnostic::describe(None, FailureStage::LaunchFailed, ""),
            stage: FailureStage::LaunchFailed,
            passes_run: 0,
        };
    };

    if !last.is_success() {
        debug!(exit_code = ?last.exit_code, "final pass rejected the document");
        return failure(workspace, engine, &last, FailureStage::Rejected).await;
    }

    // A zero exit status does not guarantee an artifact
    match workspace.file_exists(artifact_name).await {
        Ok(true) => {}
        Ok(false) | Err(_) => {
            warn!(artifact = artifact_name, "engine succeeded but wrote no artifact");
            return failure(workspace, engine, &last, FailureStage::ArtifactMissing).await;
        }
    }

    match workspace.read_file(artifact_name).await {
        Ok(bytes) => {
            debug!(len = bytes.len(), "artifact read");
            CompilationOutcome::Success {
                artifact: Artifact {
                    bytes,
                    filename: engine.download_name.clone(),
                    content_type: engine.content_type.clone(),
                },
            }
        }
        Err(e) => {
            warn!(artifact = artifact_name, error = %e, "failed to read artifact");
            CompilationOutcome::Failure {
                diagnostic: format!("failed to read {artifact_name}: {e}"),
                stage: FailureStage::ArtifactMissing,
                passes_run: last.pass,
            }
        }
    }
}

fn launch_failure(error: &EngineError, passes_run: u32) -> CompilationOutcome {
    CompilationOutcome::Failure {
        diagnostic: error.to_string(),
        stage: FailureStage::LaunchFailed,
        passes_run,
    }
}

async fn failure(
    workspace: &Workspace,
    engine: &Engine,
    pass: &PassResult,
    stage: FailureStage,
) -> CompilationOutcome {
    let diagnostic =
        diagnostic::collect(workspace, Some(pass), stage, engine.artifact_name.as_str()).await;
    CompilationOutcome::Failure {
        diagnostic,
        stage,
        passes_run: pass.pass,
    }
}
