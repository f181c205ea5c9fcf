//! Diagnostic extraction for failed compilations
//!
//! Picks the most informative text available: the engine's own log file,
//! then whatever the engine printed, then a one-line description.

use tracing::debug;

use crate::types::{FailureStage, PassResult, PassStatus};
use crate::workspace::Workspace;

/// Collect the diagnostic text for a failure at `stage`
pub(crate) async fn collect(
    workspace: &Workspace,
    pass: Option<&PassResult>,
    stage: FailureStage,
    artifact_name: &str,
) -> String {
    let log = match tokio::fs::read(workspace.log_path()).await {
        Ok(log) => Some(log),
        Err(e) => {
            debug!(error = %e, "no engine log available");
            None
        }
    };
    let fallback = describe(pass, stage, artifact_name);
    select(log.as_deref(), pass, &fallback)
}

/// Choose between the log file, captured output, and a fallback description
///
/// The chosen text is returned as-is, without trimming or reformatting.
pub(crate) fn select(log: Option<&[u8]>, pass: Option<&PassResult>, fallback: &str) -> String {
    if let Some(log) = log
        && !log.is_empty()
    {
        return String::from_utf8_lossy(log).into_owned();
    }

    if let Some(pass) = pass {
        let output = pass.combined_output();
        if !output.is_empty() {
            return output;
        }
    }

    fallback.to_string()
}

/// Describe a failure when the engine left nothing to read
pub(crate) fn describe(pass: Option<&PassResult>, stage: FailureStage, artifact_name: &str) -> String {
    let Some(pass) = pass else {
        return format!("{stage}: no engine output");
    };

    match (stage, pass.status) {
        (FailureStage::ArtifactMissing, _) => format!(
            "engine exited successfully on pass {} but did not write {artifact_name}",
            pass.pass
        ),
        (_, PassStatus::TimedOut) => format!(
            "engine killed after {:.1}s on pass {} without producing output",
            pass.wall_time, pass.pass
        ),
        (_, PassStatus::Signaled) => format!(
            "engine terminated by signal {} on pass {}",
            pass.signal.unwrap_or_default(),
            pass.pass
        ),
        _ => format!(
            "engine exited with status {} on pass {} without producing output",
            pass.exit_code.unwrap_or_default(),
            pass.pass
        ),
    }
}
