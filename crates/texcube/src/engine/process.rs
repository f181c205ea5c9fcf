//! Process spawning and I/O for engine passes
//!
//! Runs a single engine invocation, captures its output, and enforces the
//! per-pass wall-clock timeout.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::engine::EngineError;
use crate::engine::command::EngineCommand;
use crate::types::{PassResult, PassStatus};

/// How long to keep reading output after the engine has exited or been killed
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Run one engine pass
///
/// The engine gets a null stdin and piped stdout/stderr. If it is still
/// running after `limit` it is killed and the pass is reported as
/// [`PassStatus::TimedOut`]. Dropping the returned future kills the engine.
#[instrument(skip(command), fields(limit_secs = limit.as_secs_f64()))]
pub async fn run_pass(
    pass: u32,
    command: EngineCommand,
    limit: Duration,
) -> Result<PassResult, EngineError> {
    let mut process = command.into_command();
    process
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(?process, "spawning engine");

    let started_at = Instant::now();
    let mut child = process.spawn().map_err(EngineError::SpawnFailed)?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let (status, exit_code, signal) = match tokio::time::timeout(limit, child.wait()).await {
        Ok(exit) => classify_exit(exit?),
        Err(_) => {
            warn!(pass, "engine pass exceeded timeout, killing");
            if let Err(e) = child.kill().await {
                warn!(pass, error = %e, "failed to kill engine");
            }
            (PassStatus::TimedOut, None, None)
        }
    };
    let wall_time = started_at.elapsed().as_secs_f64();

    let stdout = collect_stream(stdout_task).await;
    let stderr = collect_stream(stderr_task).await;

    debug!(
        pass,
        ?status,
        exit_code,
        signal,
        wall_time,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "engine pass complete"
    );

    Ok(PassResult {
        pass,
        status,
        exit_code,
        signal,
        wall_time,
        stdout,
        stderr,
    })
}

fn classify_exit(exit: ExitStatus) -> (PassStatus, Option<i32>, Option<i32>) {
    let code = exit.code();
    let signal = exit_signal(&exit);
    let status = if exit.success() {
        PassStatus::Ok
    } else if code.is_some() {
        PassStatus::Failed
    } else {
        PassStatus::Signaled
    };
    (status, code, signal)
}

#[cfg(unix)]
fn exit_signal(exit: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    exit.signal()
}

#[cfg(not(unix))]
fn exit_signal(_exit: &ExitStatus) -> Option<i32> {
    None
}

async fn read_stream<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream
        && let Err(e) = stream.read_to_end(&mut buf).await
    {
        debug!(error = %e, "engine output stream ended with error");
    }
    buf
}

async fn collect_stream(mut handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut handle).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            warn!(error = %e, "engine output reader failed");
            Vec::new()
        }
        Err(_) => {
            // A grandchild still holds the pipe open
            handle.abort();
            warn!("engine output still open after exit, discarding");
            Vec::new()
        }
    }
}
