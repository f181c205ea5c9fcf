use serde::{Deserialize, Serialize};

/// Magic bytes every PDF file starts with
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Result of a single engine invocation
#[derive(Debug, Clone)]
pub struct PassResult {
    /// Pass number, starting at 1
    pub pass: u32,

    /// How the invocation ended
    pub status: PassStatus,

    /// Exit code if the engine exited normally
    pub exit_code: Option<i32>,

    /// Signal number if the engine was killed by a signal
    pub signal: Option<i32>,

    /// Wall clock time used in seconds
    pub wall_time: f64,

    /// Captured standard output
    pub stdout: Vec<u8>,

    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl PassResult {
    /// Check if the pass was successful (exited with code 0)
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, PassStatus::Ok) && self.exit_code == Some(0)
    }

    /// Captured stdout followed by stderr, decoded lossily
    pub fn combined_output(&self) -> String {
        let mut output = String::from_utf8_lossy(&self.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&self.stderr);
        if !output.is_empty() && !stderr.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&stderr);
        output
    }
}

impl Default for PassResult {
    fn default() -> Self {
        Self {
            pass: 1,
            status: PassStatus::Ok,
            exit_code: None,
            signal: None,
            wall_time: 0.0,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }
}

/// How a single engine invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassStatus {
    /// Engine exited with status zero
    #[serde(rename = "ok")]
    Ok,

    /// Engine exited with a non-zero status
    #[serde(rename = "failed")]
    Failed,

    /// Engine was killed by a signal it did not receive from us
    #[serde(rename = "signaled")]
    Signaled,

    /// Engine exceeded the pass timeout and was killed
    #[serde(rename = "timed_out")]
    TimedOut,
}

/// Stage at which a compilation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStage {
    /// The engine process could not be started
    #[serde(rename = "invocation could not start")]
    LaunchFailed,

    /// The engine ran and rejected the document
    #[serde(rename = "compilation rejected")]
    Rejected,

    /// The engine reported success but produced no artifact
    #[serde(rename = "artifact missing")]
    ArtifactMissing,

    /// A pass exceeded its time budget
    #[serde(rename = "timeout")]
    Timeout,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::LaunchFailed => "invocation could not start",
            FailureStage::Rejected => "compilation rejected",
            FailureStage::ArtifactMissing => "artifact missing",
            FailureStage::Timeout => "timeout",
        }
    }

    /// Who is responsible for a failure at this stage
    pub fn error_class(&self) -> ErrorClass {
        match self {
            FailureStage::LaunchFailed | FailureStage::Timeout => ErrorClass::Infrastructure,
            FailureStage::Rejected | FailureStage::ArtifactMissing => ErrorClass::Compilation,
        }
    }
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse failure classification handed to the response layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Empty or undecodable input, unknown engine
    Caller,
    /// The engine rejected the document
    Compilation,
    /// Engine unavailable, timed out, or the workspace could not be staged
    Infrastructure,
}

/// A successfully produced document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Full binary contents of the produced file
    pub bytes: Vec<u8>,

    /// Suggested download file name
    pub filename: String,

    /// MIME type of `bytes`
    pub content_type: String,
}

impl Artifact {
    /// Check whether the bytes start with the PDF header
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
    }
}

/// Outcome of running the pass sequence over one workspace
#[derive(Debug, Clone)]
pub enum CompilationOutcome {
    Success {
        artifact: Artifact,
    },
    Failure {
        /// Engine log or captured output, verbatim
        diagnostic: String,
        stage: FailureStage,
        /// Number of passes that were started
        passes_run: u32,
    },
}

impl CompilationOutcome {
    /// Check if the outcome carries an artifact
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationOutcome::Success { .. })
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            CompilationOutcome::Success { artifact } => Some(artifact),
            CompilationOutcome::Failure { .. } => None,
        }
    }

    pub fn stage(&self) -> Option<FailureStage> {
        match self {
            CompilationOutcome::Success { .. } => None,
            CompilationOutcome::Failure { stage, .. } => Some(*stage),
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            CompilationOutcome::Success { .. } => None,
            CompilationOutcome::Failure { diagnostic, .. } => Some(diagnostic),
        }
    }

    /// Structured failure report, `None` on success
    pub fn report(&self) -> Option<DiagnosticReport> {
        match self {
            CompilationOutcome::Success { .. } => None,
            CompilationOutcome::Failure {
                diagnostic, stage, ..
            } => Some(DiagnosticReport {
                error: failure_headline(*stage).to_string(),
                log: diagnostic.clone(),
                stage: Some(*stage),
                class: stage.error_class(),
            }),
        }
    }
}

fn failure_headline(stage: FailureStage) -> &'static str {
    match stage {
        FailureStage::LaunchFailed => "engine could not be started",
        FailureStage::Rejected => "document failed to compile",
        FailureStage::ArtifactMissing => "engine produced no output document",
        FailureStage::Timeout => "compilation timed out",
    }
}

/// Structured diagnostic object of the output contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Short description of what went wrong
    pub error: String,

    /// Engine log or captured output
    pub log: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,

    /// Failure indicator for the response layer
    pub class: ErrorClass,
}

impl DiagnosticReport {
    /// Render the report as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("string and enum fields always serialize")
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn combined_output_contains_both_streams(
            stdout in "[a-z ]{0,40}",
            stderr in "[a-z ]{0,40}",
        ) {
            let result = PassResult {
                stdout: stdout.clone().into_bytes(),
                stderr: stderr.clone().into_bytes(),
                ..Default::default()
            };
            let combined = result.combined_output();
            prop_assert!(combined.starts_with(&stdout));
            prop_assert!(combined.ends_with(&stderr));
        }

        #[test]
        fn is_pdf_matches_prefix(tail in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut bytes = PDF_MAGIC.to_vec();
            bytes.extend_from_slice(&tail);
            let artifact = Artifact {
                bytes,
                filename: "output.pdf".to_string(),
                content_type: "application/pdf".to_string(),
            };
            prop_assert!(artifact.is_pdf());
        }
    }
}
