use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;

/// Arguments that would let a document run shell commands.
///
/// None of these may appear in an engine's `args`; the command builder adds
/// `-no-shell-escape` on its own and nothing may undo it.
pub const SHELL_ESCAPE_FLAGS: [&str; 6] = [
    "-shell-escape",
    "--shell-escape",
    "-enable-write18",
    "--enable-write18",
    "-shell-restricted",
    "--shell-restricted",
];

/// Default PATH for engine invocations
pub const DEFAULT_ENGINE_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Longest per-pass timeout accepted, in seconds (one day)
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0;

/// Configuration for an external typesetting engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Human-readable name for the engine (e.g., "pdfTeX (LaTeX)")
    pub name: String,

    /// Program to run, either a bare name looked up in `path` or a path
    pub program: String,

    /// Extra fixed arguments placed before the mandatory flags
    #[serde(default)]
    pub args: Vec<String>,

    /// Source file name in the workspace (e.g., "main.tex")
    #[serde(default = "default_source_name")]
    pub source_name: FileName,

    /// File the engine produces on success (e.g., "main.pdf")
    #[serde(default = "default_artifact_name")]
    pub artifact_name: FileName,

    /// Log file the engine writes next to the source (e.g., "main.log")
    #[serde(default = "default_log_name")]
    pub log_name: FileName,

    /// Wall-clock limit for a single pass, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// PATH given to the engine and used to resolve `program`
    #[serde(default = "default_engine_path")]
    pub path: String,

    /// Environment variables to set for the engine
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Filename suggested to whoever receives the artifact
    #[serde(default = "default_download_name")]
    pub download_name: String,

    /// MIME type of the artifact
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Engine {
    /// Create an engine description with default file names and limits
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            source_name: default_source_name(),
            artifact_name: default_artifact_name(),
            log_name: default_log_name(),
            timeout: default_timeout(),
            path: default_engine_path(),
            env: HashMap::new(),
            download_name: default_download_name(),
            content_type: default_content_type(),
        }
    }

    /// Set the extra arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-pass timeout in seconds
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the search path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Per-pass timeout as a [`Duration`]
    ///
    /// Fails unless the timeout is a finite number of seconds in
    /// `(0, MAX_TIMEOUT_SECS]`.
    pub fn pass_timeout(&self) -> Result<Duration, ConfigError> {
        check_timeout(self.timeout)?;
        Duration::try_from_secs_f64(self.timeout)
            .map_err(|e| ConfigError::Invalid(format!("timeout {}: {e}", self.timeout)))
    }

    /// Check the fields that deserialization alone does not constrain
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("empty name".to_string()));
        }
        if self.program.is_empty() {
            return Err(ConfigError::Invalid("empty program".to_string()));
        }
        check_timeout(self.timeout)?;
        if let Some(flag) = self.shell_escape_arg() {
            return Err(ConfigError::Invalid(format!(
                "shell escape enabled via '{flag}'"
            )));
        }
        Ok(())
    }

    /// Returns the first shell-escape flag found in `args`, if any
    pub fn shell_escape_arg(&self) -> Option<&str> {
        self.args
            .iter()
            .map(String::as_str)
            .find(|arg| is_shell_escape_flag(arg))
    }
}

/// Check that `seconds` is usable as a per-pass timeout
pub fn check_timeout(seconds: f64) -> Result<(), ConfigError> {
    if seconds.is_finite() && seconds > 0.0 && seconds <= MAX_TIMEOUT_SECS {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "timeout must be greater than 0 and at most {MAX_TIMEOUT_SECS} seconds, got {seconds}"
        )))
    }
}

/// Check whether a single argument would enable shell escape
pub fn is_shell_escape_flag(arg: &str) -> bool {
    let flag = arg.split_once('=').map_or(arg, |(flag, _)| flag);
    SHELL_ESCAPE_FLAGS.contains(&flag)
}

/// Bare file name inside a workspace (e.g., "main.tex")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileName(String);

impl FileName {
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(ConfigError::InvalidFileName(name.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for FileName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileName::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a non-empty file name without '/' or '..'",
            )
        })
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn default_source_name() -> FileName {
    FileName("main.tex".to_owned())
}

fn default_artifact_name() -> FileName {
    FileName("main.pdf".to_owned())
}

fn default_log_name() -> FileName {
    FileName("main.log".to_owned())
}

fn default_timeout() -> f64 {
    30.0
}

fn default_engine_path() -> String {
    DEFAULT_ENGINE_PATH.to_owned()
}

fn default_download_name() -> String {
    "output.pdf".to_owned()
}

fn default_content_type() -> String {
    "application/pdf".to_owned()
}
