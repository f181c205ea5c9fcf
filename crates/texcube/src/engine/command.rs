//! Command builder for the external engine
//!
//! Builds command-line arguments for one engine pass.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::{Engine, is_shell_escape_flag};

/// Keeps the engine from stopping to prompt on errors
pub const INTERACTION_FLAG: &str = "-interaction=nonstopmode";

/// Forbids `\write18` and friends from running shell commands
pub const NO_SHELL_ESCAPE_FLAG: &str = "-no-shell-escape";

/// Builder for engine command-line arguments
///
/// The interaction mode and the shell-escape flag are not configurable:
/// every built command runs in non-stop mode with shell escape disabled.
#[derive(Debug)]
pub struct EngineCommand {
    /// Path to the engine binary
    program: PathBuf,
    /// Extra arguments placed before the mandatory flags
    args: Vec<String>,
    /// Source file, relative to the working directory
    source: String,
    /// Working directory of the engine
    working_dir: Option<PathBuf>,
    /// Environment; nothing is inherited from the parent
    env: HashMap<String, String>,
}

impl EngineCommand {
    /// Create a new engine command builder
    pub fn new(program: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            source: source.into(),
            working_dir: None,
            env: HashMap::new(),
        }
    }

    /// Create a builder from an engine configuration and a resolved program
    pub fn for_engine(program: impl Into<PathBuf>, engine: &Engine) -> Self {
        let mut command = Self::new(program, engine.source_name.as_str())
            .args(engine.args.iter().cloned())
            .env("PATH", &engine.path);
        for (key, value) in &engine.env {
            command = command.env(key, value);
        }
        command
    }

    /// Add extra arguments
    ///
    /// Arguments that would enable shell escape are dropped.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(
            args.into_iter()
                .map(Into::into)
                .filter(|arg| !is_shell_escape_flag(arg)),
        );
        self
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Get the working directory
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Get the environment
    pub fn get_env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Build the command-line arguments
    ///
    /// Consumes self to avoid cloning the argument vector. The first element
    /// is the program.
    pub fn build(self) -> Vec<String> {
        let mut args = vec![self.program.to_string_lossy().into_owned()];
        args.extend(self.args);
        args.push(INTERACTION_FLAG.to_string());
        args.push(NO_SHELL_ESCAPE_FLAG.to_string());
        args.push(self.source);
        args
    }

    /// Build a ready-to-spawn process command
    pub fn into_command(self) -> tokio::process::Command {
        let working_dir = self.working_dir.clone();
        let env = self.env.clone();
        let args = self.build();

        let mut command = tokio::process::Command::new(&args[0]);
        command.args(&args[1..]).env_clear().envs(env);
        if let Some(dir) = working_dir {
            // Engine caches and font maps land in the workspace, not the service's home
            command.env("HOME", &dir).current_dir(dir);
        }
        command
    }
}
