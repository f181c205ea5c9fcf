//! Workspace lifecycle management
//!
//! Manages the creation, population, and removal of per-request scratch
//! directories, and bounds how many may exist at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tempfile::TempDir;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, instrument, warn};

use crate::config::Engine;
use crate::workspace::{WORKSPACE_PREFIX, WorkspaceError};

/// A scratch directory owned by exactly one compilation request
///
/// # Cleanup
///
/// Call [`release()`](Self::release) once the request has been answered.
/// If the workspace is dropped first (early return, panic, or the owning
/// task being cancelled), `Drop` removes the directory synchronously instead.
/// Removal failures are logged and never surface as request errors.
#[derive(Debug)]
pub struct Workspace {
    /// ID of the request this workspace belongs to
    request_id: u64,

    /// Owned directory; `None` once released
    dir: Option<TempDir>,

    /// Path to the workspace directory
    root: PathBuf,

    source_name: String,
    artifact_name: String,
    log_name: String,

    /// Manager permit (if acquired through a manager)
    _permit: Option<OwnedSemaphorePermit>,
}

impl Workspace {
    /// Create an empty workspace directory under `scratch_root`
    pub fn create(
        scratch_root: &Path,
        request_id: u64,
        engine: &Engine,
    ) -> Result<Self, WorkspaceError> {
        let prefix = format!("{WORKSPACE_PREFIX}{request_id}-");
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(scratch_root)
            .map_err(|source| WorkspaceError::CreateFailed {
                root: scratch_root.to_path_buf(),
                source,
            })?;
        let root = dir.path().to_path_buf();

        debug!(request_id, root = %root.display(), "workspace created");

        Ok(Self {
            request_id,
            dir: Some(dir),
            root,
            source_name: engine.source_name.to_string(),
            artifact_name: engine.artifact_name.to_string(),
            log_name: engine.log_name.to_string(),
            _permit: None,
        })
    }

    /// Get the request ID
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Get the path to the workspace directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name of the staged source
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Path of the staged source
    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_name)
    }

    /// Path the engine writes the artifact to
    pub fn artifact_path(&self) -> PathBuf {
        self.root.join(&self.artifact_name)
    }

    /// Path the engine writes its log to
    pub fn log_path(&self) -> PathBuf {
        self.root.join(&self.log_name)
    }

    /// Get the path to a file inside the workspace
    ///
    /// Returns an error if the path contains path traversal attempts.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if name.contains("..") || name.starts_with('/') {
            return Err(WorkspaceError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.root.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<(), WorkspaceError> {
        let path = self.file_path(name)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| WorkspaceError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(())
    }

    /// Read a file from the workspace
    #[instrument(skip(self))]
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, WorkspaceError> {
        let path = self.file_path(name)?;
        let content = tokio::fs::read(&path).await?;
        debug!(?path, len = content.len(), "read file from workspace");
        Ok(content)
    }

    /// Check if a regular file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, WorkspaceError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false))
    }

    /// Remove a file from the workspace; a missing file is not an error
    pub async fn remove_file(&self, name: &str) -> Result<(), WorkspaceError> {
        let path = self.file_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(?path, "removed file from workspace");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the workspace directory and everything in it
    ///
    /// A failed removal is logged; the directory name is unique so a leftover
    /// never collides with a later request.
    #[instrument(skip(self), fields(request_id = self.request_id))]
    pub async fn release(mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let root = self.root.clone();

        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!("workspace released"),
            Ok(Err(e)) => {
                warn!(root = %root.display(), error = %e, "failed to remove workspace")
            }
            Err(e) => {
                warn!(root = %root.display(), error = %e, "workspace removal task failed")
            }
        }
    }

    /// Check if the workspace directory is still owned (not yet released)
    pub fn is_live(&self) -> bool {
        self.dir.is_some()
    }

    /// Attach a manager permit to this workspace
    pub(crate) fn with_permit(mut self, permit: OwnedSemaphorePermit) -> Self {
        self._permit = Some(permit);
        self
    }
}

/// Fallback cleanup when [`Workspace::release`] was never reached.
///
/// Removal runs synchronously on the dropping thread, which may be a runtime
/// worker. The directory is gone by the time `drop` returns, so a cancelled or
/// panicked request leaves nothing behind once its task has finished.
impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            debug!(
                request_id = self.request_id,
                root = %self.root.display(),
                "workspace dropped before release, removing"
            );
            if let Err(e) = dir.close() {
                warn!(
                    request_id = self.request_id,
                    root = %self.root.display(),
                    error = %e,
                    "failed to remove workspace on drop"
                );
            }
        }
    }
}

/// Hands out workspaces under a scratch root, at most `capacity` at a time
#[derive(Debug)]
pub struct WorkspaceManager {
    /// Directory workspaces are created in
    scratch_root: PathBuf,

    /// Maximum number of live workspaces
    capacity: usize,

    /// Semaphore to limit concurrent workspaces
    semaphore: Arc<Semaphore>,

    /// Next request ID to hand out
    next_id: AtomicU64,
}

impl WorkspaceManager {
    /// Create a new workspace manager
    ///
    /// A `capacity` of zero is raised to one.
    pub fn new(scratch_root: impl Into<PathBuf>, capacity: usize) -> Self {
        if capacity == 0 {
            warn!("workspace capacity of 0 raised to 1");
        }
        let capacity = capacity.max(1);
        Self {
            scratch_root: scratch_root.into(),
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a request ID, unique for the lifetime of this manager
    pub fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Acquire a workspace and stage `source` into it
    ///
    /// Waits while `capacity` workspaces are live.
    #[instrument(skip(self, source, engine), fields(len = source.len()))]
    pub async fn acquire(
        &self,
        request_id: u64,
        source: &str,
        engine: &Engine,
    ) -> Result<Workspace, WorkspaceError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| WorkspaceError::Closed)?;

        tokio::fs::create_dir_all(&self.scratch_root)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                root: self.scratch_root.clone(),
                source,
            })?;

        let workspace =
            Workspace::create(&self.scratch_root, request_id, engine)?.with_permit(permit);

        // A failed write drops the workspace, which removes the directory
        workspace
            .write_file(engine.source_name.as_str(), source.as_bytes())
            .await?;

        debug!(request_id, "workspace staged");
        Ok(workspace)
    }

    /// Get the number of workspaces that can still be acquired without waiting
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the maximum number of live workspaces
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the scratch root
    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }
}
