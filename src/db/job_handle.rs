use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::TaskResult;

/// Durable handle of the most recent training submission
///
/// A single-line text file holding the opaque job identifier. At most one
/// active handle exists: saving overwrites the previous one, and a failed
/// submission never reaches [`JobHandleStore::save`], so the prior handle
/// survives.
pub struct JobHandleStore {
    path: PathBuf,
}

impl JobHandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted job id. A missing file is the expected "nothing
    /// submitted yet" steady state; an unparsable file is logged and treated
    /// the same way.
    pub async fn load(&self) -> TaskResult<Option<Uuid>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let line = contents.lines().next().unwrap_or("").trim();
        match line.parse::<Uuid>() {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unparsable training job handle"
                );
                Ok(None)
            }
        }
    }

    /// Persists a new job id, replacing any previous handle.
    pub async fn save(&self, id: Uuid) -> TaskResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, format!("{}\n", id)).await?;
        Ok(())
    }
}
