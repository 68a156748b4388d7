//! Reading and overwriting the files a conversation works on.
//!
//! Paths given by the user are resolved against a working directory
//! (absolute paths are used as-is). Writes replace the whole file with the
//! body plus one trailing newline, encoded as UTF-8.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::FileIoError;

/// File access rooted at a working directory.
#[derive(Debug, Clone)]
pub struct FilePersister {
    workdir: PathBuf,
}

impl Default for FilePersister {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FilePersister {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Resolve a user-supplied file name.
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        self.workdir.join(file_name)
    }

    /// Whether `file_name` resolves to an existing directory.
    pub async fn is_directory(&self, file_name: &str) -> bool {
        fs::metadata(self.resolve(file_name))
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    /// Read the full current contents of `file_name`.
    pub async fn read(&self, file_name: &str) -> Result<String, FileIoError> {
        let path = self.resolve(file_name);
        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| FileIoError::read(file_name, e))?;
        debug!(path = %path.display(), bytes = contents.len(), "Loaded file");
        Ok(contents)
    }

    /// Overwrite `file_name` with `body` followed by a newline, creating
    /// missing parent directories.
    pub async fn write(&self, file_name: &str, body: &str) -> Result<PathBuf, FileIoError> {
        let path = self.resolve(file_name);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FileIoError::write(file_name, e))?;
        }
        fs::write(&path, format!("{body}\n"))
            .await
            .map_err(|e| FileIoError::write(file_name, e))?;
        info!(path = %path.display(), bytes = body.len() + 1, "Saved file");
        Ok(path)
    }
}
