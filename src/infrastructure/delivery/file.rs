//! File sink writing into an output directory.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::domain::errors::DeliveryError;
use crate::domain::ports::FileSink;

/// Upper bound on ` (n)` suffixes tried before giving up.
const MAX_DUPLICATES: u32 = 999;

/// Saves artifacts into a directory, never overwriting an existing file.
///
/// A name that is already taken gets a ` (1)`, ` (2)`, ... suffix before the
/// extension, the same way a browser download shelf does.
#[derive(Debug, Clone)]
pub struct DirectoryFileSink {
    dir: PathBuf,
}

impl DirectoryFileSink {
    /// Write into `dir`, which is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// The `n`th alternative for `filename`; `0` is the name itself.
pub fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{filename} ({n})"),
    }
}

fn io_error(path: &Path, source: io::Error) -> DeliveryError {
    DeliveryError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl FileSink for DirectoryFileSink {
    async fn save_as_file(
        &self,
        content: &str,
        filename: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DeliveryError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        for n in 0..=MAX_DUPLICATES {
            let path = self.dir.join(numbered_name(filename, n));
            let file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            let mut file = match file {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "name taken, trying next");
                    continue;
                }
                Err(e) => return Err(io_error(&path, e)),
            };

            file.write_all(content.as_bytes())
                .await
                .map_err(|e| io_error(&path, e))?;
            file.flush().await.map_err(|e| io_error(&path, e))?;

            info!(path = %path.display(), mime_type, bytes = content.len(), "artifact written");
            return Ok(path);
        }

        Err(io_error(
            &self.dir.join(filename),
            io::Error::new(io::ErrorKind::AlreadyExists, "too many files with this name"),
        ))
    }
}
